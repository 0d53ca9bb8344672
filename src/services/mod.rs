/// Scheduled community broadcasts
pub mod broadcast;
/// HTTP health endpoints
pub mod health;
