//! Long-poll update feed.
//!
//! One sequential consumer: updates are fetched in batches and handed
//! to the engine one at a time. The offset advances past every update
//! id seen, before its handler runs, so a single update is never
//! redelivered after a handler failure; a crash between fetch and
//! advance redelivers the batch instead. Both are accepted, since
//! handlers are side-effect-tolerant.

use anyhow::Result;
use std::time::Duration;
use teloxide::payloads::GetUpdatesSetters;
use teloxide::prelude::*;
use teloxide::types::{AllowedUpdate, Update};
use tracing::{error, info, warn};

use super::engine::Engine;
use crate::notify::Notifier;
use crate::storage::RowStore;

const RETRY_DELAY: Duration = Duration::from_secs(3);

pub struct PollingLoop<S: RowStore, N: Notifier> {
    bot: Bot,
    engine: Engine<S, N>,
    poll_timeout: u32,
    offset: Option<i32>,
}

impl<S: RowStore, N: Notifier> PollingLoop<S, N> {
    pub fn new(bot: Bot, engine: Engine<S, N>, poll_timeout_secs: u32) -> Self {
        Self {
            bot,
            engine,
            poll_timeout: poll_timeout_secs,
            offset: None,
        }
    }

    /// Best-effort self-identity lookup. On failure the engine keeps
    /// the configured username fallback.
    pub async fn resolve_identity(&mut self) {
        match self.bot.get_me().await {
            Ok(me) => {
                let username = me.user.username.clone().unwrap_or_default();
                info!(
                    "bot identity resolved: id={} username={username}",
                    me.user.id.0
                );
                self.engine.set_identity(me.user.id.0, username);
            }
            Err(e) => {
                warn!("getMe failed, using configured bot username: {e}");
            }
        }
    }

    /// Runs until the process terminates. Transient failures (network,
    /// malformed responses) are logged and retried after a short
    /// delay; the loop itself never exits on error.
    pub async fn run(mut self) {
        info!("update polling started (timeout {}s)", self.poll_timeout);
        loop {
            match self.fetch_updates().await {
                Ok(updates) => {
                    for update in updates {
                        self.offset = Some(update.id + 1);
                        self.engine.handle_update(update.into()).await;
                    }
                }
                Err(e) => {
                    error!("polling cycle failed: {e:#}");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    async fn fetch_updates(&self) -> Result<Vec<Update>> {
        let mut request = self
            .bot
            .get_updates()
            .timeout(self.poll_timeout)
            .allowed_updates(vec![
                AllowedUpdate::Message,
                AllowedUpdate::CallbackQuery,
                AllowedUpdate::MyChatMember,
            ]);
        if let Some(offset) = self.offset {
            request = request.offset(offset);
        }
        Ok(request.await?)
    }
}
