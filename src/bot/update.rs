//! Inbound events as a tagged union.
//!
//! The transport delivers richly-typed updates; the engine only needs
//! a handful of fields per shape, so each update is flattened into one
//! of these variants before dispatch. Tests construct them directly.

use teloxide::types::{Chat, ChatMemberKind, Message, Update, UpdateKind, User};

#[derive(Debug, Clone)]
pub struct InboundUpdate {
    pub id: i32,
    pub kind: InboundKind,
}

#[derive(Debug, Clone)]
pub enum InboundKind {
    Message(InboundMessage),
    Callback(InboundCallback),
    Membership(MembershipChange),
    /// Update shapes the engine does not handle.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatScope {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatScope {
    pub fn is_group_like(self) -> bool {
        matches!(self, ChatScope::Group | ChatScope::Supergroup)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChatScope::Private => "private",
            ChatScope::Group => "group",
            ChatScope::Supergroup => "supergroup",
            ChatScope::Channel => "channel",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sender {
    pub id: u64,
    pub username: String,
    pub first_name: String,
    pub is_bot: bool,
}

#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat_id: i64,
    pub scope: ChatScope,
    pub chat_title: String,
    pub message_id: i32,
    pub from: Option<Sender>,
    pub text: String,
    /// Sender of the message this one replies to, when any.
    pub reply_to_sender: Option<Sender>,
}

#[derive(Debug, Clone)]
pub struct InboundCallback {
    pub id: String,
    pub from: Sender,
    pub data: Option<String>,
    /// The message the pressed button was attached to.
    pub message: Option<InboundMessage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Owner,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
}

impl MemberStatus {
    /// Transitions the engine auto-registers on.
    pub fn grants_membership(self) -> bool {
        matches!(self, MemberStatus::Member | MemberStatus::Administrator)
    }
}

#[derive(Debug, Clone)]
pub struct MembershipChange {
    pub chat_id: i64,
    pub scope: ChatScope,
    pub chat_title: String,
    pub new_status: MemberStatus,
}

fn scope_of(chat: &Chat) -> ChatScope {
    if chat.is_private() {
        ChatScope::Private
    } else if chat.is_group() {
        ChatScope::Group
    } else if chat.is_supergroup() {
        ChatScope::Supergroup
    } else {
        ChatScope::Channel
    }
}

fn convert_user(user: &User) -> Sender {
    Sender {
        id: user.id.0,
        username: user.username.clone().unwrap_or_default(),
        first_name: user.first_name.clone(),
        is_bot: user.is_bot,
    }
}

fn convert_message(message: &Message) -> InboundMessage {
    InboundMessage {
        chat_id: message.chat.id.0,
        scope: scope_of(&message.chat),
        chat_title: message.chat.title().unwrap_or_default().to_string(),
        message_id: message.id.0,
        from: message.from().map(convert_user),
        text: message.text().unwrap_or_default().to_string(),
        reply_to_sender: message
            .reply_to_message()
            .and_then(|reply| reply.from())
            .map(convert_user),
    }
}

fn convert_member_status(kind: &ChatMemberKind) -> MemberStatus {
    match kind {
        ChatMemberKind::Owner(_) => MemberStatus::Owner,
        ChatMemberKind::Administrator(_) => MemberStatus::Administrator,
        ChatMemberKind::Member => MemberStatus::Member,
        ChatMemberKind::Restricted(_) => MemberStatus::Restricted,
        ChatMemberKind::Left => MemberStatus::Left,
        ChatMemberKind::Banned(_) => MemberStatus::Banned,
    }
}

impl From<Update> for InboundUpdate {
    fn from(update: Update) -> Self {
        let kind = match update.kind {
            UpdateKind::Message(message) => InboundKind::Message(convert_message(&message)),
            UpdateKind::CallbackQuery(query) => InboundKind::Callback(InboundCallback {
                id: query.id,
                from: convert_user(&query.from),
                data: query.data,
                message: query.message.as_ref().map(convert_message),
            }),
            UpdateKind::MyChatMember(change) => InboundKind::Membership(MembershipChange {
                chat_id: change.chat.id.0,
                scope: scope_of(&change.chat),
                chat_title: change.chat.title().unwrap_or_default().to_string(),
                new_status: convert_member_status(&change.new_chat_member.kind),
            }),
            _ => InboundKind::Other,
        };
        Self {
            id: update.id,
            kind,
        }
    }
}
