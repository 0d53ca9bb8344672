//! The update-dispatch and progress-state engine.
//!
//! One engine instance lives for the whole process. It owns the
//! stores, the outbound notifier, the group-registration cache and the
//! bot's resolved self-identity; the polling loop feeds it one
//! [`InboundUpdate`] at a time. Handlers contain their own failures:
//! anything that goes wrong inside one update is logged, recorded to
//! the activity sheet, and never reaches the loop.

use chrono_tz::Tz;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::bot::commands::Command;
use crate::bot::keyboards;
use crate::bot::render::{render_plan_message, Audience};
use crate::bot::update::{
    ChatScope, InboundCallback, InboundKind, InboundMessage, InboundUpdate, MembershipChange,
    Sender,
};
use crate::config::Config;
use crate::notify::Notifier;
use crate::storage::groups::{GroupRecord, GroupStore, DEFAULT_NOTIFICATION_TIME};
use crate::storage::log::{ActivityLog, LogStatus};
use crate::storage::plan::PlanStore;
use crate::storage::progress::ProgressStore;
use crate::storage::RowStore;
use crate::utils::datetime::{local_date, parse_timezone, resolve_day};

const REACTION_EMOJI: &str = "👍";

const MSG_WELCOME: &str = "Hi! This is the daily reading bot. 🙌\n\n\
    Type /start_john to begin your personal quest.";
const MSG_QUEST_START: &str = "Your daily reading quest starts now. ✨\n\
    From here on we read at your pace, one day at a time from day 1.\n\n\
    When you're ready, press the button below to receive your first quest!";
const MSG_NOT_STARTED: &str =
    "You haven't started the reading quest yet. You can begin with /start_john.";
const MSG_PLAN_DONE: &str =
    "There are no more quests prepared. Congratulations, you finished the whole plan! 🎉";
const MSG_GROUP_WELCOME: &str = "Hello! This is the community reading bot. 🙌\n\
    This group was registered with the default settings. Please check the \
    start date, plan and timezone in the sheet if they need adjusting.\n\
    You can start a personal quest in a DM with /start_john.";

/// Who the bot is, for spotting replies to its own messages. Resolved
/// once at startup via getMe, with the configured username as the
/// fallback when that lookup fails.
#[derive(Debug, Clone, Default)]
pub struct BotIdentity {
    pub id: Option<u64>,
    pub username: String,
}

impl BotIdentity {
    fn matches(&self, sender: &Sender) -> bool {
        if self.id.is_some() && self.id == Some(sender.id) {
            return true;
        }
        !self.username.is_empty() && sender.username == self.username
    }
}

/// Per-command context, shared by message- and callback-originated
/// invocations. In private chats the chat id doubles as the progress
/// key.
struct CommandCtx {
    chat_id: i64,
    scope: ChatScope,
    username: String,
    display_name: String,
}

impl CommandCtx {
    fn from_message(message: &InboundMessage) -> Self {
        Self::with_sender(message, message.from.as_ref())
    }

    /// Callback presses reuse the button message's chat but attribute
    /// the action to the pressing user, not to the message author (the
    /// bot itself).
    fn with_sender(message: &InboundMessage, sender: Option<&Sender>) -> Self {
        let username = sender.map(|s| s.username.clone()).unwrap_or_default();
        let display_name = sender
            .map(|s| {
                if s.username.is_empty() {
                    s.first_name.clone()
                } else {
                    s.username.clone()
                }
            })
            .unwrap_or_default();
        Self {
            chat_id: message.chat_id,
            scope: message.scope,
            username,
            display_name,
        }
    }

    fn user_key(&self) -> String {
        self.chat_id.to_string()
    }
}

pub struct Engine<S: RowStore, N: Notifier> {
    config: Config,
    default_tz: Option<Tz>,
    notifier: N,
    plan: PlanStore<S>,
    progress: ProgressStore<S>,
    groups: GroupStore<S>,
    log: ActivityLog<S>,
    group_cache: HashSet<String>,
    identity: BotIdentity,
}

impl<S: RowStore, N: Notifier> Engine<S, N> {
    pub fn new(config: Config, store: Arc<S>, notifier: N) -> Self {
        let default_tz = parse_timezone(&config.timezone);
        let plan = PlanStore::new(store.clone(), config.plan_sheet.clone());
        let progress = ProgressStore::new(store.clone(), config.progress_sheet.clone(), default_tz);
        let groups = GroupStore::new(store.clone(), config.groups_sheet.clone());
        let log = ActivityLog::new(store, config.log_sheet.clone());
        let identity = BotIdentity {
            id: None,
            username: config.bot_username.clone(),
        };
        Self {
            config,
            default_tz,
            notifier,
            plan,
            progress,
            groups,
            log,
            group_cache: HashSet::new(),
            identity,
        }
    }

    /// Install the identity resolved from getMe. An empty username
    /// keeps the configured fallback.
    pub fn set_identity(&mut self, id: u64, username: String) {
        self.identity.id = Some(id);
        if !username.is_empty() {
            self.identity.username = username;
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Pre-warm the plan cache and the group-registration cache. Both
    /// are best-effort; a cold cache only costs an extra welcome or an
    /// empty plan until the next reload.
    pub async fn warm_up(&mut self) {
        match self.plan.reload().await {
            Ok(count) => info!("plan cache loaded with {count} days"),
            Err(e) => error!("initial plan load failed: {e:#}"),
        }
        match self.groups.list().await {
            Ok(groups) => {
                for group in groups {
                    self.group_cache.insert(group.chat_id);
                }
                info!("group cache preloaded with {} chats", self.group_cache.len());
            }
            Err(e) => debug!("group cache preload failed: {e:#}"),
        }
    }

    pub async fn handle_update(&mut self, update: InboundUpdate) {
        match update.kind {
            InboundKind::Callback(callback) => self.handle_callback(callback).await,
            InboundKind::Membership(change) => self.handle_membership(change).await,
            InboundKind::Message(message) => self.handle_message(message).await,
            InboundKind::Other => {}
        }
    }

    /// Inline button presses. The callback must be answered in every
    /// branch or the client keeps its loading spinner.
    async fn handle_callback(&mut self, callback: InboundCallback) {
        let (Some(message), Some(data)) = (callback.message.as_ref(), callback.data.as_deref())
        else {
            self.notifier.answer_callback(&callback.id, None).await;
            return;
        };
        let ctx = CommandCtx::with_sender(message, Some(&callback.from));
        match data {
            "next" => {
                self.notifier
                    .answer_callback(&callback.id, Some("Loading your next quest..."))
                    .await;
                self.run_command(Command::Next, &ctx).await;
            }
            "repeat" => {
                self.notifier
                    .answer_callback(&callback.id, Some("Reading it again"))
                    .await;
                self.run_command(Command::Repeat, &ctx).await;
            }
            "status" => {
                self.notifier.answer_callback(&callback.id, None).await;
                self.run_command(Command::Status, &ctx).await;
            }
            _ => self.notifier.answer_callback(&callback.id, None).await,
        }
    }

    /// The bot was added to (or promoted in) a chat. Auto-register
    /// groups once, with the process-wide defaults.
    async fn handle_membership(&mut self, change: MembershipChange) {
        if !change.scope.is_group_like() {
            return;
        }
        if !change.new_status.grants_membership() {
            return;
        }
        let chat_key = change.chat_id.to_string();
        if self.group_cache.contains(&chat_key) {
            return;
        }
        let record = self.default_group_record(&chat_key);
        match self.groups.append(&record).await {
            Ok(()) => {
                self.group_cache.insert(chat_key.clone());
            }
            Err(e) => error!("failed to auto-register group {chat_key}: {e:#}"),
        }
        let keyboard = keyboards::welcome_keyboard(&self.identity.username);
        if let Err(e) = self
            .notifier
            .send_text(change.chat_id.into(), MSG_GROUP_WELCOME, keyboard)
            .await
        {
            error!("welcome message to group {chat_key} failed: {e:#}");
        }
        self.log
            .append(
                &chat_key,
                change.scope.as_str(),
                "",
                "my_chat_member",
                LogStatus::Ok,
                "auto-registered",
            )
            .await;
    }

    async fn handle_message(&mut self, message: InboundMessage) {
        if message.scope.is_group_like() {
            self.handle_group_message(message).await;
            return;
        }
        if message.scope != ChatScope::Private {
            return;
        }
        let Some(command) = Command::parse(&message.text) else {
            // Unrecognized input in a DM gets no reply.
            return;
        };
        let ctx = CommandCtx::from_message(&message);
        self.run_command(command, &ctx).await;
    }

    async fn handle_group_message(&mut self, message: InboundMessage) {
        let chat_key = message.chat_id.to_string();

        // Keep track of which groups a known reader participates in.
        if let Some(sender) = message.from.as_ref().filter(|s| !s.is_bot) {
            match self
                .progress
                .link_group(&sender.id.to_string(), &chat_key)
                .await
            {
                Ok(true) => debug!("linked user {} to group {chat_key}", sender.id),
                Ok(false) => {}
                Err(e) => debug!("group link for user {} failed: {e:#}", sender.id),
            }
        }

        // A reply to one of the bot's own messages earns a reaction
        // and nothing else.
        if let Some(replied_to) = message.reply_to_sender.as_ref() {
            if self.identity.matches(replied_to) {
                info!("reply to bot detected in chat {chat_key}; reacting");
                self.notifier
                    .react(message.chat_id, message.message_id, REACTION_EMOJI)
                    .await;
                return;
            }
        }

        // Only group registration is a group-scope command.
        if Command::parse(&message.text) == Some(Command::RegisterGroup) {
            let ctx = CommandCtx::from_message(&message);
            self.run_command(Command::RegisterGroup, &ctx).await;
        }
    }

    async fn run_command(&mut self, command: Command, ctx: &CommandCtx) {
        let outcome = match command {
            Command::Start => self.cmd_start(ctx).await,
            Command::StartJohn => self.cmd_start_john(ctx).await,
            Command::Next => self.cmd_next(ctx).await,
            Command::Status => self.cmd_status(ctx).await,
            Command::Repeat => self.cmd_repeat(ctx).await,
            Command::TodayGroup => self.cmd_today_group(ctx).await,
            Command::Reload => self.cmd_reload(ctx).await,
            Command::RegisterGroup => self.cmd_register_group(ctx).await,
        };
        match outcome {
            Ok(()) => {
                self.log
                    .append(
                        &ctx.user_key(),
                        ctx.scope.as_str(),
                        &ctx.display_name,
                        command.as_str(),
                        LogStatus::Ok,
                        "",
                    )
                    .await;
            }
            Err(e) => {
                error!("command {} in chat {} failed: {e:#}", command.as_str(), ctx.chat_id);
                self.log
                    .append(
                        &ctx.user_key(),
                        ctx.scope.as_str(),
                        &ctx.display_name,
                        command.as_str(),
                        LogStatus::Error,
                        &e.to_string(),
                    )
                    .await;
            }
        }
    }

    async fn cmd_start(&mut self, ctx: &CommandCtx) -> anyhow::Result<()> {
        self.notifier.send_typing(ctx.chat_id).await;
        self.notifier
            .send_text(ctx.chat_id.into(), MSG_WELCOME, None)
            .await
    }

    /// Idempotent create-or-show: an existing quest is reported, never
    /// reset.
    async fn cmd_start_john(&mut self, ctx: &CommandCtx) -> anyhow::Result<()> {
        self.notifier.send_typing(ctx.chat_id).await;
        let user_key = ctx.user_key();
        if let Some(record) = self.progress.get(&user_key).await? {
            let text = format!(
                "You're already on the reading quest. 😊\n\n\
                 - Current stage: DAY {}\n\n\
                 Press a button below to keep going.",
                record.current_day
            );
            return self
                .notifier
                .send_text(ctx.chat_id.into(), &text, Some(keyboards::quest_keyboard()))
                .await;
        }
        self.progress
            .upsert(&user_key, &ctx.username, 1, Some(""), None)
            .await?;
        self.notifier
            .send_text(
                ctx.chat_id.into(),
                MSG_QUEST_START,
                Some(keyboards::start_keyboard()),
            )
            .await
    }

    /// Deliver the current day, then advance. Progress moves only
    /// after a successful delivery, and never when the plan has run
    /// out.
    async fn cmd_next(&mut self, ctx: &CommandCtx) -> anyhow::Result<()> {
        self.notifier.send_typing(ctx.chat_id).await;
        let user_key = ctx.user_key();
        let Some(record) = self.progress.get(&user_key).await? else {
            return self
                .notifier
                .send_text(
                    ctx.chat_id.into(),
                    "Please start your quest first with /start_john.",
                    None,
                )
                .await;
        };
        let day = record.current_day;
        let Some(entry) = self.plan.get_by_day(day) else {
            return self
                .notifier
                .send_text(ctx.chat_id.into(), MSG_PLAN_DONE, None)
                .await;
        };
        let text = render_plan_message(day, entry, Audience::Personal);
        let image_url = entry.image_url.trim().to_string();
        if image_url.is_empty() {
            self.notifier
                .send_text(ctx.chat_id.into(), &text, Some(keyboards::quest_keyboard()))
                .await?;
        } else {
            self.notifier
                .send_photo(
                    ctx.chat_id.into(),
                    &image_url,
                    &text,
                    Some(keyboards::quest_keyboard()),
                )
                .await?;
        }
        self.progress
            .upsert(&user_key, &ctx.username, day + 1, None, None)
            .await
    }

    async fn cmd_status(&mut self, ctx: &CommandCtx) -> anyhow::Result<()> {
        self.notifier.send_typing(ctx.chat_id).await;
        let Some(record) = self.progress.get(&ctx.user_key()).await? else {
            return self
                .notifier
                .send_text(ctx.chat_id.into(), MSG_NOT_STARTED, None)
                .await;
        };
        let next_day = record.current_day;
        let finished_day = next_day.saturating_sub(1);
        let text = match self.plan.get_by_day(next_day) {
            Some(entry) => format!(
                "🔎 Your reading quest so far\n\n\
                 - Completed quests: DAY {finished_day}\n\
                 - Next quest: DAY {next_day} – {} ({})",
                entry.reference.trim(),
                entry.title.trim()
            ),
            None => format!(
                "🔎 Your reading quest so far\n\n\
                 - Completed quests: DAY {finished_day}\n\
                 You've finished every quest that's been prepared. 🎉"
            ),
        };
        self.notifier
            .send_text(ctx.chat_id.into(), &text, Some(keyboards::quest_keyboard()))
            .await
    }

    /// Re-deliver the previously completed day. Reads `current_day - 1`
    /// and never writes anything back.
    async fn cmd_repeat(&mut self, ctx: &CommandCtx) -> anyhow::Result<()> {
        self.notifier.send_typing(ctx.chat_id).await;
        let Some(record) = self.progress.get(&ctx.user_key()).await? else {
            return self
                .notifier
                .send_text(ctx.chat_id.into(), MSG_NOT_STARTED, None)
                .await;
        };
        if record.current_day <= 1 {
            return self
                .notifier
                .send_text(
                    ctx.chat_id.into(),
                    "You haven't completed a quest yet. Get your first one with /next.",
                    Some(keyboards::start_keyboard()),
                )
                .await;
        }
        let repeat_day = record.current_day - 1;
        let Some(entry) = self.plan.get_by_day(repeat_day) else {
            return self
                .notifier
                .send_text(
                    ctx.chat_id.into(),
                    "Couldn't find the previous quest's content.",
                    None,
                )
                .await;
        };
        let text = render_plan_message(repeat_day, entry, Audience::Personal);
        let image_url = entry.image_url.trim().to_string();
        if image_url.is_empty() {
            self.notifier
                .send_text(ctx.chat_id.into(), &text, Some(keyboards::quest_keyboard()))
                .await
        } else {
            self.notifier
                .send_photo(
                    ctx.chat_id.into(),
                    &image_url,
                    &text,
                    Some(keyboards::quest_keyboard()),
                )
                .await
        }
    }

    /// Show today's community reading for the groups the user is
    /// linked to, or for an arbitrary registered group when none are.
    async fn cmd_today_group(&mut self, ctx: &CommandCtx) -> anyhow::Result<()> {
        self.notifier.send_typing(ctx.chat_id).await;
        let linked = self
            .progress
            .get(&ctx.user_key())
            .await?
            .map(|record| record.linked_group_ids)
            .unwrap_or_default();
        let registered = self.groups.list().await?;
        if registered.is_empty() {
            return self
                .notifier
                .send_text(ctx.chat_id.into(), "No community groups are set up.", None)
                .await;
        }
        let mut chosen: Vec<&GroupRecord> = registered
            .iter()
            .filter(|group| linked.contains(&group.chat_id))
            .collect();
        if chosen.is_empty() {
            chosen.push(&registered[0]);
        }
        for group in chosen {
            let tz = group
                .timezone
                .as_deref()
                .and_then(parse_timezone)
                .or(self.default_tz);
            let start = group.start_date.unwrap_or(self.config.start_date);
            let Some(day) = resolve_day(local_date(tz), start) else {
                self.notifier
                    .send_text(
                        ctx.chat_id.into(),
                        "The community reading hasn't started yet.",
                        None,
                    )
                    .await?;
                continue;
            };
            let Some(entry) = self.plan.get_by_day(day) else {
                let text = format!("Couldn't find community DAY {day} content.");
                self.notifier
                    .send_text(ctx.chat_id.into(), &text, None)
                    .await?;
                continue;
            };
            let text = render_plan_message(day, entry, Audience::Community);
            self.notifier
                .send_text(ctx.chat_id.into(), &text, None)
                .await?;
        }
        Ok(())
    }

    async fn cmd_reload(&mut self, ctx: &CommandCtx) -> anyhow::Result<()> {
        let count = self.plan.reload().await?;
        let text = format!("Plan reloaded ({count} days).");
        self.notifier
            .send_text(ctx.chat_id.into(), &text, None)
            .await
    }

    async fn cmd_register_group(&mut self, ctx: &CommandCtx) -> anyhow::Result<()> {
        if !ctx.scope.is_group_like() {
            return self
                .notifier
                .send_text(
                    ctx.chat_id.into(),
                    "This command only works in groups and supergroups.",
                    None,
                )
                .await;
        }
        let chat_key = ctx.user_key();
        let record = self.default_group_record(&chat_key);
        match self.groups.append(&record).await {
            Ok(()) => {
                self.group_cache.insert(chat_key.clone());
                let text = format!(
                    "This group is registered.\n\
                     chat_id={chat_key}\n\
                     plan_sheet={}\n\
                     start_date={}\n\
                     timezone={}",
                    self.config.plan_sheet,
                    self.config.start_date.format("%Y-%m-%d"),
                    self.config.timezone
                );
                self.notifier
                    .send_text(ctx.chat_id.into(), &text, None)
                    .await
            }
            Err(e) => {
                error!("failed to register group {chat_key}: {e:#}");
                self.notifier
                    .send_text(
                        ctx.chat_id.into(),
                        "Something went wrong registering this group. Please try again later.",
                        None,
                    )
                    .await?;
                Err(e)
            }
        }
    }

    fn default_group_record(&self, chat_key: &str) -> GroupRecord {
        GroupRecord {
            chat_id: chat_key.to_string(),
            plan_sheet: Some(self.config.plan_sheet.clone()),
            start_date: Some(self.config.start_date),
            timezone: Some(self.config.timezone.clone()),
            notification_time: DEFAULT_NOTIFICATION_TIME.to_string(),
        }
    }
}
