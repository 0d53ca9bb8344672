//! Scheduled community delivery.
//!
//! A sweep runs at the top of every minute and sends the day's reading
//! to each registered group whose local wall-clock time matches its
//! notification time. The sweep reuses the same day resolution, plan
//! cache and renderer as the command handlers; it keeps no state of
//! its own.

use std::collections::HashMap;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::bot::render::{render_plan_message, Audience};
use crate::config::Config;
use crate::notify::{Destination, Notifier};
use crate::storage::groups::GroupStore;
use crate::storage::plan::PlanStore;
use crate::storage::RowStore;
use crate::utils::datetime::{local_date, local_hhmm, parse_timezone, resolve_day};
use crate::utils::links::parse_chat_destination;

pub struct BroadcastService<S: RowStore + 'static, N: Notifier + 'static> {
    scheduler: JobScheduler,
    context: Arc<BroadcastContext<S, N>>,
}

struct BroadcastContext<S, N> {
    config: Config,
    store: Arc<S>,
    notifier: N,
    groups: GroupStore<S>,
}

impl<S: RowStore + 'static, N: Notifier + 'static> BroadcastService<S, N> {
    pub async fn new(
        config: Config,
        store: Arc<S>,
        notifier: N,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let scheduler = JobScheduler::new().await?;
        let groups = GroupStore::new(store.clone(), config.groups_sheet.clone());
        Ok(Self {
            scheduler,
            context: Arc::new(BroadcastContext {
                config,
                store,
                notifier,
                groups,
            }),
        })
    }

    pub async fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let context = self.context.clone();
        let job = Job::new_async("0 * * * * *", move |_uuid, _lock| {
            let context = context.clone();
            Box::pin(async move {
                if let Err(e) = run_broadcast_sweep(context).await {
                    tracing::error!("broadcast sweep failed: {e:#}");
                }
            })
        })?;
        self.scheduler.add(job).await?;
        self.scheduler.start().await?;
        info!("broadcast service started - checking group notification times every minute");
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.scheduler.shutdown().await?;
        Ok(())
    }

    /// Manual trigger, used for smoke-testing a deployment.
    pub async fn sweep_now(&self) -> anyhow::Result<()> {
        run_broadcast_sweep(self.context.clone()).await
    }
}

async fn run_broadcast_sweep<S: RowStore, N: Notifier>(
    context: Arc<BroadcastContext<S, N>>,
) -> anyhow::Result<()> {
    let groups = context.groups.list().await?;
    if groups.is_empty() {
        return Ok(());
    }
    let default_tz = parse_timezone(&context.config.timezone);
    // One plan cache per sheet within a sweep; groups often share one.
    let mut plans: HashMap<String, PlanStore<S>> = HashMap::new();

    for group in groups {
        let tz = group
            .timezone
            .as_deref()
            .and_then(parse_timezone)
            .or(default_tz);
        if local_hhmm(tz) != group.notification_time.trim() {
            continue;
        }

        let start = group.start_date.unwrap_or(context.config.start_date);
        let Some(day) = resolve_day(local_date(tz), start) else {
            info!(
                "start date is in the future for chat_id={}; skipping",
                group.chat_id
            );
            continue;
        };

        let sheet = group
            .plan_sheet
            .clone()
            .unwrap_or_else(|| context.config.plan_sheet.clone());
        if !plans.contains_key(&sheet) {
            let mut plan = PlanStore::new(context.store.clone(), sheet.clone());
            if let Err(e) = plan.reload().await {
                error!("plan sheet '{sheet}' failed to load: {e:#}");
                continue;
            }
            plans.insert(sheet.clone(), plan);
        }
        let Some(plan) = plans.get(&sheet) else {
            continue;
        };
        let Some(entry) = plan.get_by_day(day) else {
            warn!(
                "no plan found for day={day} in sheet={sheet}; chat_id={}; nothing sent",
                group.chat_id
            );
            continue;
        };

        let (chat_raw, thread_id) = parse_chat_destination(&group.chat_id);
        let chat_id: i64 = match chat_raw.parse() {
            Ok(id) => id,
            Err(_) => {
                warn!("unparseable chat id '{}' in group sheet", group.chat_id);
                continue;
            }
        };
        let dest = Destination::with_thread(chat_id, thread_id);
        let text = render_plan_message(day, entry, Audience::Community);
        let image_url = entry.image_url.trim();
        let sent = if image_url.is_empty() {
            context.notifier.send_text(dest, &text, None).await
        } else {
            context
                .notifier
                .send_photo(dest, image_url, &text, None)
                .await
        };
        match sent {
            Ok(()) => info!(
                "sent day {day} message to chat_id={} (sheet={sheet})",
                group.chat_id
            ),
            Err(e) => error!("broadcast to chat_id={} failed: {e:#}", group.chat_id),
        }
    }
    Ok(())
}
