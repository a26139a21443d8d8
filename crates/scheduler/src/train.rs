use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use lunchtrain_core::resolve::{resolve, TrainResolution};
use lunchtrain_core::roster::TrainRoster;
use lunchtrain_core::schedule::{ScheduleWindow, WeekdaySet};
use lunchtrain_slack::blocks::{self, ClosingSummary};
use lunchtrain_slack::gateway::{ChatGateway, NoopUserDirectory, PostedMessage, UserDirectory};
use lunchtrain_slack::jokes;

use crate::clock::{Clock, SystemClock};

/// Schedule targets for the running scheduler. The loop owns the window but
/// re-reads it at every poll tick, so configuration actions can move either
/// instant and be picked up within one tick.
#[derive(Debug)]
pub struct SharedWindow {
    inner: Mutex<ScheduleWindow>,
}

impl SharedWindow {
    pub fn new(window: ScheduleWindow) -> Self {
        Self { inner: Mutex::new(window) }
    }

    pub fn window(&self) -> ScheduleWindow {
        *self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_opens_at(&self, at: DateTime<Utc>) {
        self.update(|window| window.opens_at = at);
    }

    pub fn set_closes_at(&self, at: DateTime<Utc>) {
        self.update(|window| window.closes_at = at);
    }

    fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut ScheduleWindow),
    {
        let mut window = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        apply(&mut window);
    }
}

enum WindowEdge {
    Open,
    Close,
}

/// The daily lunch-train loop.
///
/// One cycle: catch the window up, wait for the open instant, post the
/// participation prompt, wait for the close instant, withdraw the prompt,
/// resolve the vote, announce, advance the window to the next enabled day,
/// reset the roster. Without a gateway the loop runs dry: time advances and
/// the vote resolves, but nothing is posted.
///
/// Every gateway call is best-effort; a delivery failure is logged and the
/// cycle continues, so one bad post never costs the next day's train.
pub struct TrainScheduler {
    channel: String,
    window: Arc<SharedWindow>,
    roster: Arc<TrainRoster>,
    gateway: Option<Arc<dyn ChatGateway>>,
    directory: Arc<dyn UserDirectory>,
    weekdays: WeekdaySet,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TrainScheduler {
    pub fn new(
        channel: impl Into<String>,
        window: Arc<SharedWindow>,
        roster: Arc<TrainRoster>,
    ) -> Self {
        Self {
            channel: channel.into(),
            window,
            roster,
            gateway: None,
            directory: Arc::new(NoopUserDirectory),
            weekdays: WeekdaySet::empty(),
            clock: Arc::new(SystemClock),
            poll_interval: Duration::from_secs(1),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    #[must_use]
    pub fn with_gateway(mut self, gateway: Arc<dyn ChatGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    #[must_use]
    pub fn with_directory(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.directory = directory;
        self
    }

    #[must_use]
    pub fn with_weekdays(mut self, weekdays: WeekdaySet) -> Self {
        self.weekdays = weekdays;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawns the loop. A second call while the task is alive is a no-op.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }
        self.running.store(true, Ordering::SeqCst);

        let runner = CycleRunner {
            channel: self.channel.clone(),
            window: self.window.clone(),
            roster: self.roster.clone(),
            gateway: self.gateway.clone(),
            directory: self.directory.clone(),
            weekdays: self.weekdays,
            clock: self.clock.clone(),
            poll_interval: self.poll_interval,
            running: self.running.clone(),
        };
        self.handle = Some(tokio::spawn(runner.run()));
    }

    /// Requests a stop and waits for the loop to terminate. After this
    /// returns, no further gateway call will be made.
    pub async fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if let Err(error) = handle.await {
                warn!(
                    event_name = "train.scheduler.join_failed",
                    error = %error,
                    "scheduler task did not shut down cleanly"
                );
            }
        }
    }
}

struct CycleRunner {
    channel: String,
    window: Arc<SharedWindow>,
    roster: Arc<TrainRoster>,
    gateway: Option<Arc<dyn ChatGateway>>,
    directory: Arc<dyn UserDirectory>,
    weekdays: WeekdaySet,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
}

impl CycleRunner {
    async fn run(self) {
        info!(
            event_name = "train.scheduler.started",
            channel = %self.channel,
            dry = self.gateway.is_none(),
            "lunch train scheduler started"
        );

        while self.run_cycle().await {}

        info!(event_name = "train.scheduler.stopped", channel = %self.channel, "lunch train scheduler stopped");
    }

    /// One full cycle. Returns `false` when a stop was requested at any
    /// wait point.
    async fn run_cycle(&self) -> bool {
        let now = self.clock.now_utc();
        self.window.update(|window| window.catch_up(now, self.weekdays));
        let armed = self.window.window();
        info!(
            event_name = "train.cycle.armed",
            opens_at = %armed.opens_at,
            closes_at = %armed.closes_at,
            "next lunch cycle armed"
        );

        if !self.wait_for(WindowEdge::Open).await {
            return false;
        }
        let posted = self.open_prompt().await;

        if !self.wait_for(WindowEdge::Close).await {
            return false;
        }
        self.close_train(posted).await;

        self.window.update(|window| window.advance_cycle(self.weekdays));
        self.roster.reset_cycle();
        true
    }

    /// Polls once per interval until the edge is reached, re-reading the
    /// target each tick in case it was moved. Returns `false` on stop.
    async fn wait_for(&self, edge: WindowEdge) -> bool {
        loop {
            if !self.running.load(Ordering::SeqCst) {
                return false;
            }
            let window = self.window.window();
            let target = match edge {
                WindowEdge::Open => window.opens_at,
                WindowEdge::Close => window.closes_at,
            };
            if self.clock.now_utc() >= target {
                return true;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn open_prompt(&self) -> Option<PostedMessage> {
        let gateway = self.gateway.as_ref()?;
        let template = {
            let mut rng = rand::thread_rng();
            blocks::participation_prompt(
                jokes::pick_food_emoji(&mut rng),
                jokes::pick_train_emoji(&mut rng),
                jokes::pick_joke(&mut rng),
            )
        };

        match gateway.post_message(&self.channel, &template).await {
            Ok(posted) => {
                info!(
                    event_name = "train.prompt.posted",
                    channel = %posted.channel,
                    ts = %posted.ts,
                    "participation prompt posted"
                );
                Some(posted)
            }
            Err(error) => {
                warn!(
                    event_name = "train.prompt.post_failed",
                    channel = %self.channel,
                    error = %error,
                    "failed to post participation prompt; cycle continues"
                );
                None
            }
        }
    }

    async fn close_train(&self, posted: Option<PostedMessage>) {
        let resolution = resolve(&self.roster.snapshot());
        info!(
            event_name = "train.cycle.resolved",
            time = resolution.time.as_ref().map(|winner| winner.value.as_str()).unwrap_or("unset"),
            restaurant = resolution
                .restaurant
                .as_ref()
                .map(|winner| winner.value.as_str())
                .unwrap_or("unset"),
            time_dissatisfied = resolution.time_dissatisfied.len(),
            restaurant_dissatisfied = resolution.restaurant_dissatisfied.len(),
            "lunch vote resolved"
        );

        let Some(gateway) = self.gateway.as_ref() else {
            return;
        };

        if let Some(posted) = posted {
            if let Err(error) = gateway.delete_message(&posted.channel, &posted.ts).await {
                warn!(
                    event_name = "train.prompt.withdraw_failed",
                    channel = %posted.channel,
                    ts = %posted.ts,
                    error = %error,
                    "failed to withdraw participation prompt"
                );
            }
        }

        let summary = self.render_summary(resolution).await;
        if let Err(error) =
            gateway.post_message(&self.channel, &blocks::closing_announcement(&summary)).await
        {
            warn!(
                event_name = "train.announcement.post_failed",
                channel = %self.channel,
                error = %error,
                "failed to post closing announcement"
            );
        }
    }

    async fn render_summary(&self, resolution: TrainResolution) -> ClosingSummary {
        ClosingSummary {
            time: resolution.time.map(|winner| winner.value),
            restaurant: resolution.restaurant.map(|winner| winner.value),
            time_dissatisfied: self.display_names(&resolution.time_dissatisfied).await,
            restaurant_dissatisfied: self.display_names(&resolution.restaurant_dissatisfied).await,
        }
    }

    async fn display_names(&self, user_ids: &[String]) -> Vec<String> {
        let mut names = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            names.push(self.directory.user_info(user_id).await.display_name);
        }
        names
    }
}
