use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;

use lunchtrain_core::cache::TtlCell;
use lunchtrain_core::config::{AppConfig, ScheduleConfig};
use lunchtrain_core::roster::TrainRoster;
use lunchtrain_scheduler::{CacheRefresher, SharedWindow, TrainScheduler};
use lunchtrain_slack::blocks::TrainMenu;
use lunchtrain_slack::events::BlockActionRouter;
use lunchtrain_slack::gateway::{ChatGateway, NoopChatGateway, NoopUserDirectory, UserDirectory};

/// Everything the process needs after wiring: the loops ready to start, the
/// interaction router for the transport to feed, and the shared handles the
/// configuration surface mutates at runtime.
pub struct App {
    pub config: AppConfig,
    pub roster: Arc<TrainRoster>,
    pub window: Arc<SharedWindow>,
    pub actions: BlockActionRouter,
    pub settings_cache: Arc<TtlCell<ScheduleConfig>>,
    pub scheduler: TrainScheduler,
    pub refresher: CacheRefresher,
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<App> {
    let roster = Arc::new(TrainRoster::new());
    let window = Arc::new(SharedWindow::new(config.schedule.window_for(Utc::now())));

    // The real platform transport replaces these when the enclosing process
    // wires the SDK in; the scheduler and router only see the traits.
    let gateway: Arc<dyn ChatGateway> = Arc::new(NoopChatGateway::default());
    let directory: Arc<dyn UserDirectory> = Arc::new(NoopUserDirectory);

    let actions =
        BlockActionRouter::new(roster.clone(), directory.clone(), TrainMenu::default());

    let mut scheduler =
        TrainScheduler::new(config.slack.channel_id.clone(), window.clone(), roster.clone())
            .with_directory(directory)
            .with_weekdays(config.schedule.weekdays)
            .with_poll_interval(config.schedule.poll_interval());
    // Without a channel binding the scheduler runs dry: time advances, but
    // nothing is posted.
    if !config.slack.channel_id.is_empty() {
        scheduler = scheduler.with_gateway(gateway);
    }

    let mut refresher = CacheRefresher::new(config.schedule.cache_refresh_interval());
    let settings_cache = Arc::new(TtlCell::new(config.schedule.cache_ttl()));
    {
        // The settings store is an external collaborator; until it is wired
        // in, revalidation re-reads the boot-time snapshot.
        let settings_cache = settings_cache.clone();
        let schedule = config.schedule.clone();
        refresher.register(move || {
            settings_cache.refresh_with(|| schedule.clone());
        });
    }

    Ok(App { config, roster, window, actions, settings_cache, scheduler, refresher })
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;
    use lunchtrain_core::schedule::WeekdaySet;

    use super::*;

    fn configured() -> AppConfig {
        let mut config = AppConfig::default();
        config.schedule.weekdays = WeekdaySet::empty().enable(Weekday::Mon);
        config.slack.channel_id = "C-lunch".to_owned();
        config
    }

    #[tokio::test]
    async fn bootstrap_wires_a_ready_app() {
        let app = bootstrap_with_config(configured()).expect("bootstrap");

        assert!(!app.scheduler.is_running());
        assert!(!app.refresher.is_running());
        let window = app.window.window();
        assert!(window.closes_at > window.opens_at);
        assert_eq!(app.roster.snapshot().participant_count(), 0);
    }

    #[tokio::test]
    async fn bootstrap_without_channel_still_builds_a_dry_app() {
        let mut config = configured();
        config.slack.channel_id = String::new();

        let app = bootstrap_with_config(config).expect("bootstrap");
        assert!(!app.scheduler.is_running());
    }
}
