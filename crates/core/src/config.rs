use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

use crate::schedule::{
    parse_utc_offset, window_from_wall_clock, zero_utc_offset, ScheduleError, ScheduleWindow,
    WallClock, WeekdaySet,
};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub slack: SlackConfig,
    pub schedule: ScheduleConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    pub app_token: SecretString,
    pub bot_token: SecretString,
    pub channel_id: String,
    pub channel_name: String,
}

#[derive(Clone, Debug)]
pub struct ScheduleConfig {
    pub participants_notification_at: WallClock,
    pub compute_lunch_at: WallClock,
    pub notification_utc_offset: FixedOffset,
    pub compute_utc_offset: FixedOffset,
    pub weekdays: WeekdaySet,
    pub poll_interval_secs: u64,
    pub cache_ttl_secs: u64,
    pub cache_refresh_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            slack: SlackConfig {
                app_token: String::new().into(),
                bot_token: String::new().into(),
                channel_id: String::new(),
                channel_name: String::new(),
            },
            schedule: ScheduleConfig {
                participants_notification_at: "11:30".parse().unwrap_or_default(),
                compute_lunch_at: "12:30".parse().unwrap_or_default(),
                notification_utc_offset: zero_utc_offset(),
                compute_utc_offset: zero_utc_offset(),
                weekdays: WeekdaySet::empty(),
                poll_interval_secs: 1,
                cache_ttl_secs: 60,
                cache_refresh_secs: 1,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl ScheduleConfig {
    /// Materializes today's open/close instants in UTC. The result may need
    /// catch-up before a scheduler can wait on it.
    pub fn window_for(&self, now: DateTime<Utc>) -> ScheduleWindow {
        window_from_wall_clock(
            self.participants_notification_at,
            self.notification_utc_offset,
            self.compute_lunch_at,
            self.compute_utc_offset,
            now,
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.cache_refresh_secs)
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("lunchtrain.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_pairs(env::vars())?;
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(slack) = patch.slack {
            if let Some(app_token) = slack.app_token {
                self.slack.app_token = app_token.into();
            }
            if let Some(bot_token) = slack.bot_token {
                self.slack.bot_token = bot_token.into();
            }
            if let Some(channel_id) = slack.channel_id {
                self.slack.channel_id = channel_id;
            }
            if let Some(channel_name) = slack.channel_name {
                self.slack.channel_name = channel_name;
            }
        }

        if let Some(schedule) = patch.schedule {
            if let Some(raw) = schedule.participants_notification_at {
                self.schedule.participants_notification_at = raw.parse()?;
            }
            if let Some(raw) = schedule.compute_lunch_at {
                self.schedule.compute_lunch_at = raw.parse()?;
            }
            if let Some(raw) = schedule.notification_utc_offset {
                self.schedule.notification_utc_offset = parse_utc_offset(&raw)?;
            }
            if let Some(raw) = schedule.compute_utc_offset {
                self.schedule.compute_utc_offset = parse_utc_offset(&raw)?;
            }
            if let Some(names) = schedule.weekdays {
                self.schedule.weekdays = WeekdaySet::from_names(names)?;
            }
            if let Some(poll_interval_secs) = schedule.poll_interval_secs {
                self.schedule.poll_interval_secs = poll_interval_secs;
            }
            if let Some(cache_ttl_secs) = schedule.cache_ttl_secs {
                self.schedule.cache_ttl_secs = cache_ttl_secs;
            }
            if let Some(cache_refresh_secs) = schedule.cache_refresh_secs {
                self.schedule.cache_refresh_secs = cache_refresh_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format.parse()?;
            }
        }

        Ok(())
    }

    fn apply_env_pairs<I>(&mut self, pairs: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in pairs {
            let invalid = |key: &str, value: &str| ConfigError::InvalidEnvOverride {
                key: key.to_owned(),
                value: value.to_owned(),
            };

            match key.as_str() {
                "LUNCHTRAIN_SLACK_APP_TOKEN" => self.slack.app_token = value.into(),
                "LUNCHTRAIN_SLACK_BOT_TOKEN" => self.slack.bot_token = value.into(),
                "LUNCHTRAIN_SLACK_CHANNEL_ID" => self.slack.channel_id = value,
                "LUNCHTRAIN_SLACK_CHANNEL_NAME" => self.slack.channel_name = value,
                "LUNCHTRAIN_NOTIFY_AT" => {
                    self.schedule.participants_notification_at =
                        value.parse().map_err(|_| invalid(&key, &value))?;
                }
                "LUNCHTRAIN_COMPUTE_AT" => {
                    self.schedule.compute_lunch_at =
                        value.parse().map_err(|_| invalid(&key, &value))?;
                }
                "LUNCHTRAIN_NOTIFY_UTC_OFFSET" => {
                    self.schedule.notification_utc_offset =
                        parse_utc_offset(&value).map_err(|_| invalid(&key, &value))?;
                }
                "LUNCHTRAIN_COMPUTE_UTC_OFFSET" => {
                    self.schedule.compute_utc_offset =
                        parse_utc_offset(&value).map_err(|_| invalid(&key, &value))?;
                }
                "LUNCHTRAIN_WEEKDAYS" => {
                    self.schedule.weekdays =
                        WeekdaySet::from_names(value.split(','))
                            .map_err(|_| invalid(&key, &value))?;
                }
                "LUNCHTRAIN_POLL_INTERVAL_SECS" => {
                    self.schedule.poll_interval_secs =
                        value.parse().map_err(|_| invalid(&key, &value))?;
                }
                "LUNCHTRAIN_CACHE_TTL_SECS" => {
                    self.schedule.cache_ttl_secs =
                        value.parse().map_err(|_| invalid(&key, &value))?;
                }
                "LUNCHTRAIN_CACHE_REFRESH_SECS" => {
                    self.schedule.cache_refresh_secs =
                        value.parse().map_err(|_| invalid(&key, &value))?;
                }
                "LUNCHTRAIN_LOG_LEVEL" => self.logging.level = value,
                "LUNCHTRAIN_LOG_FORMAT" => {
                    self.logging.format = value.parse().map_err(|_| invalid(&key, &value))?;
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.schedule.weekdays.is_empty() {
            return Err(ConfigError::Validation(
                "no weekday is enabled; enable at least one under [schedule] weekdays".to_owned(),
            ));
        }
        if self.schedule.poll_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "schedule.poll_interval_secs must be at least 1".to_owned(),
            ));
        }
        if self.schedule.cache_refresh_secs == 0 {
            return Err(ConfigError::Validation(
                "schedule.cache_refresh_secs must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = env::var("LUNCHTRAIN_CONFIG") {
        return Some(PathBuf::from(path));
    }

    let default_path = PathBuf::from("lunchtrain.toml");
    default_path.exists().then_some(default_path)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    slack: Option<SlackPatch>,
    schedule: Option<SchedulePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackPatch {
    app_token: Option<String>,
    bot_token: Option<String>,
    channel_id: Option<String>,
    channel_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SchedulePatch {
    participants_notification_at: Option<String>,
    compute_lunch_at: Option<String>,
    notification_utc_offset: Option<String>,
    compute_utc_offset: Option<String>,
    weekdays: Option<Vec<String>>,
    poll_interval_secs: Option<u64>,
    cache_ttl_secs: Option<u64>,
    cache_refresh_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<String>,
}
