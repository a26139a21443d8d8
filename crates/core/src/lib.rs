//! Core domain for the lunch-train bot.
//!
//! Everything here is I/O free:
//! - **Roster** (`roster`) - current-cycle participation and preferences
//! - **Resolution** (`resolve`) - scoring and winner selection
//! - **Schedule** (`schedule`) - window arithmetic, weekday filtering,
//!   wall-clock and offset parsing
//! - **Config** (`config`) - TOML + environment configuration pipeline
//! - **Cache** (`cache`) - time-bounded cells kept warm by the refresher

pub mod cache;
pub mod config;
pub mod resolve;
pub mod roster;
pub mod schedule;

pub use cache::TtlCell;
pub use config::{AppConfig, ConfigError, LoadOptions, LogFormat};
pub use resolve::{resolve, TrainResolution, Winner};
pub use roster::{MessageHandle, Participation, RosterSnapshot, TrainRoster};
pub use schedule::{
    parse_utc_offset, window_from_wall_clock, zero_utc_offset, ScheduleError, ScheduleWindow,
    WallClock, WeekdaySet,
};
