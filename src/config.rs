//! Runtime configuration read from the environment (and `.env`, if present).

use std::path::PathBuf;

pub const DEFAULT_DATABASE_PATH: &str = "db.sqlite3";
pub const DEFAULT_DAILY_GOAL: u32 = 20;
pub const DEFAULT_STUDY_BATCH_SIZE: u32 = 20;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub log_level: String,
    /// Cards per day before `daily_goal_met` flips to true.
    pub daily_goal: u32,
    /// Upper bound on cards pulled into one study session.
    pub study_batch_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            log_level: "info".to_string(),
            daily_goal: DEFAULT_DAILY_GOAL,
            study_batch_size: DEFAULT_STUDY_BATCH_SIZE,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let database_path = lookup("FLASHCARDS_DB")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let log_level = lookup("RUST_LOG").unwrap_or(defaults.log_level);

        let daily_goal = lookup("DAILY_GOAL")
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|goal| *goal > 0)
            .unwrap_or(defaults.daily_goal);

        let study_batch_size = lookup("STUDY_BATCH_SIZE")
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(defaults.study_batch_size);

        Self {
            database_path,
            log_level,
            daily_goal,
            study_batch_size,
        }
    }
}
