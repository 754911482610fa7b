//! Daily study streak and the per-day study log.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Single-row aggregate: consecutive days with at least one review.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStreak {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_streak_days: u32,
    pub last_study_date: Option<NaiveDate>,
}

impl UserStreak {
    /// Streak after studying on `today`, or `None` if today is already counted.
    pub fn advance(&self, today: NaiveDate) -> Option<UserStreak> {
        if self.last_study_date == Some(today) {
            return None;
        }

        let continues = self
            .last_study_date
            .is_some_and(|last| last.succ_opt() == Some(today));
        let current_streak = if continues { self.current_streak + 1 } else { 1 };

        Some(UserStreak {
            current_streak,
            longest_streak: self.longest_streak.max(current_streak),
            total_streak_days: self.total_streak_days + 1,
            last_study_date: Some(today),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStudyLog {
    pub study_date: NaiveDate,
    pub cards_studied: u32,
    pub minutes_studied: u32,
    pub streak_maintained: bool,
    pub daily_goal_met: bool,
}
