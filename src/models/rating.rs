//! Recall rating given by the learner after revealing a card.
use crate::error::Error;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Rating {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    pub fn value(self) -> i64 {
        self as i64
    }

    /// Good and Easy count as a successful recall.
    pub fn is_correct(self) -> bool {
        self >= Rating::Good
    }

    pub fn label(self) -> &'static str {
        match self {
            Rating::Again => "Again",
            Rating::Hard => "Hard",
            Rating::Good => "Good",
            Rating::Easy => "Easy",
        }
    }
}

impl PartialOrd for Rating {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rating {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value().cmp(&other.value())
    }
}

impl TryFrom<i64> for Rating {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Rating::Again),
            2 => Ok(Rating::Hard),
            3 => Ok(Rating::Good),
            4 => Ok(Rating::Easy),
            other => Err(Error::InvalidRating(other)),
        }
    }
}

impl From<Rating> for i64 {
    fn from(rating: Rating) -> Self {
        rating.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_one_through_four() {
        for (value, expected) in (1..=4).zip(Rating::ALL) {
            assert_eq!(Rating::try_from(value).unwrap(), expected);
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        for value in [-1, 0, 5, 42] {
            assert!(matches!(
                Rating::try_from(value),
                Err(Error::InvalidRating(v)) if v == value
            ));
        }
    }

    #[test]
    fn test_correctness_split() {
        assert!(!Rating::Again.is_correct());
        assert!(!Rating::Hard.is_correct());
        assert!(Rating::Good.is_correct());
        assert!(Rating::Easy.is_correct());
    }

    #[test]
    fn test_deserialize_rejects_invalid() {
        assert_eq!(serde_json::from_str::<Rating>("3").unwrap(), Rating::Good);
        assert!(serde_json::from_str::<Rating>("7").is_err());
    }
}
