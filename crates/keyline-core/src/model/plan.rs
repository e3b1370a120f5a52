use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use super::{DEFAULT_PAID_LIMIT, FREE_MESSAGES_LIMIT};

/// Service tier. Determines the daily message allowance.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Plan {
    #[default]
    Free,
    Classic,
    Pro,
}

impl Plan {
    /// Messages per day granted by this tier.
    pub const fn daily_limit(self) -> i64 {
        match self {
            Self::Free => FREE_MESSAGES_LIMIT,
            Self::Classic => DEFAULT_PAID_LIMIT,
            Self::Pro => 1000,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Decode a stored plan name. Unknown names fall back to `Free`.
    pub fn from_stored(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("classic".parse::<Plan>().unwrap(), Plan::Classic);
        assert_eq!("PRO".parse::<Plan>().unwrap(), Plan::Pro);
        assert!("gold".parse::<Plan>().is_err());
    }

    #[test]
    fn unknown_stored_plan_is_free() {
        assert_eq!(Plan::from_stored("Enterprise"), Plan::Free);
        assert_eq!(Plan::from_stored("Pro"), Plan::Pro);
    }

    #[test]
    fn string_forms_round_trip() {
        for plan in Plan::iter() {
            assert_eq!(plan.to_string(), plan.as_str());
            assert_eq!(Plan::from_stored(plan.as_str()), plan);
            let json = serde_json::to_string(&plan).unwrap();
            assert_eq!(json, format!("\"{plan}\""));
        }
    }

    #[test]
    fn daily_limits() {
        assert_eq!(Plan::Free.daily_limit(), 10);
        assert_eq!(Plan::Classic.daily_limit(), 500);
        assert_eq!(Plan::Pro.daily_limit(), 1000);
    }
}
