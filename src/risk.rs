//! Risk level: the totally ordered severity scale the validator aggregates
//! over.

use serde::{Deserialize, Serialize};

/// Severity of a single violation, or the aggregate severity of a
/// [`crate::violation::ValidationResult`].
///
/// Ordered from least to most severe so that `a.max(b)` (via `Ord`) produces
/// the correct aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[default]
    Safe,
    Low,
    Medium,
    High,
    Critical
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => write!(f, "SAFE"),
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL")
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SAFE" => Ok(Self::Safe),
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(format!("unrecognized risk level '{other}'"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_matches_spec_scale() {
        assert!(RiskLevel::Safe < RiskLevel::Low);
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn max_picks_the_more_severe_level() {
        assert_eq!(RiskLevel::Low.max(RiskLevel::Critical), RiskLevel::Critical);
        assert_eq!(RiskLevel::Safe.max(RiskLevel::Safe), RiskLevel::Safe);
    }

    #[test]
    fn round_trips_through_display_and_from_str() {
        for level in [
            RiskLevel::Safe,
            RiskLevel::Low,
            RiskLevel::Medium,
            RiskLevel::High,
            RiskLevel::Critical
        ] {
            let rendered = level.to_string();
            assert_eq!(rendered.parse::<RiskLevel>().unwrap(), level);
        }
    }

    #[test]
    fn from_str_rejects_unknown_values() {
        assert!("unknown".parse::<RiskLevel>().is_err());
    }
}
