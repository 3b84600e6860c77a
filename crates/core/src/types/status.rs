//! Enumerated lead attributes.
//!
//! Both enums have a strict `FromStr` (for typed input such as CLI flags) and
//! a lenient `coerce` used at data boundaries: lead data coming from CSV files
//! or the remote store is untrusted, and an unknown value there is normalized
//! to the default instead of failing the record.

use serde::{Deserialize, Serialize};

/// Qualification status of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LeadStatus {
    #[default]
    Pending,
    Qualified,
    Unreachable,
}

impl LeadStatus {
    /// All statuses, in display order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Qualified, Self::Unreachable];

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Qualified => "Qualified",
            Self::Unreachable => "Unreachable",
        }
    }

    /// Parse leniently, falling back to [`LeadStatus::Pending`].
    #[must_use]
    pub fn coerce(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "qualified" => Ok(Self::Qualified),
            "unreachable" => Ok(Self::Unreachable),
            _ => Err(format!("invalid lead status: {s}")),
        }
    }
}

/// How interested a lead is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Interest {
    High,
    #[default]
    Medium,
    Low,
}

impl Interest {
    /// All interest levels, in display order.
    pub const ALL: [Self; 3] = [Self::High, Self::Medium, Self::Low];

    /// Wire name of the interest level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Parse leniently, falling back to [`Interest::Medium`].
    #[must_use]
    pub fn coerce(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl std::fmt::Display for Interest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Interest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(format!("invalid interest: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(LeadStatus::default(), LeadStatus::Pending);
        assert_eq!(Interest::default(), Interest::Medium);
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!(" qualified ".parse::<LeadStatus>().unwrap(), LeadStatus::Qualified);
        assert_eq!("HIGH".parse::<Interest>().unwrap(), Interest::High);
        assert!("maybe".parse::<LeadStatus>().is_err());
    }

    #[test]
    fn test_coerce_unknown_values_to_default() {
        assert_eq!(LeadStatus::coerce("Hot"), LeadStatus::Pending);
        assert_eq!(LeadStatus::coerce(""), LeadStatus::Pending);
        assert_eq!(Interest::coerce("very high"), Interest::Medium);
        assert_eq!(Interest::coerce("low"), Interest::Low);
    }

    #[test]
    fn test_serde_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&LeadStatus::Unreachable).unwrap(),
            "\"Unreachable\""
        );
        assert_eq!(serde_json::to_string(&Interest::Low).unwrap(), "\"Low\"");
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for status in LeadStatus::ALL {
            assert_eq!(status.to_string().parse::<LeadStatus>().unwrap(), status);
        }
        for interest in Interest::ALL {
            assert_eq!(interest.to_string().parse::<Interest>().unwrap(), interest);
        }
    }
}
