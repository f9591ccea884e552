/// Similarity priority levels and their thresholds.
///
/// Scores are bucketed into non-overlapping, half-open ranges:
///
/// | Level         | Range      |
/// |---------------|------------|
/// | High          | `[95,100]` |
/// | Medium        | `[85,95)`  |
/// | Low           | `[50,85)`  |
/// | Non-priority  | `[0,50)`   |
use serde::Serialize;

pub const HIGH_THRESHOLD: u32 = 95;
pub const MEDIUM_THRESHOLD: u32 = 85;
pub const LOW_THRESHOLD: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    High,
    Medium,
    Low,
    NonPriority,
}

impl Priority {
    pub fn from_score(score: u32) -> Self {
        if score >= HIGH_THRESHOLD {
            Self::High
        } else if score >= MEDIUM_THRESHOLD {
            Self::Medium
        } else if score >= LOW_THRESHOLD {
            Self::Low
        } else {
            Self::NonPriority
        }
    }

    /// Short badge text.
    pub fn level(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::NonPriority => "NONE",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High Similarity",
            Self::Medium => "Medium Similarity",
            Self::Low => "Low Similarity",
            Self::NonPriority => "Non-Priority",
        }
    }

    pub fn range(self) -> &'static str {
        match self {
            Self::High => "≥95%",
            Self::Medium => "85–94%",
            Self::Low => "<85%",
            Self::NonPriority => "<50%",
        }
    }

    /// Hex colour used by both the terminal legend and the web dashboard.
    pub fn color(self) -> &'static str {
        match self {
            Self::High => "#ef4444",
            Self::Medium => "#f97316",
            Self::Low => "#eab308",
            Self::NonPriority => "#6b7280",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.level())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_half_open() {
        assert_eq!(Priority::from_score(100), Priority::High);
        assert_eq!(Priority::from_score(95), Priority::High);
        assert_eq!(Priority::from_score(94), Priority::Medium);
        assert_eq!(Priority::from_score(85), Priority::Medium);
        assert_eq!(Priority::from_score(84), Priority::Low);
        assert_eq!(Priority::from_score(50), Priority::Low);
        assert_eq!(Priority::from_score(49), Priority::NonPriority);
        assert_eq!(Priority::from_score(0), Priority::NonPriority);
    }

    #[test]
    fn display_uses_badge_level() {
        assert_eq!(Priority::Medium.to_string(), "MEDIUM");
    }
}
