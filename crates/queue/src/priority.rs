//! Queue priority levels (§3.3) shared by [`crate::file::QueueFile`] and
//! [`crate::bundle::Bundle`].

/// A file or bundle's queue priority.
///
/// Ordered low to high so `Priority::Normal < Priority::High` holds; the
/// derived [`Ord`] backs the per-priority rotation in
/// [`crate::user_queue::UserQueue`] and the step function in
/// [`crate::autoprio::progress_priority`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Paused and excluded from auto-priority entirely (§9 Open Question
    /// 1): a forced pause means "don't touch this."
    PausedForce,
    /// Paused, but still eligible for auto-priority re-scoring once
    /// resumed.
    Paused,
    Lowest,
    Low,
    Normal,
    High,
    Highest,
}

impl Priority {
    /// Whether this priority means the file/bundle should not be assigned
    /// any connection right now.
    #[must_use]
    pub const fn is_paused(self) -> bool {
        matches!(self, Self::PausedForce | Self::Paused)
    }

    /// The stored-record string used by [`persistence::BundleRecord`]/
    /// [`persistence::DownloadRecord`] (§4.5.10).
    #[must_use]
    pub const fn as_record_str(self) -> &'static str {
        match self {
            Self::PausedForce => "PausedForce",
            Self::Paused => "Paused",
            Self::Lowest => "Lowest",
            Self::Low => "Low",
            Self::Normal => "Normal",
            Self::High => "High",
            Self::Highest => "Highest",
        }
    }

    /// Parses a stored-record priority string.
    #[must_use]
    pub fn from_record_str(value: &str) -> Option<Self> {
        Some(match value {
            "PausedForce" => Self::PausedForce,
            "Paused" => Self::Paused,
            "Lowest" => Self::Lowest,
            "Low" => Self::Low,
            "Normal" => Self::Normal,
            "High" => Self::High,
            "Highest" => Self::Highest,
            _ => return None,
        })
    }

    /// Every priority level that participates in active transfer, in
    /// scan order from highest to lowest (§4.5.4 step 1: "scans that
    /// user's queue from highest to lowest priority").
    #[must_use]
    pub const fn active_levels_high_to_low() -> [Self; 5] {
        [Self::Highest, Self::High, Self::Normal, Self::Low, Self::Lowest]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_runs_paused_force_lowest_to_highest_highest() {
        assert!(Priority::PausedForce < Priority::Paused);
        assert!(Priority::Paused < Priority::Lowest);
        assert!(Priority::Lowest < Priority::Normal);
        assert!(Priority::Normal < Priority::Highest);
    }

    #[test]
    fn record_string_round_trips() {
        for priority in [
            Priority::PausedForce,
            Priority::Paused,
            Priority::Lowest,
            Priority::Low,
            Priority::Normal,
            Priority::High,
            Priority::Highest,
        ] {
            let encoded = priority.as_record_str();
            assert_eq!(Priority::from_record_str(encoded), Some(priority));
        }
    }

    #[test]
    fn unknown_record_string_is_rejected() {
        assert_eq!(Priority::from_record_str("Bogus"), None);
    }

    #[test]
    fn only_paused_variants_report_is_paused() {
        assert!(Priority::Paused.is_paused());
        assert!(Priority::PausedForce.is_paused());
        assert!(!Priority::Normal.is_paused());
    }
}
