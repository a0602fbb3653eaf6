//! Partial-file (PSR) and partial-bundle (PBD) exchange decoding (§4.5.7).

/// Decodes a PSR's `PI` block-index list into `(start, end)` byte pairs,
/// given the leaf block size and the file size to clamp the final pair's
/// end against.
///
/// Per §8's boundary behavior, a PSR whose `partial_info.len() !=
/// 2*PC` is discarded outright rather than partially interpreted.
#[must_use]
pub fn decode_partial_info(block_indices: &[u16], pair_count: usize, block_size: i64, file_size: i64) -> Option<Vec<(i64, i64)>> {
    if block_indices.len() != 2 * pair_count {
        return None;
    }
    Some(
        block_indices
            .chunks_exact(2)
            .map(|pair| {
                let start = i64::from(pair[0]) * block_size;
                let end = (i64::from(pair[1]) * block_size).min(file_size);
                (start, end)
            })
            .collect(),
    )
}

/// What a received PBD command asks the engine to do (§4.5.7, §6.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PbdAction {
    /// `UP1`: the peer finished downloading this bundle; notify our own
    /// sources of the same bundle in turn.
    Notify,
    /// `RE1`: the peer is requesting a TTH list for our copy of the
    /// bundle.
    RequestList,
    /// `AD1`: add the peer's remote partial TTH list (they have more of
    /// the bundle than previously known).
    AddList,
    /// `NO1`: notify-only, no reply expected.
    NotifyOnly,
    /// `RM1`: remove a previously pending notification for this peer.
    RemovePending,
}

impl PbdAction {
    /// Parses the PBD flag token (the wire carries exactly one of these
    /// per command).
    #[must_use]
    pub fn from_wire_flag(flag: &str) -> Option<Self> {
        Some(match flag {
            "UP1" => Self::Notify,
            "RE1" => Self::RequestList,
            "AD1" => Self::AddList,
            "NO1" => Self::NotifyOnly,
            "RM1" => Self::RemovePending,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_pair_count_is_discarded() {
        assert_eq!(decode_partial_info(&[0, 10, 20], 2, 1024, 1_000_000), None);
    }

    #[test]
    fn matching_pair_count_decodes_byte_ranges() {
        let decoded = decode_partial_info(&[0, 10, 20, 30], 2, 1024, 1_000_000).unwrap();
        assert_eq!(decoded, vec![(0, 10 * 1024), (20 * 1024, 30 * 1024)]);
    }

    #[test]
    fn end_is_clamped_to_file_size() {
        let decoded = decode_partial_info(&[0, 10_000], 1, 1024, 5000).unwrap();
        assert_eq!(decoded, vec![(0, 5000)]);
    }

    #[test]
    fn every_wire_flag_parses() {
        assert_eq!(PbdAction::from_wire_flag("UP1"), Some(PbdAction::Notify));
        assert_eq!(PbdAction::from_wire_flag("RE1"), Some(PbdAction::RequestList));
        assert_eq!(PbdAction::from_wire_flag("AD1"), Some(PbdAction::AddList));
        assert_eq!(PbdAction::from_wire_flag("NO1"), Some(PbdAction::NotifyOnly));
        assert_eq!(PbdAction::from_wire_flag("RM1"), Some(PbdAction::RemovePending));
        assert_eq!(PbdAction::from_wire_flag("XX9"), None);
    }
}
