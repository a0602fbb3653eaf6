//! The on-disk shape of one bundle record (§4.5.10, §6.4): plain
//! serialization DTOs, independent of `queue`'s live `Bundle`/`QueueFile`
//! types so this crate stays below `queue` in the dependency graph. The
//! queue engine converts to/from these at the load/save boundary.

use serde::{Deserialize, Serialize};

/// `<Bundle Version=2 Token=… Target=… …>`, one file per bundle
/// (`bundles/<token>.xml`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Bundle")]
pub struct BundleRecord {
    /// The record format version. Always `2` for records this crate
    /// writes; `load_all` still accepts `1` by filling defaults for the
    /// fields that version lacked (none currently - reserved for the next
    /// schema bump).
    #[serde(rename = "@Version")]
    pub version: u32,
    /// The bundle's persistent token.
    #[serde(rename = "@Token")]
    pub token: u32,
    /// The bundle's target directory or file path.
    #[serde(rename = "@Target")]
    pub target: String,
    /// The stored priority (§3.3): one of `PausedForce`, `Paused`,
    /// `Lowest`, `Low`, `Normal`, `High`, `Highest`.
    #[serde(rename = "@Priority")]
    pub priority: String,
    /// Whether the bundle participates in auto-priority rescoring.
    #[serde(rename = "@AutoPriority")]
    pub auto_priority: bool,
    /// The remote mtime the bundle was queued with, if known (Unix ms).
    #[serde(rename = "@Date", skip_serializing_if = "Option::is_none")]
    pub date: Option<i64>,
    /// When the bundle was added to the queue (Unix ms).
    #[serde(rename = "@Added")]
    pub added: i64,
    /// Whether this bundle is a single-file bundle (never merges with
    /// another bundle, §3.3).
    #[serde(rename = "@IsFileBundle")]
    pub is_file_bundle: bool,
    /// The bundle's files.
    #[serde(rename = "Download", default)]
    pub downloads: Vec<DownloadRecord>,
}

/// One `<Download>` entry: a queued file inside a [`BundleRecord`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Download")]
pub struct DownloadRecord {
    /// The file's final on-disk path.
    #[serde(rename = "@Target")]
    pub target: String,
    /// The file's total size in bytes.
    #[serde(rename = "@Size")]
    pub size: u64,
    /// When the file was added to the queue (Unix ms).
    #[serde(rename = "@Added")]
    pub added: i64,
    /// The file's TTH, base32-encoded.
    #[serde(rename = "@TTH")]
    pub tth: String,
    /// The stored priority.
    #[serde(rename = "@Priority")]
    pub priority: String,
    /// The download (temp) path, if different from `target`.
    #[serde(rename = "@TempTarget", skip_serializing_if = "Option::is_none")]
    pub temp_target: Option<String>,
    /// Maximum simultaneous segments for this file.
    #[serde(rename = "@MaxSegments")]
    pub max_segments: u32,
    /// Whether this file participates in auto-priority, if it overrides
    /// the bundle-level setting.
    #[serde(rename = "@AutoPriority", skip_serializing_if = "Option::is_none")]
    pub auto_priority: Option<bool>,
    /// The completed byte ranges.
    #[serde(rename = "Segment", default)]
    pub segments: Vec<SegmentRecord>,
    /// Known sources for this file.
    #[serde(rename = "Source", default)]
    pub sources: Vec<SourceRecord>,
}

/// One completed `[start, start+size)` byte range (§3.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Segment")]
pub struct SegmentRecord {
    /// The byte offset the segment starts at.
    #[serde(rename = "@Start")]
    pub start: i64,
    /// The segment's length in bytes.
    #[serde(rename = "@Size")]
    pub size: i64,
}

/// One known source for a [`DownloadRecord`] (§3.3).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Source")]
pub struct SourceRecord {
    /// The source's CID, base32-encoded.
    #[serde(rename = "@CID")]
    pub cid: String,
    /// The nick the source was last seen under.
    #[serde(rename = "@Nick")]
    pub nick: String,
    /// The hub URL the source was attached on.
    #[serde(rename = "@HubHint")]
    pub hub_hint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BundleRecord {
        BundleRecord {
            version: 2,
            token: 42,
            target: "/downloads/Some.Release/".into(),
            priority: "Normal".into(),
            auto_priority: true,
            date: Some(1_700_000_000_000),
            added: 1_700_000_001_000,
            is_file_bundle: false,
            downloads: vec![DownloadRecord {
                target: "/downloads/Some.Release/file.bin".into(),
                size: 104_857_600,
                added: 1_700_000_001_000,
                tth: "A".repeat(39),
                priority: "Normal".into(),
                temp_target: Some("/downloads/Some.Release/file.bin.dctmp".into()),
                max_segments: 3,
                auto_priority: None,
                segments: vec![SegmentRecord { start: 0, size: 1_048_576 }],
                sources: vec![SourceRecord {
                    cid: "B".repeat(39),
                    nick: "alice".into(),
                    hub_hint: "dchub://hub.example:411".into(),
                }],
            }],
        }
    }

    #[test]
    fn round_trips_through_xml() {
        let record = sample();
        let xml = quick_xml::se::to_string(&record).unwrap();
        let parsed: BundleRecord = quick_xml::de::from_str(&xml).unwrap();
        assert_eq!(parsed, record);
    }
}
