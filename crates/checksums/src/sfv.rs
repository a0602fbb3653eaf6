//! Parsing and verification of `.sfv` checksum files.
//!
//! An SFV file is a plain-text list of `filename crc32hex` lines, used by
//! release groups to let downloaders verify a batch of files without a
//! full TTH (§4.5.6 mentions this as an optional completion check
//! alongside the mandatory tree verification).

use std::fmt;

/// One parsed `filename crc32hex` line from an SFV file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SfvEntry {
    filename: String,
    crc32: u32,
}

impl SfvEntry {
    /// The filename as it appeared in the SFV line, unescaped.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The expected CRC32 checksum.
    #[must_use]
    pub const fn crc32(&self) -> u32 {
        self.crc32
    }

    /// Checks `data`'s CRC32 against this entry's expected value.
    #[must_use]
    pub fn verify(&self, data: &[u8]) -> bool {
        crc32fast::hash(data) == self.crc32
    }
}

/// A line in an `.sfv` file was not a comment and did not parse as
/// `filename crc32hex`.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("malformed SFV line: {line:?}")]
pub struct SfvParseError {
    line: String,
}

impl SfvParseError {
    /// The offending line, unmodified.
    #[must_use]
    pub fn line(&self) -> &str {
        &self.line
    }
}

impl fmt::Display for SfvEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:08x}", self.filename, self.crc32)
    }
}

/// Parses the body of an `.sfv` file into its entries.
///
/// Blank lines and lines starting with `;` (the conventional SFV comment
/// marker) are skipped. Every other non-blank line must end in an
/// 8-character hexadecimal CRC32 separated from the filename by
/// whitespace; filenames containing spaces are supported because the
/// split happens from the right.
///
/// # Errors
///
/// Returns the first [`SfvParseError`] encountered; callers that want a
/// best-effort parse over a possibly-corrupt file should filter the
/// input themselves before calling this.
pub fn parse(contents: &str) -> Result<Vec<SfvEntry>, SfvParseError> {
    contents.lines().filter(|line| !is_skippable(line)).map(parse_line).collect()
}

fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with(';')
}

fn parse_line(line: &str) -> Result<SfvEntry, SfvParseError> {
    let trimmed = line.trim_end();
    let split_at = trimmed
        .rfind(char::is_whitespace)
        .ok_or_else(|| SfvParseError { line: line.to_string() })?;
    let (filename, crc_field) = trimmed.split_at(split_at);
    let crc_field = crc_field.trim_start();

    if filename.is_empty() || crc_field.len() != 8 {
        return Err(SfvParseError { line: line.to_string() });
    }
    let crc32 =
        u32::from_str_radix(crc_field, 16).map_err(|_| SfvParseError { line: line.to_string() })?;

    Ok(SfvEntry {
        filename: filename.to_string(),
        crc32,
    })
}

/// Finds the entry matching `filename`, if any, and checks `data` against
/// it.
///
/// Returns `None` when the SFV listing has no entry for `filename` rather
/// than treating an absent entry as a failure — not every shared file is
/// necessarily covered by a release's SFV listing.
#[must_use]
pub fn verify_named(entries: &[SfvEntry], filename: &str, data: &[u8]) -> Option<bool> {
    entries
        .iter()
        .find(|entry| entry.filename == filename)
        .map(|entry| entry.verify(data))
}
