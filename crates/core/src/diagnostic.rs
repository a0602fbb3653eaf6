use std::fmt;

/// Where a [`Message`] was constructed, captured via [`crate::dc_error!`] /
/// [`crate::dc_warning!`] so a hook rejection can be traced back to the
/// subscriber that raised it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceLocation {
    file: &'static str,
    line: u32,
}

impl SourceLocation {
    /// Builds a [`SourceLocation`] from the parts captured by `file!()`/`line!()`.
    #[must_use]
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }

    /// The source file the message originated from.
    #[must_use]
    pub const fn file(&self) -> &'static str {
        self.file
    }

    /// The line the message originated from.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Severity of a [`Message`], mirrored onto ADC's `STA` severity codes
/// (`SEV_SUCCESS`, `SEV_RECOVERABLE`, `SEV_FATAL`) where a message crosses
/// the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Informational; does not affect control flow.
    Info,
    /// Recoverable — the caller may retry or ignore.
    Warning,
    /// Fatal to the operation that produced it.
    Error,
}

/// A structured diagnostic, the common currency crossing every component
/// boundary in §7 of the spec: hook rejections, transient network failures,
/// and permanent protocol errors are all rendered through this type before
/// reaching a listener or a caller.
#[derive(Clone, Debug)]
pub struct Message {
    severity: Severity,
    text: String,
    source: Option<SourceLocation>,
}

impl Message {
    /// Builds an informational message.
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
            source: None,
        }
    }

    /// Builds a warning message.
    #[must_use]
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            text: text.into(),
            source: None,
        }
    }

    /// Builds an error message.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
            source: None,
        }
    }

    /// Attaches the call-site source location.
    #[must_use]
    pub fn with_source(mut self, source: SourceLocation) -> Self {
        self.source = Some(source);
        self
    }

    /// The message severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// The message body, without severity or source-location decoration.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The source location the message was constructed at, if any.
    #[must_use]
    pub const fn source(&self) -> Option<SourceLocation> {
        self.source
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{label}: {}", self.text)?;
        if let Some(source) = self.source {
            write!(f, " ({source})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Message {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_severity_and_source() {
        let message =
            Message::error("bad state").with_source(SourceLocation::new("hub/src/adc.rs", 42));
        let rendered = message.to_string();
        assert!(rendered.starts_with("error: bad state"));
        assert!(rendered.contains("hub/src/adc.rs:42"));
    }

    #[test]
    fn text_and_severity_accessors() {
        let message = Message::warning("slow source");
        assert_eq!(message.severity(), Severity::Warning);
        assert_eq!(message.text(), "slow source");
        assert!(message.source().is_none());
    }
}
