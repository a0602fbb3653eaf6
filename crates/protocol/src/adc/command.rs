//! The ADC command line: `<type><FourCC>[ <addressing>][ <params>]`.

use super::escape::{escape, unescape};
use super::fourcc::FourCc;
use std::fmt;

/// The addressing character that starts every ADC command line, selecting
/// how the command is routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandType {
    /// `B` - broadcast from a client to every other client in the hub.
    Broadcast,
    /// `C` - client to hub.
    Client,
    /// `D` - direct, client to client routed through the hub.
    Direct,
    /// `E` - direct, echoed back to the sender as well as the target.
    Echo,
    /// `F` - broadcast restricted to clients advertising a given feature.
    Feature,
    /// `H` - hub to client, unrouted.
    Hub,
    /// `I` - hub to client, informational (no source SID).
    Info,
    /// `U` - addressed by CID over UDP (search results).
    Udp,
}

impl CommandType {
    /// The single wire character for this addressing mode.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Broadcast => 'B',
            Self::Client => 'C',
            Self::Direct => 'D',
            Self::Echo => 'E',
            Self::Feature => 'F',
            Self::Hub => 'H',
            Self::Info => 'I',
            Self::Udp => 'U',
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            'B' => Some(Self::Broadcast),
            'C' => Some(Self::Client),
            'D' => Some(Self::Direct),
            'E' => Some(Self::Echo),
            'F' => Some(Self::Feature),
            'H' => Some(Self::Hub),
            'I' => Some(Self::Info),
            'U' => Some(Self::Udp),
            _ => None,
        }
    }

    /// Whether this addressing mode carries a `from` SID in the header.
    #[must_use]
    pub const fn carries_from(self) -> bool {
        matches!(self, Self::Broadcast | Self::Direct | Self::Echo | Self::Feature)
    }

    /// Whether this addressing mode carries a `to` SID in the header.
    #[must_use]
    pub const fn carries_to(self) -> bool {
        matches!(self, Self::Direct | Self::Echo)
    }
}

/// A parsed ADC command: addressing header, command code, and parameter
/// list.
///
/// `from`/`to` hold raw 4-character SID tokens rather than a typed `Sid` -
/// callers that need a validated identifier (e.g. the hub session and
/// connection manager) parse these through their own SID type, keeping this
/// crate free of a dependency on identity bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    kind: CommandType,
    code: FourCc,
    from: Option<String>,
    to: Option<String>,
    feature_selector: Option<String>,
    params: Vec<String>,
}

impl Command {
    /// Starts building a new command of the given addressing type and code.
    #[must_use]
    pub fn new(kind: CommandType, code: FourCc) -> Self {
        Self {
            kind,
            code,
            from: None,
            to: None,
            feature_selector: None,
            params: Vec::new(),
        }
    }

    /// Sets the `from` SID (required for `B`/`D`/`E`/`F` commands).
    #[must_use]
    pub fn with_from(mut self, sid: impl Into<String>) -> Self {
        self.from = Some(sid.into());
        self
    }

    /// Sets the `to` SID (required for `D`/`E` commands).
    #[must_use]
    pub fn with_to(mut self, sid: impl Into<String>) -> Self {
        self.to = Some(sid.into());
        self
    }

    /// Sets the feature-selector string carried by `F` commands (a sequence
    /// of `+FEAT`/`-FEAT` tokens restricting which clients see it).
    #[must_use]
    pub fn with_feature_selector(mut self, selector: impl Into<String>) -> Self {
        self.feature_selector = Some(selector.into());
        self
    }

    /// Appends an already-joined `NAME+VALUE` parameter (e.g. `NItest`).
    #[must_use]
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Appends a two-letter-code parameter, escaping `value`.
    #[must_use]
    pub fn with_named_param(mut self, name: &str, value: &str) -> Self {
        self.params.push(format!("{name}{}", escape(value)));
        self
    }

    /// The command's addressing type.
    #[must_use]
    pub const fn kind(&self) -> CommandType {
        self.kind
    }

    /// The command's three-letter code.
    #[must_use]
    pub const fn code(&self) -> FourCc {
        self.code
    }

    /// The source SID, if the addressing mode carries one.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    /// The destination SID, if the addressing mode carries one.
    #[must_use]
    pub fn to(&self) -> Option<&str> {
        self.to.as_deref()
    }

    /// The raw parameter list, each entry still in `NAME+VALUE` wire form.
    #[must_use]
    pub fn raw_params(&self) -> &[String] {
        &self.params
    }

    /// Returns the positional parameter at `index`, unescaped.
    #[must_use]
    pub fn param(&self, index: usize) -> Option<String> {
        self.params.get(index).map(|p| unescape(p))
    }

    /// Finds the first parameter whose two-letter code matches `name` and
    /// returns its unescaped value.
    #[must_use]
    pub fn named_param(&self, name: &str) -> Option<String> {
        self.params
            .iter()
            .find(|p| p.len() >= 2 && &p[..2] == name)
            .map(|p| unescape(&p[2..]))
    }

    /// All parameters whose two-letter code matches `name`.
    #[must_use]
    pub fn named_params(&self, name: &str) -> Vec<String> {
        self.params
            .iter()
            .filter(|p| p.len() >= 2 && &p[..2] == name)
            .map(|p| unescape(&p[2..]))
            .collect()
    }

    /// Whether a bare boolean flag (a two-letter code with an empty value,
    /// e.g. `TR` in `PBD`) is present.
    #[must_use]
    pub fn has_flag(&self, name: &str) -> bool {
        self.params.iter().any(|p| p == name)
    }

    /// Serializes the command back into ADC wire form (without trailing
    /// newline).
    #[must_use]
    pub fn to_wire_string(&self) -> String {
        let mut out = String::new();
        out.push(self.kind.as_char());
        out.push_str(&self.code.to_string());
        if let Some(from) = &self.from {
            out.push(' ');
            out.push_str(from);
        }
        if let Some(to) = &self.to {
            out.push(' ');
            out.push_str(to);
        }
        if let Some(selector) = &self.feature_selector {
            out.push(' ');
            out.push_str(selector);
        }
        for param in &self.params {
            out.push(' ');
            out.push_str(param);
        }
        out
    }

    /// Parses a single ADC command line (without its trailing newline).
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the line is empty, the addressing
    /// character or command code is malformed, or a required SID is
    /// missing for the addressing type.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut chars = line.chars();
        let kind_char = chars.next().ok_or(ParseError::Empty)?;
        let kind = CommandType::from_char(kind_char)
            .ok_or(ParseError::UnknownAddressing(kind_char))?;

        let rest = &line[kind_char.len_utf8()..];
        let code_str = rest.get(..3).ok_or(ParseError::TruncatedCode)?;
        let code = FourCc::parse(code_str).ok_or_else(|| ParseError::InvalidCode(code_str.to_string()))?;

        let mut tokens = rest[3..].split(' ').filter(|t| !t.is_empty());

        let from = if kind.carries_from() {
            Some(tokens.next().ok_or(ParseError::MissingSid)?.to_string())
        } else {
            None
        };
        let to = if kind.carries_to() {
            Some(tokens.next().ok_or(ParseError::MissingSid)?.to_string())
        } else {
            None
        };
        let feature_selector = if matches!(kind, CommandType::Feature) {
            Some(tokens.next().unwrap_or_default().to_string())
        } else {
            None
        };

        Ok(Self {
            kind,
            code,
            from,
            to,
            feature_selector,
            params: tokens.map(str::to_string).collect(),
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire_string())
    }
}

/// A command line failed to parse as ADC.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// The line was empty.
    #[error("empty command line")]
    Empty,
    /// The addressing character wasn't one of `BCDEFHIU`.
    #[error("unknown addressing character '{0}'")]
    UnknownAddressing(char),
    /// The line ended before a complete 3-letter command code.
    #[error("command line truncated before a full command code")]
    TruncatedCode,
    /// The command code wasn't three uppercase ASCII letters.
    #[error("invalid command code {0:?}")]
    InvalidCode(String),
    /// The addressing type requires a SID that wasn't present.
    #[error("addressing mode requires a SID that the command line is missing")]
    MissingSid,
}

/// Dispatches parsed commands to per-code handler methods.
///
/// Implementors provide one method per command of interest and fall back to
/// [`CommandHandler::handle_unknown`] for anything else, mirroring the way a
/// hub or C-C session only cares about a handful of codes in any given
/// protocol state.
pub trait CommandHandler {
    /// Parses `line` and routes it to the matching `on_*` method.
    ///
    /// Malformed lines are reported to [`CommandHandler::handle_parse_error`]
    /// rather than propagated, since a single bad line from a peer shouldn't
    /// tear down the session.
    fn dispatch(&mut self, line: &str) {
        match Command::parse(line) {
            Ok(command) => self.handle(command),
            Err(error) => self.handle_parse_error(line, error),
        }
    }

    /// Handles one successfully parsed command.
    fn handle(&mut self, command: Command);

    /// Handles a line that failed to parse. The default logs it at debug
    /// level and drops it, matching the reference client's behavior of
    /// silently ignoring unparseable input rather than disconnecting.
    fn handle_parse_error(&mut self, line: &str, error: ParseError) {
        logging::debug_log(
            |flags| flags.adc == 1,
            || format!("dropping malformed ADC line ({error}): {line:.50}"),
        );
    }
}
