//! The NMDC line protocol: `$Command param1 param2|` or plain chat text
//! terminated by `|`.

use std::fmt;

/// One NMDC protocol line, split into its command keyword (if any) and
/// trailing parameter text.
///
/// NMDC commands are not as uniformly structured as ADC's: most take a
/// single space-joined parameter blob whose internal format differs per
/// command (`$MyNick` takes a bare nick, `$Search` takes a pipe-delimited
/// search query, and so on) - this type only handles the outer framing;
/// the hub session splits `raw_params` further per command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Line {
    /// A `$Keyword rest-of-line` command.
    Command {
        /// The keyword without its leading `$`.
        keyword: String,
        /// Everything after the keyword and its separating space, with the
        /// trailing `|` already stripped.
        params: String,
    },
    /// Plain chat text (public chat, `<nick> message`), with no `$` prefix.
    Chat(String),
}

impl Line {
    /// Splits a single NMDC line (with its trailing `|` already stripped by
    /// the framing layer) into a [`Line`].
    #[must_use]
    pub fn parse(body: &str) -> Self {
        let Some(rest) = body.strip_prefix('$') else {
            return Self::Chat(body.to_string());
        };
        match rest.split_once(' ') {
            Some((keyword, params)) => Self::Command {
                keyword: keyword.to_string(),
                params: params.to_string(),
            },
            None => Self::Command {
                keyword: rest.to_string(),
                params: String::new(),
            },
        }
    }

    /// The command keyword, if this is a `$`-prefixed line.
    #[must_use]
    pub fn keyword(&self) -> Option<&str> {
        match self {
            Self::Command { keyword, .. } => Some(keyword),
            Self::Chat(_) => None,
        }
    }

    /// Splits a command's parameter blob on a single space, the common case
    /// for two-field commands like `$Search Hub:TTH:...`.
    #[must_use]
    pub fn split_params(&self, separator: char) -> Vec<&str> {
        match self {
            Self::Command { params, .. } => params.split(separator).collect(),
            Self::Chat(_) => Vec::new(),
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command { keyword, params } if params.is_empty() => write!(f, "${keyword}"),
            Self::Command { keyword, params } => write!(f, "${keyword} {params}"),
            Self::Chat(text) => f.write_str(text),
        }
    }
}

/// Builds a `$Keyword param1 param2|` command line ready to write to the
/// wire, joining parameters with a space and appending the frame
/// terminator.
#[must_use]
pub fn build(keyword: &str, params: &[&str]) -> String {
    if params.is_empty() {
        format!("${keyword}|")
    } else {
        format!("${keyword} {}|", params.join(" "))
    }
}
