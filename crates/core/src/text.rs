//! ADC parameter escaping (§4.1: `\s` -> space, `\n` -> newline, `\\` -> backslash).
//!
//! Lives in `core` rather than `protocol` because `identity`'s synthetic
//! NMDC CID derivation and `persistence`'s XML attribute writer both need the
//! same backslash-escaping primitive without depending on the whole codec.

/// Escapes a raw parameter value for inclusion in an ADC command line.
#[must_use]
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            ' ' => out.push_str("\\s"),
            '\n' => out.push_str("\\n"),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out
}

/// Reverses [`escape`]. Unknown escape sequences (a lone backslash at end of
/// input, or `\x` for any `x` other than `s`/`n`/`\\`) pass the backslash and
/// following character through unchanged rather than erroring, matching the
/// reference client's tolerant parser.
#[must_use]
pub fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_reserved_characters() {
        let original = "hello world\\with\nnewline";
        let escaped = escape(original);
        assert_eq!(escaped, "hello\\sworld\\\\with\\nnewline");
        assert_eq!(unescape(&escaped), original);
    }

    #[test]
    fn unescape_tolerates_unknown_sequences() {
        assert_eq!(unescape("a\\xb"), "a\\xb");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }
}
