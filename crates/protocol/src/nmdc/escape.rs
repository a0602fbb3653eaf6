//! NMDC's `&`/`|`/`$` escaping for values embedded inside a `|`-terminated
//! command line.

/// Escapes a raw value for inclusion in an NMDC command line.
///
/// The three characters are escaped in a fixed order - `&` first, then `|`
/// and `$` - so that escaping never re-escapes the `&` introduced by an
/// earlier substitution.
#[must_use]
pub fn escape(value: &str) -> String {
    value.replace('&', "&amp;").replace('|', "&#124;").replace('$', "&#36;")
}

/// Reverses [`escape`], restoring `&`, `|`, and `$` from their entity forms.
#[must_use]
pub fn unescape(value: &str) -> String {
    value.replace("&#36;", "$").replace("&#124;", "|").replace("&amp;", "&")
}
