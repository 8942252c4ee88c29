use crate::dbc::core::strings;
use crate::types::errors::ParseErrorKind;

/// Decode a `VERSION` line.
/// Example: `VERSION "1.0"`
pub(crate) fn decode(line: &str) -> Result<String, ParseErrorKind> {
    let rest: &str = line
        .trim()
        .strip_prefix("VERSION")
        .ok_or_else(|| ParseErrorKind::Expected {
            expected: "VERSION",
            found: strings::first_token(line).to_string(),
        })?;
    let (version, rest) = strings::take_quoted(rest, "quoted version")?;
    strings::expect_end(rest)?;
    Ok(version)
}
