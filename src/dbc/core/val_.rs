use std::collections::BTreeMap;

use crate::dbc::core::strings;
use crate::types::{database::Database, errors::ParseErrorKind};

/// Parse a VAL_ line that defines a value table for a specific signal:
/// `VAL_ <MessageID> <SignalName> <value> "<desc>" ... ;`
pub(crate) fn decode(db: &mut Database, line: &str) -> Result<(), ParseErrorKind> {
    let (id, signal, table) = parse(line)?;
    let msg = db
        .get_message_by_id_mut(id)
        .ok_or(ParseErrorKind::UnknownMessageId(id))?;
    match msg.get_signal_by_name_mut(&signal) {
        Some(sig) => {
            sig.value_table = table;
            Ok(())
        }
        None => Err(ParseErrorKind::UnknownSignal { id, signal }),
    }
}

pub(crate) fn parse(line: &str) -> Result<(u32, String, BTreeMap<i64, String>), ParseErrorKind> {
    let rest: &str = line
        .trim()
        .strip_prefix("VAL_")
        .ok_or_else(|| ParseErrorKind::Expected {
            expected: "VAL_",
            found: strings::first_token(line).to_string(),
        })?;

    let (id, rest) = strings::split_token(rest);
    let id: u32 = strings::parse_number(id, "message ID")?;
    let (signal, mut rest) = strings::split_token(rest);
    if signal.is_empty() {
        return Err(ParseErrorKind::Missing("signal name"));
    }

    // Collect pairs: numeric value followed by quoted description
    let mut table: BTreeMap<i64, String> = BTreeMap::new();
    loop {
        let trimmed: &str = rest.trim_start();
        if trimmed.is_empty() || trimmed.starts_with(';') {
            strings::expect_end(trimmed)?;
            break;
        }
        let (value, after) = strings::split_token(trimmed);
        let value: i64 = strings::parse_number(value, "value")?;
        let (desc, after) = strings::take_quoted(after, "quoted value description")?;
        if table.insert(value, desc).is_some() {
            return Err(ParseErrorKind::DuplicateValue(value));
        }
        rest = after;
    }
    Ok((id, signal.to_string(), table))
}
