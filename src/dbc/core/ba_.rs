//! Message timing attributes.
//!
//! Only the two message attributes the model carries are decoded:
//! - `BA_DEF_ BO_ "GenMsgCycleTime" INT <min> <max>;`
//! - `BA_DEF_ BO_ "GenMsgSendType" ENUM "Cyclic","Event",...;`
//! - `BA_ "GenMsgCycleTime" BO_ <id> <ms>;`
//! - `BA_ "GenMsgSendType" BO_ <id> <index>;`
//!
//! Every other attribute is reported as not handled so the caller can skip it.

use crate::dbc::core::strings;
use crate::types::{database::Database, errors::ParseErrorKind, message::Message};

pub(crate) const CYCLE_TIME: &str = "GenMsgCycleTime";
pub(crate) const SEND_TYPE: &str = "GenMsgSendType";

/// Send types declared by default, in enum order. `Cyclic` is the default value.
pub(crate) const SEND_TYPES: &[&str] = &["Cyclic", "Event", "IfActive", "CE", "CA", "NoMsgSendType"];

/// Attribute definitions seen so far in the file being decoded.
#[derive(Default, Debug)]
pub(crate) struct AttributeDefs {
    /// Enum labels of `GenMsgSendType`, when it is declared as an `ENUM`.
    send_types: Option<Vec<String>>,
}

/// `BA_DEF_ ...`. Returns `false` for attributes the model does not carry.
pub(crate) fn decode_definition(
    defs: &mut AttributeDefs,
    line: &str,
) -> Result<bool, ParseErrorKind> {
    let rest: &str = line
        .trim()
        .strip_prefix("BA_DEF_")
        .ok_or_else(|| ParseErrorKind::Expected {
            expected: "BA_DEF_",
            found: strings::first_token(line).to_string(),
        })?;

    // Network attributes have no object type and start with the quoted name.
    let (object, rest) = strings::split_token(rest);
    if object != "BO_" {
        return Ok(false);
    }
    let (name, rest) = strings::take_quoted(rest, "attribute name")?;
    match name.as_str() {
        CYCLE_TIME => Ok(true),
        SEND_TYPE => {
            let (kind, rest) = strings::split_token(rest);
            defs.send_types = match kind {
                "ENUM" => Some(parse_enum_labels(rest)?),
                _ => None,
            };
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// `BA_ "<name>" BO_ <id> <value>;`. Returns `false` for attributes the model
/// does not carry.
pub(crate) fn decode_value(
    db: &mut Database,
    defs: &AttributeDefs,
    line: &str,
) -> Result<bool, ParseErrorKind> {
    let rest: &str = line
        .trim()
        .strip_prefix("BA_")
        .ok_or_else(|| ParseErrorKind::Expected {
            expected: "BA_",
            found: strings::first_token(line).to_string(),
        })?;

    let (name, rest) = strings::take_quoted(rest, "attribute name")?;
    if name != CYCLE_TIME && name != SEND_TYPE {
        return Ok(false);
    }
    let (object, rest) = strings::split_token(rest);
    if object != "BO_" {
        return Ok(false);
    }
    let (id_str, rest) = strings::split_token(rest);
    let id: u32 = strings::parse_number(id_str, "message ID")?;

    let message: &mut Message = db
        .get_message_by_id_mut(id)
        .ok_or(ParseErrorKind::UnknownMessageId(id))?;

    if name == CYCLE_TIME {
        let value: &str = rest.trim().trim_end_matches(';');
        message.cycle_time = Some(strings::parse_number(value, "cycle time")?);
        return Ok(true);
    }

    // Enum values are written as an index; string-typed definitions quote the label.
    let label: String = if rest.trim_start().starts_with('"') {
        let (label, rest) = strings::take_quoted(rest, "send type")?;
        strings::expect_end(rest)?;
        label
    } else {
        let value: &str = rest.trim().trim_end_matches(';');
        let index: usize = strings::parse_number(value, "send type index")?;
        defs.send_types
            .as_ref()
            .and_then(|labels| labels.get(index))
            .cloned()
            .ok_or_else(|| ParseErrorKind::InvalidNumber {
                field: "send type index",
                value: value.trim().to_string(),
            })?
    };
    message.send_type = Some(label);
    Ok(true)
}

/// `"A","B","C";` into its labels.
fn parse_enum_labels(mut rest: &str) -> Result<Vec<String>, ParseErrorKind> {
    let mut labels: Vec<String> = Vec::new();
    loop {
        let (label, after) = strings::take_quoted(rest, "enum label")?;
        labels.push(label);
        let after: &str = after.trim_start();
        match after.strip_prefix(',') {
            Some(next) => rest = next,
            None => {
                strings::expect_end(after)?;
                return Ok(labels);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_test_db() -> Database {
        let mut db: Database = Database::default();
        db.add_node("ECU1").unwrap();
        db.add_message(Message::new(291, "EngineData", 8, "ECU1"))
            .unwrap();
        db
    }

    #[test]
    fn test_definitions() {
        let mut defs = AttributeDefs::default();
        assert_eq!(
            decode_definition(&mut defs, r#"BA_DEF_ BO_  "GenMsgCycleTime" INT 0 65535;"#),
            Ok(true)
        );
        assert_eq!(
            decode_definition(
                &mut defs,
                r#"BA_DEF_ BO_  "GenMsgSendType" ENUM  "Cyclic","Event", "IfActive";"#
            ),
            Ok(true)
        );
        assert_eq!(
            defs.send_types,
            Some(vec![
                "Cyclic".to_string(),
                "Event".to_string(),
                "IfActive".to_string()
            ])
        );

        assert_eq!(
            decode_definition(&mut defs, r#"BA_DEF_  "BusType" STRING ;"#),
            Ok(false)
        );
        assert_eq!(
            decode_definition(&mut defs, r#"BA_DEF_ SG_  "GenSigStartValue" INT 0 0;"#),
            Ok(false)
        );
        assert_eq!(
            decode_definition(&mut defs, r#"BA_DEF_ BO_  "GenMsgSendType" ENUM "Cyclic","Event"#),
            Err(ParseErrorKind::UnterminatedString)
        );
    }

    #[test]
    fn test_values() {
        let mut db: Database = build_test_db();
        let mut defs = AttributeDefs::default();
        decode_definition(
            &mut defs,
            r#"BA_DEF_ BO_ "GenMsgSendType" ENUM "Cyclic","Event";"#,
        )
        .unwrap();

        assert_eq!(
            decode_value(&mut db, &defs, r#"BA_ "GenMsgCycleTime" BO_ 291 100;"#),
            Ok(true)
        );
        assert_eq!(
            decode_value(&mut db, &defs, r#"BA_ "GenMsgSendType" BO_ 291 1;"#),
            Ok(true)
        );
        assert_eq!(db.messages[0].cycle_time, Some(100));
        assert_eq!(db.messages[0].send_type.as_deref(), Some("Event"));

        assert_eq!(
            decode_value(&mut db, &defs, r#"BA_ "GenMsgSendType" BO_ 291 "IfActive";"#),
            Ok(true)
        );
        assert_eq!(db.messages[0].send_type.as_deref(), Some("IfActive"));

        assert_eq!(
            decode_value(&mut db, &defs, r#"BA_ "GenMsgDelayTime" BO_ 291 5;"#),
            Ok(false)
        );
        assert_eq!(
            decode_value(&mut db, &defs, r#"BA_ "BusType" "CAN";"#),
            Ok(false)
        );
    }

    #[test]
    fn test_value_errors() {
        let mut db: Database = build_test_db();
        let defs = AttributeDefs::default();
        assert_eq!(
            decode_value(&mut db, &defs, r#"BA_ "GenMsgCycleTime" BO_ 999 100;"#),
            Err(ParseErrorKind::UnknownMessageId(999))
        );
        assert_eq!(
            decode_value(&mut db, &defs, r#"BA_ "GenMsgCycleTime" BO_ 291 -5;"#),
            Err(ParseErrorKind::InvalidNumber {
                field: "cycle time",
                value: "-5".to_string()
            })
        );
        // No ENUM definition to look the index up in.
        assert_eq!(
            decode_value(&mut db, &defs, r#"BA_ "GenMsgSendType" BO_ 291 0;"#),
            Err(ParseErrorKind::InvalidNumber {
                field: "send type index",
                value: "0".to_string()
            })
        );
    }
}
