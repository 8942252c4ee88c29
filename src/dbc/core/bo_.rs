use crate::dbc::core::strings;
use crate::types::{database::Database, errors::ParseErrorKind, message::Message};

/// Decode a `BO_` line using `:` as separator between name and length,
/// register the message and return its name.
/// Accepts both: `BO_ 123 NAME: 8 Node` and `BO_ 123 NAME : 8 Node`.
pub(crate) fn decode(db: &mut Database, line: &str) -> Result<String, ParseErrorKind> {
    let after: &str = line
        .trim()
        .strip_prefix("BO_")
        .ok_or_else(|| ParseErrorKind::Expected {
            expected: "BO_",
            found: strings::first_token(line).to_string(),
        })?;

    // 1) ID (first token)
    let (id_str, rest) = strings::split_token(after);
    let id: u32 = strings::parse_number(id_str, "message ID")?;

    // 2) NAME (everything up to the first ':')
    let Some((name, rest)) = rest.split_once(':') else {
        return Err(ParseErrorKind::Expected {
            expected: "':' after the message name",
            found: rest.trim().to_string(),
        });
    };
    let name: &str = name.trim();
    if name.is_empty() {
        return Err(ParseErrorKind::Missing("message name"));
    }

    // 3) After ':' → <len> <sender>
    let (size_str, rest) = strings::split_token(rest);
    let size: u8 = strings::parse_number(size_str, "message size")?;
    let (sender, rest) = strings::split_token(rest);
    if sender.is_empty() {
        return Err(ParseErrorKind::Missing("message sender"));
    }
    strings::expect_end(rest)?;

    if !db.has_node(sender) {
        return Err(ParseErrorKind::UnknownNode(sender.to_string()));
    }
    db.add_message(Message::new(id, name, size, sender))?;
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::errors::ModelError;

    fn db_with_nodes() -> Database {
        let mut db: Database = Database::default();
        db.add_node("ECU1").unwrap();
        db.add_node("Motor").unwrap();
        db
    }

    #[test]
    fn test_decode() {
        let mut db: Database = db_with_nodes();
        assert_eq!(
            decode(&mut db, "BO_ 291 EngineData: 8 ECU1"),
            Ok("EngineData".to_string())
        );
        assert_eq!(
            decode(&mut db, "BO_   2527679645 Motor_01 :  8   Motor"),
            Ok("Motor_01".to_string())
        );

        let msg = &db.messages[0];
        assert_eq!(msg.id, 291);
        assert_eq!(msg.name, "EngineData");
        assert_eq!(msg.size, 8);
        assert_eq!(msg.sender, "ECU1");
        assert_eq!(db.messages[1].id, 2527679645);
    }

    #[test]
    fn test_decode_errors() {
        let mut db: Database = db_with_nodes();
        assert_eq!(
            decode(&mut db, "BO_ 0x123 EngineData: 8 ECU1"),
            Err(ParseErrorKind::InvalidNumber {
                field: "message ID",
                value: "0x123".to_string()
            })
        );
        assert_eq!(
            decode(&mut db, "BO_ 291 EngineData 8 ECU1"),
            Err(ParseErrorKind::Expected {
                expected: "':' after the message name",
                found: "EngineData 8 ECU1".to_string()
            })
        );
        assert_eq!(
            decode(&mut db, "BO_ 291 EngineData: 8"),
            Err(ParseErrorKind::Missing("message sender"))
        );
        assert_eq!(
            decode(&mut db, "BO_ 291 EngineData: 8 Gateway"),
            Err(ParseErrorKind::UnknownNode("Gateway".to_string()))
        );
        assert_eq!(
            decode(&mut db, "BO_ 291 EngineData: 8 ECU1 extra"),
            Err(ParseErrorKind::TrailingContent("extra".to_string()))
        );
    }

    #[test]
    fn test_decode_rejects_duplicate_message() {
        let mut db: Database = db_with_nodes();
        decode(&mut db, "BO_ 291 EngineData: 8 ECU1").unwrap();
        assert_eq!(
            decode(&mut db, "BO_ 292 EngineData: 8 ECU1"),
            Err(ParseErrorKind::Model(ModelError::MessageAlreadyExists {
                name: "EngineData".to_string()
            }))
        );
    }
}
