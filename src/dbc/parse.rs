use crate::dbc::core;
use crate::types::{
    database::Database,
    errors::{LoadError, ModelError, ParseError, ParseErrorKind},
};

use std::fs::File;
use std::io::{BufReader, Read};

use encoding_rs::{UTF_8, WINDOWS_1252};

/// Sections of the DBC format that this model does not carry.
/// They are recognised and skipped so that files written by other tools load.
/// `BA_DEF_` and `BA_` statements are skipped too, unless they carry message timing.
const SKIPPED_SECTIONS: &[&str] = &[
    "BA_DEF_DEF_",
    "BA_DEF_REL_",
    "BA_DEF_DEF_REL_",
    "BA_REL_",
    "BO_TX_BU_",
    "BU_SG_REL_",
    "BU_EV_REL_",
    "BU_BO_REL_",
    "CAT_DEF_",
    "CAT_",
    "EV_",
    "ENVVAR_DATA_",
    "FILTER",
    "SGTYPE_",
    "SGTYPE_VAL_",
    "SIG_GROUP_",
    "SIG_TYPE_REF_",
    "SIG_VALTYPE_",
    "SIGTYPE_VALTYPE_",
    "VAL_TABLE_",
];

/// Parses DBC text and returns a populated [`Database`].
///
/// The text is read line by line and dispatched on the first token:
/// - **Version** (from `VERSION` line)
/// - **Nodes** (from `BU_` lines, single-line or one per line)
/// - **Messages** (from `BO_` lines)
/// - **Signals** (from `SG_` lines, attached to the last `BO_`)
/// - **Comments** for the database, nodes, messages and signals (from `CM_` lines)
/// - **Value tables** (from `VAL_` lines)
/// - **Message timing** (from the `GenMsgCycleTime` and `GenMsgSendType`
///   attributes; their `BA_DEF_DEF_` defaults are not applied to messages)
///
/// Multi-line comments are joined before parsing. `NS_` keyword blocks, `BS_`,
/// other attributes, signal-type and relation sections are accepted and ignored.
///
/// # Errors
/// Returns a [`ParseError`] carrying the 1-based line number of the offending
/// statement (the first line, for statements spanning several lines) and the
/// reason. Any line that is not a known statement is rejected. A violation
/// only found by the final whole-database check is reported at the `BO_` line
/// of the message involved.
///
/// # Example
/// ```
/// let text = "VERSION \"1.0\"\n\nNS_ :\nBU_ ECU1\n\nBO_ 291 EngineData: 8 ECU1\n";
/// let db = dbc_tools::decode(text).unwrap();
/// assert_eq!(db.messages[0].name, "EngineData");
///
/// let err = dbc_tools::decode("VERSION \"1.0\"\nBO_ 291 EngineData: 8 Gateway\n").unwrap_err();
/// assert_eq!(err.line, 2);
/// ```
pub fn decode(text: &str) -> Result<Database, ParseError> {
    let text: &str = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut db: Database = Database::default();
    let mut version_seen: bool = false;
    let mut in_ns_block: bool = false;
    // Name of the message the following SG_ lines belong to.
    let mut current_message: Option<String> = None;
    let mut attribute_defs = core::ba_::AttributeDefs::default();
    // `BO_` line of every message, for errors raised after the loop.
    let mut message_lines: Vec<(String, usize)> = Vec::new();
    let mut skipped: usize = 0;
    let mut last_line: usize = 0;

    let mut lines = text.lines().enumerate();
    while let Some((index, line)) = lines.next() {
        let line_no: usize = index + 1;
        last_line = line_no;
        let line: &str = line.trim();

        // skip comments and empty lines
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        let err = |kind: ParseErrorKind| ParseError::new(line_no, kind);
        let first: &str = core::strings::first_token(line);

        // Keyword list following `NS_ :`, one keyword per line.
        if in_ns_block {
            let single_token: bool = first.len() == line.len();
            if single_token && !matches!(first, "BS_:" | "BS_" | "BU_:" | "BU_") {
                continue;
            }
            in_ns_block = false;
        }

        if first != "SG_" {
            current_message = None;
        }

        match first {
            "VERSION" => {
                if version_seen {
                    return Err(err(ParseErrorKind::DuplicateVersion));
                }
                db.version = core::version::decode(line).map_err(err)?;
                version_seen = true;
            }
            "NS_" | "NS_:" => {
                in_ns_block = true;
            }
            "BS_" | "BS_:" => {
                log::debug!("line {line_no}: skipping bit timing section");
            }
            // Some DBCs use "BU_:" while others use "BU_". Accept both.
            "BU_" | "BU_:" => {
                core::bu_::decode(&mut db, line).map_err(err)?;
            }
            "BO_" => {
                let name: String = core::bo_::decode(&mut db, line).map_err(err)?;
                message_lines.push((name.clone(), line_no));
                current_message = Some(name);
            }
            "SG_" => {
                let Some(message) = current_message.as_deref() else {
                    return Err(err(ParseErrorKind::SignalOutsideMessage));
                };
                core::sg_::decode(&mut db, message, line).map_err(err)?;
            }
            "CM_" => {
                // Accumulate multiline until the comment has two unescaped quotes
                let mut full: String = line.to_string();
                while !core::strings::has_complete_quoted_segment(&full) {
                    let Some((_, next)) = lines.next() else {
                        break;
                    };
                    full.push('\n');
                    full.push_str(next.trim());
                }
                core::cm_::decode(&mut db, &full).map_err(err)?;
            }
            "VAL_" => {
                core::val_::decode(&mut db, line).map_err(err)?;
            }
            "BA_DEF_" | "BA_" => {
                let full: String = join_open_quotes(line, &mut lines);
                let handled: bool = if first == "BA_DEF_" {
                    core::ba_::decode_definition(&mut attribute_defs, &full)
                } else {
                    core::ba_::decode_value(&mut db, &attribute_defs, &full)
                }
                .map_err(err)?;
                if !handled {
                    log::debug!("line {line_no}: skipping unsupported attribute");
                    skipped += 1;
                }
            }
            section if SKIPPED_SECTIONS.contains(&section) => {
                join_open_quotes(line, &mut lines);
                log::debug!("line {line_no}: skipping unsupported section {section}");
                skipped += 1;
            }
            _ => {
                return Err(err(ParseErrorKind::UnexpectedLine(line.to_string())));
            }
        }
    }

    db.validate()
        .map_err(|e| ParseError::new(validation_line(&e, &message_lines, last_line), e))?;

    log::debug!(
        "decoded DBC: {} nodes, {} messages, {} signals, {} skipped statements",
        db.nodes.len(),
        db.messages.len(),
        db.iter_signals().count(),
        skipped
    );
    Ok(db)
}

/// Appends following lines while `line` has an unclosed quoted string.
/// Attribute values may carry quoted strings spanning lines.
fn join_open_quotes<'a>(line: &str, lines: &mut impl Iterator<Item = (usize, &'a str)>) -> String {
    let mut full: String = line.to_string();
    let mut quotes: usize = core::strings::count_unescaped_quotes(line);
    while quotes % 2 == 1 {
        let Some((_, next)) = lines.next() else {
            break;
        };
        quotes += core::strings::count_unescaped_quotes(next);
        full.push('\n');
        full.push_str(next.trim());
    }
    full
}

/// Line of the `BO_` statement for the message `error` names, else `fallback`.
fn validation_line(error: &ModelError, message_lines: &[(String, usize)], fallback: usize) -> usize {
    error
        .message_name()
        .and_then(|name| message_lines.iter().find(|(n, _)| n == name))
        .map_or(fallback, |(_, line)| *line)
}

/// Parses a DBC file and returns a populated [`Database`] instance.
///
/// The file is decoded as UTF-8 (a leading byte-order mark is dropped) and,
/// when that fails, as Windows-1252, the encoding most DBC editors write.
///
/// # Errors
/// Returns a [`LoadError`] if:
/// - The path does not end in `.dbc`.
/// - The file cannot be opened or read.
/// - The content is not valid DBC (see [`decode`]).
///
/// # Example
/// ```no_run
/// let db = dbc_tools::from_file("example.dbc").expect("Failed to parse DBC file");
/// println!("Parsed {} messages", db.messages.len());
/// ```
pub fn from_file(path: &str) -> Result<Database, LoadError> {
    // check if provided file has .dbc format
    if !path.ends_with(".dbc") {
        return Err(LoadError::InvalidExtension {
            path: path.to_string(),
        });
    }

    let file: File = File::open(path).map_err(|source| LoadError::OpenFile {
        path: path.to_string(),
        source,
    })?;
    let mut reader: BufReader<File> = BufReader::new(file);

    // read raw bytes
    let mut bytes: Vec<u8> = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|source| LoadError::Read {
            path: path.to_string(),
            source,
        })?;

    let (text, malformed) = UTF_8.decode_with_bom_removal(&bytes);
    let text = if malformed {
        log::debug!("{path} is not valid UTF-8, decoding as Windows-1252");
        let (text, _, _) = WINDOWS_1252.decode(&bytes);
        text
    } else {
        text
    };

    decode(&text).map_err(|source| LoadError::Parse {
        path: path.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::signal::Endianness;

    const VECTOR_STYLE: &str = r#"
VERSION "1.0.2"

NS_ :
	NS_DESC_
	CM_
	BA_DEF_
	BA_
	VAL_
	SIG_VALTYPE_
	BO_TX_BU_

BS_:

BU_: Motor Infotainment Gateway

BO_ 2527679645 Motor_01: 8 Motor
 SG_ Status : 61|1@1+ (1,0) [0|1] ""  Infotainment,Gateway
 SG_ Overheat : 62|1@1+ (1,0) [0|1] ""  Gateway
 SG_ Engine_Speed : 48|8@1+ (1,0) [0|255] "km/h" Infotainment

BO_ 708 ZV_04: 8 Gateway
 SG_ Lock : 7|2@0- (1.0,0.0) [-2|1] ""  Vector__XXX

BO_TX_BU_ 2527679645 : Gateway;

CM_ "Test network";
CM_ BO_ 2527679645 "Funny comment about Motor_01";
CM_ SG_ 2527679645 Engine_Speed "This comment spans
two lines.";
CM_ BU_ Gateway "Gateway ECU must forward frames between vehicle networks.";
BA_DEF_ BO_ "GenMsgCycleTime" INT 0 10000;
BA_ "BusType" "CAN";

VAL_ 2527679645 Status 1 "On" 0 "Off" ;
"#;

    #[test]
    fn test_decode_vector_style_file() {
        let db: Database = decode(VECTOR_STYLE).unwrap();

        assert_eq!(db.version, "1.0.2");
        assert_eq!(db.comment, "Test network");
        let nodes: Vec<&str> = db.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(nodes, vec!["Motor", "Infotainment", "Gateway"]);
        assert_eq!(
            db.nodes[2].comment,
            "Gateway ECU must forward frames between vehicle networks."
        );

        assert_eq!(db.messages.len(), 2);
        let msg = &db.messages[0];
        assert_eq!(msg.id, 2527679645);
        assert_eq!(msg.id_hex(), "0x16A9549D");
        assert_eq!(msg.comment, "Funny comment about Motor_01");
        assert_eq!(msg.signals.len(), 3);
        assert_eq!(
            msg.signals[0].receivers,
            vec!["Infotainment".to_string(), "Gateway".to_string()]
        );
        assert_eq!(msg.signals[0].describe(1), Some("On"));
        assert_eq!(msg.signals[2].unit, "km/h");
        assert_eq!(
            msg.signals[2].comment,
            "This comment spans\ntwo lines."
        );

        let lock = &db.messages[1].signals[0];
        assert_eq!(lock.byte_order, Endianness::Motorola);
        assert!(lock.signed);
        assert!(lock.receivers.is_empty());
    }

    #[test]
    fn test_blank_lines_keep_current_message() {
        let text = "BU_ ECU1\nBO_ 1 A: 8 ECU1\n\n SG_ S : 0|8@1+ (1,0) [0|255] \"\" ECU1\n";
        let db: Database = decode(text).unwrap();
        assert_eq!(db.messages[0].signals.len(), 1);
    }

    #[test]
    fn test_rejections_carry_line_numbers() {
        let text = "VERSION \"1\"\n\nBU_ ECU1\n\nBO_ 1 A: 8 ECU1\n SG_ S : 0|8@3+ (1,0) [0|255] \"\" ECU1\n";
        let err: ParseError = decode(text).unwrap_err();
        assert_eq!(err.line, 6);
        assert_eq!(err.kind, ParseErrorKind::UnknownByteOrder("3".into()));

        let text = "BU_ ECU1\nBO_ 1 A: 8 ECU1\nCM_ \"x\";\n SG_ S : 0|8@1+ (1,0) [0|255] \"\" ECU1\n";
        let err: ParseError = decode(text).unwrap_err();
        assert_eq!(err.line, 4);
        assert_eq!(err.kind, ParseErrorKind::SignalOutsideMessage);

        let err: ParseError = decode("VERSION \"1\"\nVERSION \"2\"\n").unwrap_err();
        assert_eq!(err, ParseError::new(2, ParseErrorKind::DuplicateVersion));

        let err: ParseError = decode("VERSION \"1\"\nHELLO world\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(matches!(err.kind, ParseErrorKind::UnexpectedLine(_)));
    }

    #[test]
    fn test_rejects_duplicates_and_overlaps() {
        let text = "BU_ ECU1\nBU_ ECU1\n";
        let err: ParseError = decode(text).unwrap_err();
        assert_eq!(err.line, 2);
        assert!(matches!(
            err.kind,
            ParseErrorKind::Model(ModelError::NodeAlreadyExists { .. })
        ));

        let text = "BU_ ECU1\nBO_ 1 A: 1 ECU1\n SG_ S : 0|8@1+ (1,0) [0|1] \"\"\n SG_ T : 4|2@1+ (1,0) [0|1] \"\"\n";
        let err: ParseError = decode(text).unwrap_err();
        assert_eq!(err.line, 4);
        assert!(matches!(
            err.kind,
            ParseErrorKind::Model(ModelError::OverlappingSignals { bit: 4, .. })
        ));
    }

    #[test]
    fn test_unterminated_comment_reports_start_line() {
        let text = "BU_ ECU1\nCM_ BU_ ECU1 \"never closed\nstill open\n";
        let err: ParseError = decode(text).unwrap_err();
        assert_eq!(err, ParseError::new(2, ParseErrorKind::UnterminatedString));
    }

    #[test]
    fn test_message_timing_attributes() {
        let db: Database = decode(VECTOR_STYLE).unwrap();
        assert_eq!(db.messages[0].cycle_time, None);

        let text = "BU_: ECU1\n\
                    BO_ 291 EngineData: 8 ECU1\n\
                    BO_ 292 Status: 8 ECU1\n\
                    BA_DEF_ BO_ \"GenMsgCycleTime\" INT 0 65535;\n\
                    BA_DEF_ BO_ \"GenMsgSendType\" ENUM \"Cyclic\",\"Event\";\n\
                    BA_DEF_ \"DBName\" STRING ;\n\
                    BA_DEF_DEF_ \"GenMsgCycleTime\" 0;\n\
                    BA_ \"DBName\" \"Powertrain\nCAN\";\n\
                    BA_ \"GenMsgCycleTime\" BO_ 291 10;\n\
                    BA_ \"GenMsgSendType\" BO_ 292 1;\n";
        let db: Database = decode(text).unwrap();
        assert_eq!(db.messages[0].cycle_time, Some(10));
        assert_eq!(db.messages[0].send_type, None);
        assert_eq!(db.messages[1].cycle_time, None);
        assert_eq!(db.messages[1].send_type.as_deref(), Some("Event"));

        let err: ParseError = decode("BU_: ECU1\nBA_ \"GenMsgCycleTime\" BO_ 7 10;\n").unwrap_err();
        assert_eq!(err, ParseError::new(2, ParseErrorKind::UnknownMessageId(7)));
    }

    #[test]
    fn test_validation_line_points_at_message() {
        let lines: Vec<(String, usize)> = vec![("A".to_string(), 5), ("B".to_string(), 9)];
        let err = ModelError::ZeroScale {
            message: "B".to_string(),
            signal: "S".to_string(),
        };
        assert_eq!(validation_line(&err, &lines, 20), 9);
        let err = ModelError::NodeAlreadyExists {
            name: "ECU1".to_string(),
        };
        assert_eq!(validation_line(&err, &lines, 20), 20);
    }

    #[test]
    fn test_from_file_rejects_extension() {
        assert!(matches!(
            from_file("network.txt"),
            Err(LoadError::InvalidExtension { .. })
        ));
    }
}
