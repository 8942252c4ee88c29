use crate::dbc::core::strings;
use crate::types::{database::Database, errors::ParseErrorKind};

/// Object a `CM_` comment is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CommentTarget {
    Database,
    Node(String),
    Message(u32),
    Signal(u32, String),
}

/// Decode a (possibly multi-line, already joined) comment and store it.
///
/// Expected formats:
/// - `CM_ "Comment regarding the network";`
/// - `CM_ BU_ <node> "text";`
/// - `CM_ BO_ <id> "text";`
/// - `CM_ SG_ <id> <signal> "text";`
pub(crate) fn decode(db: &mut Database, line: &str) -> Result<(), ParseErrorKind> {
    let (target, text) = parse(line)?;
    match target {
        CommentTarget::Database => db.comment = text,
        CommentTarget::Node(name) => match db.get_node_by_name_mut(&name) {
            Some(node) => node.comment = text,
            None => return Err(ParseErrorKind::UnknownNode(name)),
        },
        CommentTarget::Message(id) => match db.get_message_by_id_mut(id) {
            Some(msg) => msg.comment = text,
            None => return Err(ParseErrorKind::UnknownMessageId(id)),
        },
        CommentTarget::Signal(id, signal) => {
            let msg = db
                .get_message_by_id_mut(id)
                .ok_or(ParseErrorKind::UnknownMessageId(id))?;
            match msg.get_signal_by_name_mut(&signal) {
                Some(sig) => sig.comment = text,
                None => return Err(ParseErrorKind::UnknownSignal { id, signal }),
            }
        }
    }
    Ok(())
}

pub(crate) fn parse(line: &str) -> Result<(CommentTarget, String), ParseErrorKind> {
    let rest: &str = line
        .trim()
        .strip_prefix("CM_")
        .ok_or_else(|| ParseErrorKind::Expected {
            expected: "CM_",
            found: strings::first_token(line).to_string(),
        })?;

    let (kind, after_kind) = strings::split_token(rest);
    let (target, rest) = match kind {
        "BU_" => {
            let (node, rest) = strings::split_token(after_kind);
            if node.is_empty() {
                return Err(ParseErrorKind::Missing("node name"));
            }
            (CommentTarget::Node(node.to_string()), rest)
        }
        "BO_" => {
            let (id, rest) = strings::split_token(after_kind);
            (
                CommentTarget::Message(strings::parse_number(id, "message ID")?),
                rest,
            )
        }
        "SG_" => {
            let (id, rest) = strings::split_token(after_kind);
            let id: u32 = strings::parse_number(id, "message ID")?;
            let (signal, rest) = strings::split_token(rest);
            if signal.is_empty() {
                return Err(ParseErrorKind::Missing("signal name"));
            }
            (CommentTarget::Signal(id, signal.to_string()), rest)
        }
        // Database comment: the quoted text follows `CM_` directly.
        _ => (CommentTarget::Database, rest),
    };

    let (text, rest) = strings::take_quoted(rest, "quoted comment")?;
    strings::expect_end(rest)?;
    Ok((target, text))
}
