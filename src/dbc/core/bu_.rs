use crate::types::database::Database;
use crate::types::errors::ParseErrorKind;
use crate::types::node::Node;

/// Decode a node declaration and register the nodes in the database.
///
/// Accepts the one-line form `BU_: ECU1 ECU2 ECU3` as well as the
/// one-node-per-line form `BU_ ECU1`. `BU_:` alone declares no nodes.
/// The `Vector__XXX` placeholder some tools list is not a node and is dropped.
pub(crate) fn decode(db: &mut Database, line: &str) -> Result<(), ParseErrorKind> {
    let rest: &str = line
        .trim()
        .strip_prefix("BU_")
        .ok_or_else(|| ParseErrorKind::Expected {
            expected: "BU_",
            found: line.trim().to_string(),
        })?;
    let rest: &str = rest.trim_start();
    let rest: &str = rest.strip_prefix(':').unwrap_or(rest);

    for name in rest.split_ascii_whitespace() {
        if name == Node::PLACEHOLDER {
            log::debug!("ignoring placeholder node {name}");
            continue;
        }
        db.add_node(name)?;
    }
    Ok(())
}
