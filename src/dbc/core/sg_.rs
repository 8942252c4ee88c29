use crate::dbc::core::strings;
use crate::types::{
    database::Database,
    errors::ParseErrorKind,
    node::Node,
    signal::{Endianness, Signal},
};

/// Placeholder receiver written by DBC tools when a signal has no receiver.
pub(crate) const NO_RECEIVER: &str = Node::PLACEHOLDER;

/// Decode a `SG_` line belonging to the **current message** (the last parsed BO_).
/// Format (typical):
/// SG_ <name> : <bit_start>|<bit_length>@<endian><sign>[<scale>] (<factor>,<offset>) [<min>|<max>] "<unit>" <receivers...>
///
/// The optional number after the sign marker is only checked to be numeric.
pub(crate) fn decode(db: &mut Database, message: &str, line: &str) -> Result<(), ParseErrorKind> {
    let signal: Signal = parse(line)?;
    if let Some(node) = signal.receivers.iter().find(|r| !db.has_node(r.as_str())) {
        return Err(ParseErrorKind::UnknownNode(node.clone()));
    }
    db.add_signal(message, signal)?;
    Ok(())
}

/// Parses one signal line into a [`Signal`] without touching the database.
pub(crate) fn parse(line: &str) -> Result<Signal, ParseErrorKind> {
    let after: &str = line
        .trim()
        .strip_prefix("SG_")
        .ok_or_else(|| ParseErrorKind::Expected {
            expected: "SG_",
            found: strings::first_token(line).to_string(),
        })?;

    // Left part "NAME [M|mX]" up to the first ':'
    let Some((left, right)) = after.split_once(':') else {
        return Err(ParseErrorKind::Expected {
            expected: "':' after the signal name",
            found: after.trim().to_string(),
        });
    };
    let (name, mux) = strings::split_token(left);
    if name.is_empty() {
        return Err(ParseErrorKind::Missing("signal name"));
    }
    let mux: &str = mux.trim();
    if !mux.is_empty() {
        return Err(ParseErrorKind::Multiplexing(mux.to_string()));
    }

    // 1) bit info: "0|16@1+" or "0|16@1+0.250000"
    let (bit_info, rest) = strings::split_token(right);
    if bit_info.is_empty() {
        return Err(ParseErrorKind::Missing("bit layout"));
    }
    let Some((pos_len, marker)) = bit_info.split_once('@') else {
        return Err(ParseErrorKind::Expected {
            expected: "'@' in the bit layout",
            found: bit_info.to_string(),
        });
    };
    let Some((start_str, length_str)) = pos_len.split_once('|') else {
        return Err(ParseErrorKind::Expected {
            expected: "<start>|<length>",
            found: pos_len.to_string(),
        });
    };
    let start_bit: u16 = strings::parse_number(start_str, "start bit")?;
    let length: u16 = strings::parse_number(length_str, "bit length")?;
    let (byte_order, signed) = parse_marker(marker)?;

    // 2) "(factor,offset)"
    let (inner, rest) = take_delimited(rest, '(', ')', "(scale,offset)")?;
    let Some((scale_str, offset_str)) = inner.split_once(',') else {
        return Err(ParseErrorKind::Expected {
            expected: "(scale,offset)",
            found: format!("({inner})"),
        });
    };
    let scale: f64 = strings::parse_number(scale_str, "scale")?;
    let offset: f64 = strings::parse_number(offset_str, "offset")?;

    // 3) "[min|max]"
    let (inner, rest) = take_delimited(rest, '[', ']', "[min|max]")?;
    let Some((min_str, max_str)) = inner.split_once('|') else {
        return Err(ParseErrorKind::Expected {
            expected: "[min|max]",
            found: format!("[{inner}]"),
        });
    };
    let min: f64 = strings::parse_number(min_str, "minimum")?;
    let max: f64 = strings::parse_number(max_str, "maximum")?;

    // 4) "unit"
    let (unit, rest) = strings::take_quoted(rest, "quoted unit")?;

    // 5) receivers, comma and/or space separated
    let receivers: Vec<String> = rest
        .trim()
        .trim_end_matches(';')
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|r| !r.is_empty() && *r != NO_RECEIVER)
        .map(str::to_string)
        .collect();

    Ok(Signal {
        name: name.to_string(),
        start_bit,
        length,
        byte_order,
        signed,
        scale,
        offset,
        min,
        max,
        unit,
        receivers,
        ..Default::default()
    })
}

/// `<endian><sign>[<number>]`, e.g. `1+`, `0-`, `1+0.250000`.
fn parse_marker(marker: &str) -> Result<(Endianness, bool), ParseErrorKind> {
    let mut chars = marker.chars();
    let byte_order: Endianness = match chars.next() {
        Some(tag) => Endianness::from_tag(tag)
            .ok_or_else(|| ParseErrorKind::UnknownByteOrder(tag.to_string()))?,
        None => return Err(ParseErrorKind::Missing("byte-order tag")),
    };
    let signed: bool = match chars.next() {
        Some('+') => false,
        Some('-') => true,
        Some(other) => return Err(ParseErrorKind::UnknownSign(other.to_string())),
        None => return Err(ParseErrorKind::Missing("sign marker")),
    };
    let factor: &str = chars.as_str();
    if !factor.is_empty() {
        strings::parse_number::<f64>(factor, "sign-marker factor")?;
    }
    Ok((byte_order, signed))
}

/// Takes `<open>...<close>` off the front of `s`, returning the inner text and the rest.
fn take_delimited<'a>(
    s: &'a str,
    open: char,
    close: char,
    what: &'static str,
) -> Result<(&'a str, &'a str), ParseErrorKind> {
    let s: &str = s.trim_start();
    let Some(body) = s.strip_prefix(open) else {
        return Err(if s.is_empty() {
            ParseErrorKind::Missing(what)
        } else {
            ParseErrorKind::Expected {
                expected: what,
                found: strings::first_token(s).to_string(),
            }
        });
    };
    match body.find(close) {
        Some(end) => Ok((&body[..end], &body[end + close.len_utf8()..])),
        None => Err(ParseErrorKind::Expected {
            expected: what,
            found: s.to_string(),
        }),
    }
}
