use std::fmt::{self, Write as FmtWrite};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::dbc::core::{
    ba_::{CYCLE_TIME, SEND_TYPE, SEND_TYPES},
    sg_::NO_RECEIVER,
    strings::escape_dbc_string,
};
use crate::dbc::dialect::{Dialect, EncodeOptions};
use crate::types::{
    database::Database,
    errors::{EncodeError, SaveError},
    signal::Signal,
};

const NS_KEYWORDS: &[&str] = &[
    "NS_DESC_",
    "CM_",
    "BA_DEF_",
    "BA_",
    "VAL_",
    "CAT_DEF_",
    "CAT_",
    "FILTER",
    "BA_DEF_DEF_",
    "EV_DATA_",
    "ENVVAR_DATA_",
    "SGTYPE_",
    "SGTYPE_VAL_",
    "BA_DEF_SGTYPE_",
    "BA_SGTYPE_",
    "SIG_TYPE_REF_",
    "VAL_TABLE_",
    "SIG_GROUP_",
    "SIG_VALTYPE_",
    "SIGTYPE_VALTYPE_",
    "BO_TX_BU_",
    "BA_DEF_REL_",
    "BA_REL_",
    "BA_DEF_DEF_REL_",
    "BU_SG_REL_",
    "BU_EV_REL_",
    "BU_BO_REL_",
];

/// Encodes a database into DBC text using the default [`Dialect::Legacy`] layout.
///
/// The database is validated first, so an invalid model is reported as
/// [`EncodeError::InvalidModel`] instead of producing malformed text. The output
/// only depends on the database, so encoding twice yields identical text.
///
/// # Example
/// ```
/// use dbc_tools::dbc;
///
/// let db = dbc::reference_database();
/// let text = dbc::encode(&db).unwrap();
/// assert!(text.contains("BO_ 291 EngineData: 8 ECU1\n"));
/// assert!(text.contains(
///     " SG_ RPM : 0|16@1+0.250000 (0.250000,0.000000) [0.000000|16383.750000] \"rpm\" ECU2\n"
/// ));
/// ```
pub fn encode(db: &Database) -> Result<String, EncodeError> {
    encode_with(db, &EncodeOptions::default())
}

/// Encodes a database into DBC text with explicit [`EncodeOptions`].
pub fn encode_with(db: &Database, options: &EncodeOptions) -> Result<String, EncodeError> {
    let mut buf: Vec<u8> = Vec::with_capacity(1024);
    encode_to_writer(db, options, &mut buf)?;
    String::from_utf8(buf).map_err(|_| EncodeError::Format)
}

/// Validates `db` and streams its DBC text into `out`.
pub fn encode_to_writer<W: Write>(
    db: &Database,
    options: &EncodeOptions,
    out: &mut W,
) -> Result<(), EncodeError> {
    db.validate()?;
    serialize_database(db, options.dialect, out)?;
    log::debug!(
        "encoded DBC ({} dialect): {} nodes, {} messages",
        options.dialect,
        db.nodes.len(),
        db.messages.len()
    );
    Ok(())
}

/// Serializes a `Database` into DBC text and writes it to `path`.
///
/// Validates the database before touching the filesystem, ensures the
/// destination has a `.dbc` extension, creates intermediate directories when
/// needed, and reports structured `SaveError` variants for path, I/O, or
/// encoding failures. The file handle is closed on every return path.
pub fn save_to_file(path: &str, db: &Database, options: &EncodeOptions) -> Result<(), SaveError> {
    if !path.to_ascii_lowercase().ends_with(".dbc") {
        return Err(SaveError::InvalidExtension {
            path: path.to_string(),
        });
    }
    db.validate()
        .map_err(|e| SaveError::Encode(EncodeError::InvalidModel(e)))?;

    let path_ref: &Path = Path::new(path);
    if let Some(parent) = path_ref.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| SaveError::CreateDirectory {
            path: parent.display().to_string(),
            source,
        })?;
    }

    let file: File = File::create(path_ref).map_err(|source| SaveError::CreateFile {
        path: path.to_string(),
        source,
    })?;
    let mut writer: BufWriter<File> = BufWriter::new(file);
    encode_to_writer(db, options, &mut writer).map_err(|err| match err {
        EncodeError::Io(source) => SaveError::Write {
            path: path.to_string(),
            source,
        },
        other => SaveError::Encode(other),
    })?;
    writer.flush().map_err(|source| SaveError::Write {
        path: path.to_string(),
        source,
    })?;
    log::debug!("saved DBC to {path}");
    Ok(())
}

/// Serializes the database into raw DBC text using the provided writer.
fn serialize_database<W: Write>(db: &Database, dialect: Dialect, out: &mut W) -> io::Result<()> {
    let version = escape_dbc_string(&db.version);
    write_fmt(out, format_args!("VERSION \"{}\"\n\n", version))?;

    write_fmt(out, format_args!("NS_ :\n"))?;
    match dialect {
        Dialect::Legacy => {
            for node in &db.nodes {
                write_fmt(out, format_args!("BU_ {}\n", node.name))?;
            }
        }
        Dialect::Standard => {
            for keyword in NS_KEYWORDS {
                write_fmt(out, format_args!("\t{}\n", keyword))?;
            }
            write_fmt(out, format_args!("\nBS_:\n\nBU_:"))?;
            for node in &db.nodes {
                write_fmt(out, format_args!(" {}", node.name))?;
            }
            write_fmt(out, format_args!("\n"))?;
        }
    }
    write_fmt(out, format_args!("\n"))?;

    write_messages(db, dialect, out)?;

    if db.has_comments() {
        write_comments(db, out)?;
        write_fmt(out, format_args!("\n"))?;
    }
    if db.has_message_timing() {
        write_message_timing(db, out)?;
        write_fmt(out, format_args!("\n"))?;
    }
    if db.has_value_tables() {
        write_value_tables(db, out)?;
        write_fmt(out, format_args!("\n"))?;
    }

    Ok(())
}

/// Writes each message and its signals, each block followed by a blank line.
fn write_messages<W: Write>(db: &Database, dialect: Dialect, out: &mut W) -> io::Result<()> {
    for message in &db.messages {
        write_fmt(
            out,
            format_args!(
                "BO_ {} {}: {} {}\n",
                message.id, message.name, message.size, message.sender
            ),
        )?;
        for signal in &message.signals {
            write_signal(signal, dialect, out)?;
        }
        write_fmt(out, format_args!("\n"))?;
    }
    Ok(())
}

fn write_signal<W: Write>(signal: &Signal, dialect: Dialect, out: &mut W) -> io::Result<()> {
    let endian: char = signal.byte_order.tag();
    let sign_char: char = if signal.signed { '-' } else { '+' };
    let factor = dialect.format_f64(signal.scale);
    let offset = dialect.format_f64(signal.offset);
    let min = dialect.format_f64(signal.min);
    let max = dialect.format_f64(signal.max);
    let unit = escape_dbc_string(&signal.unit);
    let receivers: String = signal.receivers.join(",");

    match dialect {
        Dialect::Legacy => write_fmt(
            out,
            format_args!(
                " SG_ {} : {}|{}@{}{}{} ({},{}) [{}|{}] \"{}\" {}\n",
                signal.name,
                signal.start_bit,
                signal.length,
                endian,
                sign_char,
                dialect.format_f64(signal.scale.abs()),
                factor,
                offset,
                min,
                max,
                unit,
                receivers
            ),
        ),
        Dialect::Standard => {
            let receivers_field: &str = if receivers.is_empty() {
                NO_RECEIVER
            } else {
                &receivers
            };
            write_fmt(
                out,
                format_args!(
                    "\tSG_ {} : {}|{}@{}{} ({},{}) [{}|{}] \"{}\"  {}\n",
                    signal.name,
                    signal.start_bit,
                    signal.length,
                    endian,
                    sign_char,
                    factor,
                    offset,
                    min,
                    max,
                    unit,
                    receivers_field
                ),
            )
        }
    }
}

/// Emits `CM_` lines for the database, nodes, messages and signals, in model order.
fn write_comments<W: Write>(db: &Database, out: &mut W) -> io::Result<()> {
    if !db.comment.is_empty() {
        let comment = escape_dbc_string(&db.comment);
        write_fmt(out, format_args!("CM_ \"{}\";\n", comment))?;
    }

    for node in db.nodes.iter().filter(|n| !n.comment.is_empty()) {
        let comment = escape_dbc_string(&node.comment);
        write_fmt(
            out,
            format_args!("CM_ BU_ {} \"{}\";\n", node.name, comment),
        )?;
    }

    for message in db.messages.iter().filter(|m| !m.comment.is_empty()) {
        let comment = escape_dbc_string(&message.comment);
        write_fmt(
            out,
            format_args!("CM_ BO_ {} \"{}\";\n", message.id, comment),
        )?;
    }

    for (message, signal) in db.iter_signals().filter(|(_, s)| !s.comment.is_empty()) {
        let comment = escape_dbc_string(&signal.comment);
        write_fmt(
            out,
            format_args!(
                "CM_ SG_ {} {} \"{}\";\n",
                message.id, signal.name, comment
            ),
        )?;
    }

    Ok(())
}

/// Emits the `GenMsgCycleTime` / `GenMsgSendType` definitions, their defaults
/// and one `BA_` line per message that sets them.
fn write_message_timing<W: Write>(db: &Database, out: &mut W) -> io::Result<()> {
    let cycle_times: Vec<(u32, u32)> = db
        .messages
        .iter()
        .filter_map(|m| m.cycle_time.map(|t| (m.id, t)))
        .collect();
    let send_types: Vec<(u32, &str)> = db
        .messages
        .iter()
        .filter_map(|m| m.send_type.as_deref().map(|s| (m.id, s)))
        .collect();

    // Declared labels first, then any other label in model order.
    let mut labels: Vec<&str> = SEND_TYPES.to_vec();
    for (_, label) in &send_types {
        if !labels.contains(label) {
            labels.push(*label);
        }
    }

    if !cycle_times.is_empty() {
        let max: u32 = cycle_times.iter().map(|(_, t)| *t).fold(65535, u32::max);
        write_fmt(
            out,
            format_args!("BA_DEF_ BO_ \"{}\" INT 0 {};\n", CYCLE_TIME, max),
        )?;
    }
    if !send_types.is_empty() {
        let quoted: Vec<String> = labels
            .iter()
            .map(|l| format!("\"{}\"", escape_dbc_string(l)))
            .collect();
        write_fmt(
            out,
            format_args!("BA_DEF_ BO_ \"{}\" ENUM {};\n", SEND_TYPE, quoted.join(",")),
        )?;
    }
    if !cycle_times.is_empty() {
        write_fmt(out, format_args!("BA_DEF_DEF_ \"{}\" 0;\n", CYCLE_TIME))?;
    }
    if !send_types.is_empty() {
        write_fmt(
            out,
            format_args!("BA_DEF_DEF_ \"{}\" \"{}\";\n", SEND_TYPE, SEND_TYPES[0]),
        )?;
    }

    for (id, cycle_time) in &cycle_times {
        write_fmt(
            out,
            format_args!("BA_ \"{}\" BO_ {} {};\n", CYCLE_TIME, id, cycle_time),
        )?;
    }
    for (id, label) in &send_types {
        let index: usize = labels.iter().position(|l| l == label).unwrap_or_default();
        write_fmt(
            out,
            format_args!("BA_ \"{}\" BO_ {} {};\n", SEND_TYPE, id, index),
        )?;
    }
    Ok(())
}

/// Emits one `VAL_` line per signal carrying a value table, ascending by raw value.
fn write_value_tables<W: Write>(db: &Database, out: &mut W) -> io::Result<()> {
    for (message, signal) in db.iter_signals() {
        if signal.value_table.is_empty() {
            continue;
        }
        write_fmt(out, format_args!("VAL_ {} {}", message.id, signal.name))?;
        for (value, description) in &signal.value_table {
            let desc = escape_dbc_string(description);
            write_fmt(out, format_args!(" {} \"{}\"", value, desc))?;
        }
        write_fmt(out, format_args!(" ;\n"))?;
    }
    Ok(())
}

/// Adapter to use `fmt::Write` with any `io::Write`.
struct IoWriteAdapter<'a, W: Write> {
    inner: &'a mut W,
    error: Option<io::Error>,
}

impl<W: Write> FmtWrite for IoWriteAdapter<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if let Err(err) = self.inner.write_all(s.as_bytes()) {
            self.error = Some(err);
            return Err(fmt::Error);
        }
        Ok(())
    }
}

/// Writes formatted arguments to any writer, propagating the underlying I/O error.
fn write_fmt<W: Write>(out: &mut W, args: fmt::Arguments<'_>) -> io::Result<()> {
    let mut adapter = IoWriteAdapter {
        inner: out,
        error: None,
    };
    match fmt::write(&mut adapter, args) {
        Ok(()) => Ok(()),
        Err(_) => Err(adapter
            .error
            .unwrap_or_else(|| io::Error::other("formatting error"))),
    }
}
