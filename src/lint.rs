//! # lint
//!
//! Network-level checks that go beyond structural validity. A database that
//! passes [`Database::validate`](crate::Database::validate) can still carry
//! names other tools truncate, diagnostic frames outside the diagnostic ID
//! band, or physical limits the raw field cannot reach. [`lint`] reports those
//! as [`Finding`]s without rejecting the database.

use serde::Serialize;
use std::fmt;

use crate::types::{
    database::Database,
    message::{IdFormat, Message},
    signal::Signal,
};

/// Longest name accepted by common DBC tooling.
pub const MAX_NAME_LEN: usize = 64;

/// IDs a standard (11-bit) frame can carry, 0 excluded.
const STANDARD_ID_RANGE: std::ops::RangeInclusive<u32> = 0x001..=Message::MAX_STANDARD_ID;
/// Standard-ID band reserved for diagnostic messages.
const DIAG_ID_RANGE: std::ops::RangeInclusive<u32> = 0x700..=0x7FF;
/// Standard-ID band reserved for network-management messages.
const NM_ID_RANGE: std::ops::RangeInclusive<u32> = 0x500..=0x5FF;
/// Send types that transmit periodically and so need a cycle time.
const PERIODIC_SEND_TYPES: &[&str] = &["Cyclic", "CE", "CA"];

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

impl Severity {
    pub fn to_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
        }
    }
}

/// The check that produced a [`Finding`].
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    NameTooLong,
    StandardIdRange,
    DiagnosticId,
    NetworkManagementId,
    RangeNotRepresentable,
    NoReceivers,
    MissingCycleTime,
}

impl Rule {
    pub fn to_str(&self) -> &'static str {
        match self {
            Rule::NameTooLong => "name-too-long",
            Rule::StandardIdRange => "standard-id-range",
            Rule::DiagnosticId => "diagnostic-id",
            Rule::NetworkManagementId => "network-management-id",
            Rule::RangeNotRepresentable => "range-not-representable",
            Rule::NoReceivers => "no-receivers",
            Rule::MissingCycleTime => "missing-cycle-time",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Rule::NoReceivers => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub rule: Rule,
    /// `Node`, `Message` or `Message.Signal`.
    pub location: String,
    pub message: String,
}

impl Finding {
    fn new(rule: Rule, location: impl Into<String>, message: String) -> Self {
        Finding {
            severity: rule.severity(),
            rule,
            location: location.into(),
            message,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}: {}",
            self.severity.to_str(),
            self.rule.to_str(),
            self.location,
            self.message
        )
    }
}

/// Runs every check and returns the findings in model order.
///
/// # Example
/// ```
/// use dbc_tools::{dbc, lint};
///
/// let mut db = dbc::reference_database();
/// assert!(lint::lint(&db).is_empty());
///
/// db.messages[0].name = "Diag_Request".to_string();
/// let findings = lint::lint(&db);
/// assert_eq!(findings[0].rule, lint::Rule::DiagnosticId);
/// ```
pub fn lint(db: &Database) -> Vec<Finding> {
    let mut findings: Vec<Finding> = Vec::new();

    for node in &db.nodes {
        check_name_length(&node.name, &node.name, &mut findings);
    }
    for message in &db.messages {
        check_message(message, &mut findings);
        for signal in &message.signals {
            check_signal(message, signal, &mut findings);
        }
    }
    log::debug!("lint: {} findings", findings.len());
    findings
}

fn check_name_length(location: &str, name: &str, findings: &mut Vec<Finding>) {
    let len: usize = name.chars().count();
    if len > MAX_NAME_LEN {
        findings.push(Finding::new(
            Rule::NameTooLong,
            location,
            format!("name is {len} characters long (max {MAX_NAME_LEN})"),
        ));
    }
}

fn check_message(message: &Message, findings: &mut Vec<Finding>) {
    check_name_length(&message.name, &message.name, findings);

    let standard: bool = message.id_format() == IdFormat::Standard;
    let id: u32 = message.frame_id();
    if standard && !STANDARD_ID_RANGE.contains(&id) {
        findings.push(Finding::new(
            Rule::StandardIdRange,
            &message.name,
            format!(
                "standard ID {} is outside 0x001 to 0x7FF (set bit 31 for an extended ID)",
                message.id_hex()
            ),
        ));
    }

    let in_diag_band: bool = standard && DIAG_ID_RANGE.contains(&id);
    let diag_name: bool = message.name.starts_with("Diag");
    if in_diag_band != diag_name {
        findings.push(Finding::new(
            Rule::DiagnosticId,
            &message.name,
            if diag_name {
                format!("diagnostic message has ID {} outside 0x700 to 0x7FF", message.id_hex())
            } else {
                format!("ID {} is in the diagnostic band but the name does not start with 'Diag'", message.id_hex())
            },
        ));
    }

    let in_nm_band: bool = standard && NM_ID_RANGE.contains(&id);
    let nm_name: bool = message.name.starts_with("NM_");
    if in_nm_band != nm_name {
        findings.push(Finding::new(
            Rule::NetworkManagementId,
            &message.name,
            if nm_name {
                format!("network-management message has ID {} outside 0x500 to 0x5FF", message.id_hex())
            } else {
                format!("ID {} is in the network-management band but the name does not start with 'NM_'", message.id_hex())
            },
        ));
    }

    if let Some(send_type) = message.send_type.as_deref()
        && PERIODIC_SEND_TYPES.contains(&send_type)
        && message.cycle_time.unwrap_or(0) == 0
    {
        findings.push(Finding::new(
            Rule::MissingCycleTime,
            &message.name,
            format!("send type {send_type} needs a non-zero cycle time"),
        ));
    }
}

fn check_signal(message: &Message, signal: &Signal, findings: &mut Vec<Finding>) {
    let location: String = format!("{}.{}", message.name, signal.name);
    check_name_length(&location, &signal.name, findings);

    // [0|0] is the usual "no limits" placeholder.
    if !(signal.min == 0.0 && signal.max == 0.0) {
        let (lo, hi) = signal.physical_range();
        let slack: f64 = signal.scale.abs() * 1e-6;
        if signal.min < lo - slack || signal.max > hi + slack {
            findings.push(Finding::new(
                Rule::RangeNotRepresentable,
                location.as_str(),
                format!(
                    "[{}|{}] exceeds the representable range [{}|{}]",
                    signal.min, signal.max, lo, hi
                ),
            ));
        }
    }

    if signal.receivers.is_empty() {
        findings.push(Finding::new(
            Rule::NoReceivers,
            location,
            "signal has no receivers".to_string(),
        ));
    }
}
