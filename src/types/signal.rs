use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{
    errors::{ModelError, NameKind},
    is_dbc_identifier,
    layout::{self, BitMask},
};

/// Definition of a signal within a CAN message (DBC).
///
/// Describes position/bit-length, byte order, sign, scaling (scale/offset),
/// valid physical range, unit of measure, receiver nodes and the optional
/// comment and value table.
///
/// `physical_value = raw * scale + offset`.
///
/// # Example
/// ```
/// use dbc_tools::{Endianness, Signal};
///
/// let rpm = Signal {
///     name: "RPM".to_string(),
///     length: 16,
///     scale: 0.25,
///     max: 16383.75,
///     unit: "rpm".to_string(),
///     receivers: vec!["ECU2".to_string()],
///     ..Default::default()
/// };
/// assert_eq!(rpm.byte_order, Endianness::Intel);
/// assert_eq!(rpm.physical_range(), (0.0, 16383.75));
/// ```
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Signal {
    /// Signal name, unique within its message.
    pub name: String,
    /// Bit start in the payload (DBC numbering, bit 0 = LSB of the first byte).
    pub start_bit: u16,
    /// Bit length.
    pub length: u16,
    /// Byte order.
    pub byte_order: Endianness,
    /// Two's-complement raw value when `true`.
    pub signed: bool,
    /// Scaling factor, never zero.
    pub scale: f64,
    /// Scaling offset.
    pub offset: f64,
    /// Minimum physical value.
    pub min: f64,
    /// Maximum physical value.
    pub max: f64,
    /// Unit of measure, may be empty.
    pub unit: String,
    /// Names of the receiving nodes, in declaration order.
    pub receivers: Vec<String>,
    /// Associated comment (DBC `CM_ SG_` section).
    pub comment: String,
    /// Raw value to description mapping (DBC `VAL_` section).
    pub value_table: BTreeMap<i64, String>,
}

impl Default for Signal {
    fn default() -> Self {
        Signal {
            name: String::new(),
            start_bit: 0,
            length: 1,
            byte_order: Endianness::default(),
            signed: false,
            scale: 1.0,
            offset: 0.0,
            min: 0.0,
            max: 0.0,
            unit: String::new(),
            receivers: Vec::new(),
            comment: String::new(),
            value_table: BTreeMap::new(),
        }
    }
}

impl Signal {
    /// Bits of the payload covered by this signal.
    ///
    /// Only meaningful once the layout has been checked against the message size.
    pub fn occupied_bits(&self) -> BitMask {
        BitMask::for_signal(self.start_bit, self.length, self.byte_order)
    }

    /// Smallest and largest raw value the signal can carry.
    pub fn raw_range(&self) -> (f64, f64) {
        let bits = self.length.min(layout::MAX_SIGNAL_BITS) as i32;
        if bits == 0 {
            return (0.0, 0.0);
        }
        if self.signed {
            let half = 2f64.powi(bits - 1);
            (-half, half - 1.0)
        } else {
            (0.0, 2f64.powi(bits) - 1.0)
        }
    }

    /// Physical range reachable through the raw range, ordered low to high.
    pub fn physical_range(&self) -> (f64, f64) {
        let (raw_lo, raw_hi) = self.raw_range();
        let a = raw_lo * self.scale + self.offset;
        let b = raw_hi * self.scale + self.offset;
        if a <= b { (a, b) } else { (b, a) }
    }

    /// Returns the description associated with a raw value, if any.
    pub fn describe(&self, raw: i64) -> Option<&str> {
        self.value_table.get(&raw).map(String::as_str)
    }

    /// Checks everything about the signal that does not depend on other signals
    /// or on the node list: name, numeric fields and fit within `size` bytes.
    pub(crate) fn validate_in(&self, message: &str, size: u8) -> Result<(), ModelError> {
        if !is_dbc_identifier(&self.name) {
            return Err(ModelError::InvalidName {
                kind: NameKind::Signal,
                name: self.name.clone(),
            });
        }

        let context = || (message.to_string(), self.name.clone());
        for (field, value) in [
            ("scale", self.scale),
            ("offset", self.offset),
            ("min", self.min),
            ("max", self.max),
        ] {
            if !value.is_finite() {
                let (message, signal) = context();
                return Err(ModelError::NonFinite {
                    message,
                    signal,
                    field,
                });
            }
        }
        if self.scale == 0.0 {
            let (message, signal) = context();
            return Err(ModelError::ZeroScale { message, signal });
        }
        if self.min > self.max {
            let (message, signal) = context();
            return Err(ModelError::InvertedRange {
                message,
                signal,
                min: self.min,
                max: self.max,
            });
        }

        layout::check_signal_fits(size, self.start_bit, self.length, self.byte_order).map_err(
            |source| {
                let (message, signal) = context();
                ModelError::Layout {
                    message,
                    signal,
                    source,
                }
            },
        )
    }
}

/// Byte order of a signal.
///
/// DBC encodes it as a single digit after `@`: `1` for Intel, `0` for Motorola.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Endianness {
    /// Little-endian.
    #[default]
    Intel, // 1
    /// Big-endian.
    Motorola, // 0
}

impl Endianness {
    /// The DBC tag character for this byte order.
    pub fn tag(self) -> char {
        match self {
            Endianness::Intel => '1',
            Endianness::Motorola => '0',
        }
    }

    /// Parses a DBC byte-order tag.
    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            '1' => Some(Endianness::Intel),
            '0' => Some(Endianness::Motorola),
            _ => None,
        }
    }

    /// Returns a human-readable name (`"Intel"` / `"Motorola"`).
    pub fn to_str(&self) -> &'static str {
        match self {
            Endianness::Intel => "Intel",
            Endianness::Motorola => "Motorola",
        }
    }
}
