//! Output flavours of the DBC encoder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Text layout produced by the encoder. The decoder accepts both.
#[derive(Default, Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Compact grammar: one `BU_` line per node, fixed-point floats with at
    /// least six decimals and a signal marker of the form `@<endian><sign><|scale|>`.
    #[default]
    Legacy,
    /// The layout written by common DBC editors: `NS_` keyword list, `BS_:`,
    /// single-line `BU_:`, `@<endian><sign>` marker, shortest exact floats and
    /// `Vector__XXX` for signals without receivers.
    Standard,
}

impl Dialect {
    pub fn to_str(&self) -> &'static str {
        match self {
            Dialect::Legacy => "legacy",
            Dialect::Standard => "standard",
        }
    }

    /// Renders a float the way this dialect writes numeric fields.
    ///
    /// Both layouts parse back to the same `f64` for every finite value.
    pub fn format_f64(&self, value: f64) -> String {
        // `Display` for f64 is the shortest exponent-free text that parses back exactly.
        let shortest: String = format!("{value}");
        match self {
            Dialect::Legacy => {
                let fixed: String = format!("{value:.6}");
                if fixed.parse::<f64>() == Ok(value) {
                    fixed
                } else {
                    shortest
                }
            }
            Dialect::Standard => shortest,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Returned when a dialect name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown dialect '{0}' (expected 'legacy' or 'standard')")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(Dialect::Legacy),
            "standard" => Ok(Dialect::Standard),
            _ => Err(UnknownDialect(s.to_string())),
        }
    }
}

/// Encoder settings.
///
/// Deserialisable so that it can be embedded in a caller's configuration file:
/// ```
/// use dbc_tools::{Dialect, EncodeOptions};
///
/// let opts: EncodeOptions = serde_json::from_str(r#"{ "dialect": "standard" }"#).unwrap();
/// assert_eq!(opts, EncodeOptions::standard());
/// assert_eq!(EncodeOptions::default().dialect, Dialect::Legacy);
/// ```
#[derive(Default, Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    pub dialect: Dialect,
}

impl EncodeOptions {
    pub fn legacy() -> Self {
        EncodeOptions {
            dialect: Dialect::Legacy,
        }
    }

    pub fn standard() -> Self {
        EncodeOptions {
            dialect: Dialect::Standard,
        }
    }
}

impl From<Dialect> for EncodeOptions {
    fn from(dialect: Dialect) -> Self {
        EncodeOptions { dialect }
    }
}
