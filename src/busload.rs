//! # busload
//!
//! Worst-case bus load from message cycle times.
//!
//! Each scheduled message contributes `frame_time / cycle_time`. Frame times
//! are worst-case (full bit stuffing) for the message's payload length:
//! - classic CAN: 70 overhead bits plus 8 bits per byte at the nominal rate
//!   (134 bits for an 8-byte frame);
//! - CAN FD: 30 arbitration bits at the nominal rate, then 40 overhead bits
//!   plus 8 bits per byte at the data rate.
//!
//! Messages without a cycle time (event-driven or unknown) are not counted.

use serde::Serialize;
use std::fmt;

use crate::types::{database::Database, message::Message};

const CLASSIC_OVERHEAD_BITS: f64 = 70.0;
const FD_ARBITRATION_BITS: f64 = 30.0;
const FD_DATA_OVERHEAD_BITS: f64 = 40.0;

/// Bit rates of a CAN bus. `data` is set for CAN FD buses with bit-rate switching.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize)]
pub struct BusSpeed {
    /// Nominal (arbitration) bit rate in bit/s.
    pub nominal: u32,
    /// Data-phase bit rate in bit/s.
    pub data: Option<u32>,
}

impl BusSpeed {
    pub const CAN_500K: BusSpeed = BusSpeed::classic(500_000);
    pub const CAN_1M: BusSpeed = BusSpeed::classic(1_000_000);
    pub const CANFD_2M: BusSpeed = BusSpeed::fd(500_000, 2_000_000);
    pub const CANFD_5M: BusSpeed = BusSpeed::fd(500_000, 5_000_000);

    /// The speeds a network is usually sized against.
    pub const PRESETS: [BusSpeed; 4] = [
        BusSpeed::CAN_500K,
        BusSpeed::CAN_1M,
        BusSpeed::CANFD_2M,
        BusSpeed::CANFD_5M,
    ];

    pub const fn classic(nominal: u32) -> Self {
        BusSpeed {
            nominal,
            data: None,
        }
    }

    pub const fn fd(nominal: u32, data: u32) -> Self {
        BusSpeed {
            nominal,
            data: Some(data),
        }
    }

    /// Worst-case time on the wire, in seconds, of a frame carrying `size` bytes.
    pub fn frame_time(&self, size: u8) -> f64 {
        let payload_bits: f64 = 8.0 * f64::from(size);
        match self.data {
            None => (CLASSIC_OVERHEAD_BITS + payload_bits) / f64::from(self.nominal),
            Some(data) => {
                FD_ARBITRATION_BITS / f64::from(self.nominal)
                    + (FD_DATA_OVERHEAD_BITS + payload_bits) / f64::from(data)
            }
        }
    }
}

impl fmt::Display for BusSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data {
            None => write!(f, "CAN {}", format_rate(self.nominal)),
            Some(data) => write!(
                f,
                "CAN FD {}, data {}",
                format_rate(self.nominal),
                format_rate(data)
            ),
        }
    }
}

fn format_rate(rate: u32) -> String {
    if rate % 1_000_000 == 0 {
        format!("{} Mbit/s", rate / 1_000_000)
    } else {
        format!("{} kbit/s", rate / 1_000)
    }
}

/// How comfortable a load is.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadRating {
    /// Below 10 %.
    Low,
    /// Up to 15 %.
    Moderate,
    /// Up to 30 %.
    Elevated,
    /// Up to 40 %.
    High,
    /// Above 40 %: the bus should be split or moved to a faster speed.
    Critical,
}

impl LoadRating {
    pub fn from_load(load: f64) -> Self {
        match load {
            l if l < 0.10 => LoadRating::Low,
            l if l <= 0.15 => LoadRating::Moderate,
            l if l <= 0.30 => LoadRating::Elevated,
            l if l <= 0.40 => LoadRating::High,
            _ => LoadRating::Critical,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            LoadRating::Low => "low",
            LoadRating::Moderate => "moderate",
            LoadRating::Elevated => "elevated",
            LoadRating::High => "high",
            LoadRating::Critical => "critical",
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct MessageLoad {
    pub message: String,
    /// Cycle time in milliseconds.
    pub cycle_time: u32,
    /// Fraction of the bus capacity (1.0 = 100 %).
    pub load: f64,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct BusLoad {
    pub speed: BusSpeed,
    /// Per-message contributions, in model order.
    pub messages: Vec<MessageLoad>,
    /// Sum of all contributions (1.0 = 100 %).
    pub total: f64,
    /// Messages left out for lack of a cycle time.
    pub unscheduled: usize,
}

impl BusLoad {
    pub fn rating(&self) -> LoadRating {
        LoadRating::from_load(self.total)
    }
}

/// Estimates the load `db` puts on a bus running at `speed`.
///
/// # Example
/// ```
/// use dbc_tools::{busload::{self, BusSpeed, LoadRating}, dbc};
///
/// let mut db = dbc::reference_database();
/// db.messages[0].cycle_time = Some(10);
///
/// let load = busload::estimate(&db, BusSpeed::CAN_500K);
/// assert!((load.total - 0.0268).abs() < 1e-9);
/// assert_eq!(load.rating(), LoadRating::Low);
/// ```
pub fn estimate(db: &Database, speed: BusSpeed) -> BusLoad {
    let mut messages: Vec<MessageLoad> = Vec::with_capacity(db.messages.len());
    let mut unscheduled: usize = 0;

    for message in &db.messages {
        match message.cycle_time {
            Some(cycle_time) if cycle_time > 0 => {
                messages.push(MessageLoad {
                    message: message.name.clone(),
                    cycle_time,
                    load: message_load(message, cycle_time, speed),
                });
            }
            _ => {
                log::debug!("{}: no cycle time, not counted in the bus load", message.name);
                unscheduled += 1;
            }
        }
    }

    let total: f64 = messages.iter().map(|m| m.load).sum();
    BusLoad {
        speed,
        messages,
        total,
        unscheduled,
    }
}

fn message_load(message: &Message, cycle_time: u32, speed: BusSpeed) -> f64 {
    speed.frame_time(message.size) * 1000.0 / f64::from(cycle_time)
}
