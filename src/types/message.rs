use serde::{Deserialize, Serialize};

use crate::types::{
    errors::{ModelError, NameKind},
    is_dbc_identifier,
    layout::BitMask,
    signal::Signal,
};

/// Payload lengths accepted for CAN FD frames, on top of the classic 0..=8.
const CAN_FD_SIZES: [u8; 7] = [12, 16, 20, 24, 32, 48, 64];

/// CAN message defined in the database.
///
/// Holds the numeric ID as written in the DBC (`id`, possibly carrying the
/// extended-frame flag in bit 31), the `name`, payload length (`size`), the
/// transmitting node (`sender`), the ordered list of its signals and the
/// transmission timing carried by the `GenMsgCycleTime` / `GenMsgSendType`
/// attributes.
#[derive(Default, Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    /// Numeric CAN ID as written in the DBC (base 10).
    pub id: u32,
    /// Message name, unique within the database.
    pub name: String,
    /// Payload length in bytes.
    pub size: u8,
    /// Transmitting node (ECU).
    pub sender: String,
    /// Signals that belong to this message, in declaration order.
    pub signals: Vec<Signal>,
    /// Associated comment (DBC `CM_ BO_` section).
    pub comment: String,
    /// Transmission period in milliseconds (`GenMsgCycleTime`).
    pub cycle_time: Option<u32>,
    /// Transmission mode (`GenMsgSendType`), e.g. `Cyclic` or `Event`.
    pub send_type: Option<String>,
}

impl Message {
    /// DBC marks extended (29-bit) identifiers by setting bit 31 of the ID.
    pub const EXTENDED_ID_FLAG: u32 = 0x8000_0000;
    /// Largest standard (11-bit) identifier.
    pub const MAX_STANDARD_ID: u32 = 0x7FF;
    /// Largest extended (29-bit) identifier.
    pub const MAX_EXTENDED_ID: u32 = 0x1FFF_FFFF;

    /// Creates a message without signals.
    pub fn new(id: u32, name: impl Into<String>, size: u8, sender: impl Into<String>) -> Self {
        Message {
            id,
            name: name.into(),
            size,
            sender: sender.into(),
            ..Default::default()
        }
    }

    /// Arbitration ID with the extended-frame flag stripped.
    pub fn frame_id(&self) -> u32 {
        self.id & !Self::EXTENDED_ID_FLAG
    }

    /// **Normalized** hexadecimal arbitration ID (`"0x..."`, uppercase).
    pub fn id_hex(&self) -> String {
        format!("0x{:X}", self.frame_id())
    }

    /// Standard or extended identifier, as told by the DBC flag in bit 31.
    ///
    /// An unflagged ID is a standard frame even when it does not fit 11 bits;
    /// [`lint`](crate::lint::lint) reports those.
    pub fn id_format(&self) -> IdFormat {
        if self.id & Self::EXTENDED_ID_FLAG != 0 {
            IdFormat::Extended
        } else {
            IdFormat::Standard
        }
    }

    /// Classic CAN or CAN FD, based on the payload length.
    pub fn frame_kind(&self) -> FrameKind {
        if self.size <= 8 {
            FrameKind::Can
        } else {
            FrameKind::CanFd
        }
    }

    /// Returns a `&Signal` given its name.
    pub fn get_signal_by_name(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.name == name)
    }

    /// Returns a `&mut Signal` given its name.
    pub fn get_signal_by_name_mut(&mut self, name: &str) -> Option<&mut Signal> {
        self.signals.iter_mut().find(|s| s.name == name)
    }

    /// Appends a signal after checking it against the message layout:
    /// unique name, valid numeric fields, fits the payload, no shared bits.
    ///
    /// Receiver names are not checked here since nodes live in the database;
    /// use [`Database::add_signal`](crate::Database::add_signal) for the full check.
    pub fn add_signal(&mut self, signal: Signal) -> Result<(), ModelError> {
        if self.get_signal_by_name(&signal.name).is_some() {
            return Err(ModelError::SignalAlreadyExists {
                message: self.name.clone(),
                signal: signal.name,
            });
        }
        signal.validate_in(&self.name, self.size)?;

        let mask: BitMask = signal.occupied_bits();
        for existing in &self.signals {
            if let Some(bit) = existing.occupied_bits().first_common(&mask) {
                return Err(ModelError::OverlappingSignals {
                    message: self.name.clone(),
                    first: existing.name.clone(),
                    second: signal.name,
                    bit,
                });
            }
        }

        self.signals.push(signal);
        Ok(())
    }

    /// Checks the message header and every signal in it.
    ///
    /// Everything that does not need the node list: name, ID range, payload
    /// size, signal validity, duplicate signal names and overlapping bits.
    pub fn validate_layout(&self) -> Result<(), ModelError> {
        self.validate_header()?;

        let mut used: Vec<(&str, BitMask)> = Vec::with_capacity(self.signals.len());
        for signal in &self.signals {
            if used.iter().any(|(name, _)| *name == signal.name) {
                return Err(ModelError::SignalAlreadyExists {
                    message: self.name.clone(),
                    signal: signal.name.clone(),
                });
            }
            signal.validate_in(&self.name, self.size)?;

            let mask: BitMask = signal.occupied_bits();
            if let Some((first, bit)) = used
                .iter()
                .find_map(|(name, other)| other.first_common(&mask).map(|bit| (*name, bit)))
            {
                return Err(ModelError::OverlappingSignals {
                    message: self.name.clone(),
                    first: first.to_string(),
                    second: signal.name.clone(),
                    bit,
                });
            }
            used.push((signal.name.as_str(), mask));
        }
        Ok(())
    }

    /// Name, ID and size checks.
    pub(crate) fn validate_header(&self) -> Result<(), ModelError> {
        if !is_dbc_identifier(&self.name) {
            return Err(ModelError::InvalidName {
                kind: NameKind::Message,
                name: self.name.clone(),
            });
        }
        if self.frame_id() > Self::MAX_EXTENDED_ID {
            return Err(ModelError::InvalidId {
                message: self.name.clone(),
                id: self.id,
            });
        }
        if !is_valid_size(self.size) {
            return Err(ModelError::InvalidSize {
                message: self.name.clone(),
                size: self.size,
            });
        }
        Ok(())
    }
}

/// Returns `true` for classic CAN (0..=8) and CAN FD payload lengths.
pub fn is_valid_size(size: u8) -> bool {
    size <= 8 || CAN_FD_SIZES.contains(&size)
}

/// CAN identifier format (standard 11-bit or extended 29-bit).
#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
pub enum IdFormat {
    #[default]
    Standard,
    Extended,
}

impl IdFormat {
    /// Returns a human-readable name for this CAN ID format.
    pub fn to_str(&self) -> &'static str {
        match self {
            IdFormat::Standard => "Standard",
            IdFormat::Extended => "Extended",
        }
    }
}

/// Frame flavour implied by the payload length.
#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
pub enum FrameKind {
    #[default]
    Can,
    CanFd,
}

impl FrameKind {
    /// Returns a user-friendly string (e.g., `"CAN"`, `"CAN FD"`).
    pub fn to_str(&self) -> &'static str {
        match self {
            FrameKind::Can => "CAN",
            FrameKind::CanFd => "CAN FD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::signal::Endianness;

    fn signal(name: &str, start_bit: u16, length: u16) -> Signal {
        Signal {
            name: name.to_string(),
            start_bit,
            length,
            max: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_id_helpers() {
        let msg = Message::new(0x123, "EngineData", 8, "ECU1");
        assert_eq!(msg.frame_id(), 0x123);
        assert_eq!(msg.id_hex(), "0x123");
        assert_eq!(msg.id_format(), IdFormat::Standard);
        assert_eq!(msg.frame_kind(), FrameKind::Can);

        let ext = Message::new(2527679645, "Motor_01", 8, "Motor");
        assert_eq!(ext.frame_id(), 0x16A9549D);
        assert_eq!(ext.id_hex(), "0x16A9549D");
        assert_eq!(ext.id_format(), IdFormat::Extended);

        let unflagged = Message::new(0x800, "Wide", 8, "Motor");
        assert_eq!(unflagged.id_format(), IdFormat::Standard);

        let fd = Message::new(0x10, "Fd", 64, "Motor");
        assert_eq!(fd.frame_kind(), FrameKind::CanFd);
        assert_eq!(fd.frame_kind().to_str(), "CAN FD");
    }

    #[test]
    fn test_valid_sizes() {
        for size in 0..=8 {
            assert!(is_valid_size(size));
        }
        for size in CAN_FD_SIZES {
            assert!(is_valid_size(size));
        }
        assert!(!is_valid_size(9));
        assert!(!is_valid_size(63));
        assert!(!is_valid_size(255));
    }

    #[test]
    fn test_add_signal_rejects_overlap() {
        let mut msg = Message::new(0x123, "EngineData", 8, "ECU1");
        msg.add_signal(signal("RPM", 0, 16)).unwrap();
        msg.add_signal(signal("Temp", 16, 8)).unwrap();

        let err = msg.add_signal(signal("Clash", 23, 2)).unwrap_err();
        assert_eq!(
            err,
            ModelError::OverlappingSignals {
                message: "EngineData".to_string(),
                first: "Temp".to_string(),
                second: "Clash".to_string(),
                bit: 23,
            }
        );
        assert_eq!(msg.signals.len(), 2);
    }

    #[test]
    fn test_add_signal_rejects_duplicate_name() {
        let mut msg = Message::new(0x123, "EngineData", 8, "ECU1");
        msg.add_signal(signal("RPM", 0, 16)).unwrap();
        let err = msg.add_signal(signal("RPM", 32, 8)).unwrap_err();
        assert!(matches!(err, ModelError::SignalAlreadyExists { .. }));
    }

    #[test]
    fn test_add_signal_rejects_overflow() {
        let mut msg = Message::new(0x123, "EngineData", 2, "ECU1");
        let err = msg.add_signal(signal("Wide", 8, 16)).unwrap_err();
        assert!(matches!(err, ModelError::Layout { .. }));
    }

    #[test]
    fn test_validate_layout_motorola_overlap() {
        let mut msg = Message::new(0x200, "Body", 2, "ECU1");
        msg.signals.push(Signal {
            byte_order: Endianness::Motorola,
            ..signal("Door", 7, 12)
        });
        msg.signals.push(signal("Lamp", 12, 1));
        // Door covers bits 7..0 and 15..12.
        assert_eq!(
            msg.validate_layout(),
            Err(ModelError::OverlappingSignals {
                message: "Body".to_string(),
                first: "Door".to_string(),
                second: "Lamp".to_string(),
                bit: 12,
            })
        );

        msg.signals[1].start_bit = 11;
        assert_eq!(msg.validate_layout(), Ok(()));
    }

    #[test]
    fn test_validate_header() {
        let msg = Message::new(0x123, "Engine Data", 8, "ECU1");
        assert!(matches!(
            msg.validate_layout(),
            Err(ModelError::InvalidName {
                kind: NameKind::Message,
                ..
            })
        ));

        let msg = Message::new(0x123, "EngineData", 9, "ECU1");
        assert!(matches!(
            msg.validate_layout(),
            Err(ModelError::InvalidSize { size: 9, .. })
        ));

        let msg = Message::new(0x4000_0000, "EngineData", 8, "ECU1");
        assert!(matches!(
            msg.validate_layout(),
            Err(ModelError::InvalidId { .. })
        ));
    }
}
