use crate::types::{
    database::Database,
    message::Message,
    signal::{Endianness, Signal},
};

/// Builds the reference network: two ECUs and one engine message.
///
/// `ECU1` sends `EngineData` (ID `0x123`, 8 bytes) carrying a 16-bit Intel
/// `RPM` signal with a 0.25 rpm resolution, received by `ECU2`. The CLI
/// `generate` command writes exactly this database.
pub fn reference_database() -> Database {
    let rpm: Signal = Signal {
        name: "RPM".to_string(),
        start_bit: 0,
        length: 16,
        byte_order: Endianness::Intel,
        signed: false,
        scale: 0.25,
        offset: 0.0,
        min: 0.0,
        max: 16383.75,
        unit: "rpm".to_string(),
        receivers: vec!["ECU2".to_string()],
        ..Default::default()
    };
    let mut engine: Message = Message::new(0x123, "EngineData", 8, "ECU1");
    engine.signals.push(rpm);

    Database {
        version: "1.0".to_string(),
        nodes: vec!["ECU1".into(), "ECU2".into()],
        messages: vec![engine],
        comment: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_database_is_valid() {
        let db: Database = reference_database();
        assert_eq!(db.validate(), Ok(()));
        assert_eq!(db.messages[0].id, 291);
        assert_eq!(db.messages[0].signals[0].physical_range(), (0.0, 16383.75));
    }
}
