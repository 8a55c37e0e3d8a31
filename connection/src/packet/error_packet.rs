use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use common::err::CResult;

#[derive(Debug, Clone)]
pub struct ErrorPacket {
    pub error_code: u16,
    pub sql_state: String,
    pub error_message: String,
}

impl ErrorPacket {
    /// `packet` is the payload after the 0xFF tag byte.
    pub fn parse(packet: &[u8]) -> CResult<Self> {
        let mut cursor = Cursor::new(packet);
        let error_code = cursor.read_u16::<LittleEndian>()?;

        // Protocol41 errors carry a '#' + 5-byte SQLSTATE marker; pre-4.1
        // servers (never seen in practice here) omit it.
        let marker = packet.get(2).copied();
        let sql_state = if marker == Some(b'#') {
            cursor.set_position(3);
            let mut state = [0u8; 5];
            cursor.read_exact(&mut state)?;
            String::from_utf8_lossy(&state).to_string()
        } else {
            String::new()
        };

        let mut message = String::new();
        cursor.read_to_string(&mut message)?;

        Ok(Self {
            error_code,
            sql_state,
            error_message: message,
        })
    }
}
