use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use common::err::CResult;

use crate::packet::response_type::ResponseType;

#[derive(Debug, Clone)]
pub struct EndOfFilePacket {
    pub warning_count: u16,
    pub server_status: u16,
}

impl EndOfFilePacket {
    pub fn parse(packet: &[u8]) -> CResult<Self> {
        let mut cursor = Cursor::new(packet);

        let warning_count = cursor.read_u16::<LittleEndian>()?;
        let server_status = cursor.read_u16::<LittleEndian>()?;

        Ok(Self {
            warning_count,
            server_status,
        })
    }

    /// An 0xFE-tagged packet shorter than 9 bytes is an EOF marker; at or
    /// above 9 bytes the same tag value is a length-encoded integer inside
    /// row data, not EOF.
    pub fn is_eof(packet: &[u8]) -> bool {
        if packet.is_empty() || packet.len() >= 9 {
            return false;
        }
        packet[0] == ResponseType::END_OF_FILE
    }
}
