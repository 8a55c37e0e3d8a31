use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use bytes::Buf;

use common::err::CResult;

/// Header of the `COM_STMT_PREPARE` response (`COM_STMT_PREPARE_OK`).
/// Column/parameter definition packets and their trailing EOFs follow this
/// header on the wire and are read separately.
#[derive(Debug, Clone)]
pub struct PrepareOkPacket {
    pub statement_id: u32,
    pub num_columns: u16,
    pub num_params: u16,
    pub warning_count: u16,
}

impl PrepareOkPacket {
    pub fn parse(packet: &[u8]) -> CResult<Self> {
        let mut cursor = Cursor::new(packet);

        let _status = cursor.read_u8()?;
        let statement_id = cursor.read_u32::<LittleEndian>()?;
        let num_columns = cursor.read_u16::<LittleEndian>()?;
        let num_params = cursor.read_u16::<LittleEndian>()?;
        let _reserved = cursor.read_u8()?;
        let warning_count = if cursor.has_remaining() {
            cursor.read_u16::<LittleEndian>()?
        } else {
            0
        };

        Ok(Self {
            statement_id,
            num_columns,
            num_params,
            warning_count,
        })
    }
}
