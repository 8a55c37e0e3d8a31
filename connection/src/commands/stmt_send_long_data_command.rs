use std::io;
use std::io::{Cursor, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::commands::command::CommandType;

/// `COM_STMT_SEND_LONG_DATA`. Sent once per chunk, in
/// [`crate::LONG_DATA_CHUNK_SIZE`]-byte pieces (the final chunk may be
/// shorter); the server never replies to this command.
pub struct StmtSendLongDataCommand<'a> {
    pub statement_id: u32,
    pub param_index: u16,
    pub chunk: &'a [u8],
}

impl<'a> StmtSendLongDataCommand<'a> {
    pub fn new(statement_id: u32, param_index: u16, chunk: &'a [u8]) -> Self {
        Self {
            statement_id,
            param_index,
            chunk,
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, io::Error> {
        let mut vec = Vec::new();
        let mut cursor = Cursor::new(&mut vec);
        cursor.write_u8(CommandType::StmtSendLongData as u8)?;
        cursor.write_u32::<LittleEndian>(self.statement_id)?;
        cursor.write_u16::<LittleEndian>(self.param_index)?;
        cursor.write_all(self.chunk)?;
        Ok(vec)
    }
}
