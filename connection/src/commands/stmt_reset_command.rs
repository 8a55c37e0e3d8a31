use std::io;
use std::io::Cursor;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::commands::command::CommandType;

pub struct StmtResetCommand {
    pub statement_id: u32,
}

impl StmtResetCommand {
    pub fn new(statement_id: u32) -> Self {
        Self { statement_id }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, io::Error> {
        let mut vec = Vec::new();
        let mut cursor = Cursor::new(&mut vec);
        cursor.write_u8(CommandType::StmtReset as u8)?;
        cursor.write_u32::<LittleEndian>(self.statement_id)?;
        Ok(vec)
    }
}
