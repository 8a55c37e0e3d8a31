use std::io;
use std::io::{Cursor, Write};

use byteorder::WriteBytesExt;

use crate::commands::command::CommandType;

pub struct StmtPrepareCommand {
    pub statement: String,
}

impl StmtPrepareCommand {
    pub fn new(statement: String) -> Self {
        Self { statement }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, io::Error> {
        let mut vec = Vec::new();
        let mut cursor = Cursor::new(&mut vec);

        cursor.write_u8(CommandType::StmtPrepare as u8)?;
        cursor.write_all(self.statement.as_bytes())?;

        Ok(vec)
    }
}
