use std::io;
use std::io::Cursor;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::commands::command::CommandType;

/// `COM_STMT_CLOSE`. No response is ever sent back by the server, so this
/// is idempotent — closing an already-closed statement id is a silent
/// no-op as far as the wire is concerned.
pub struct StmtCloseCommand {
    pub statement_id: u32,
}

impl StmtCloseCommand {
    pub fn new(statement_id: u32) -> Self {
        Self { statement_id }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, io::Error> {
        let mut vec = Vec::new();
        let mut cursor = Cursor::new(&mut vec);
        cursor.write_u8(CommandType::StmtClose as u8)?;
        cursor.write_u32::<LittleEndian>(self.statement_id)?;
        Ok(vec)
    }
}
