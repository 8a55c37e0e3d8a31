use std::io;
use std::io::{Cursor, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::bytes::{encrypt_password, write_null_term_string};
use crate::commands::command::CommandType;
use crate::declar::auth_plugin_names::AuthPlugin;

/// `COM_CHANGE_USER` re-authenticates against the scramble from the
/// *original* handshake; it does not trigger a fresh handshake.
pub struct ChangeUserCommand {
    pub username: String,
    pub password: String,
    pub database: Option<String>,
    pub scramble: String,
    pub charset: u8,
    pub auth_plugin: AuthPlugin,
}

impl ChangeUserCommand {
    pub fn new(
        username: String,
        password: String,
        database: Option<String>,
        scramble: String,
        charset: u8,
        auth_plugin: AuthPlugin,
    ) -> Self {
        Self {
            username,
            password,
            database,
            scramble,
            charset,
            auth_plugin,
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, io::Error> {
        let mut vec = Vec::new();
        let mut cursor = Cursor::new(&mut vec);

        cursor.write_u8(CommandType::ChangeUser as u8)?;
        write_null_term_string(&mut cursor, &self.username)?;

        let encrypted = encrypt_password(&self.password, &self.scramble, &self.auth_plugin);
        cursor.write_u8(encrypted.len() as u8)?;
        cursor.write_all(&encrypted)?;

        match &self.database {
            Some(db) => write_null_term_string(&mut cursor, db)?,
            None => cursor.write_u8(0)?,
        }

        cursor.write_u16::<LittleEndian>(self.charset as u16)?;
        write_null_term_string(&mut cursor, &self.auth_plugin.name().to_string())?;

        Ok(vec)
    }
}
