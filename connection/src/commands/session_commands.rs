//! Small fixed-shape commands: a one-byte tag plus an optional argument.
//! Grouped here because none of them warrant their own module the way the
//! handshake/auth and prepared-statement commands do.

use std::io;
use std::io::{Cursor, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::commands::command::CommandType;

pub struct PingCommand;

impl PingCommand {
    pub fn serialize(&self) -> Result<Vec<u8>, io::Error> {
        Ok(vec![CommandType::Ping as u8])
    }
}

pub struct QuitCommand;

impl QuitCommand {
    pub fn serialize(&self) -> Result<Vec<u8>, io::Error> {
        Ok(vec![CommandType::Quit as u8])
    }
}

pub struct DebugCommand;

impl DebugCommand {
    pub fn serialize(&self) -> Result<Vec<u8>, io::Error> {
        Ok(vec![CommandType::Debug as u8])
    }
}

pub struct StatisticsCommand;

impl StatisticsCommand {
    pub fn serialize(&self) -> Result<Vec<u8>, io::Error> {
        Ok(vec![CommandType::Statistics as u8])
    }
}

pub struct InitDbCommand {
    pub schema: String,
}

impl InitDbCommand {
    pub fn new(schema: String) -> Self {
        Self { schema }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, io::Error> {
        let mut vec = vec![CommandType::InitDb as u8];
        vec.write_all(self.schema.as_bytes())?;
        Ok(vec)
    }
}

pub struct ProcessKillCommand {
    pub connection_id: u32,
}

impl ProcessKillCommand {
    pub fn new(connection_id: u32) -> Self {
        Self { connection_id }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, io::Error> {
        let mut vec = Vec::new();
        let mut cursor = Cursor::new(&mut vec);
        cursor.write_u8(CommandType::ProcessKill as u8)?;
        cursor.write_u32::<LittleEndian>(self.connection_id)?;
        Ok(vec)
    }
}

pub struct RefreshCommand {
    pub subcommand: u8,
}

impl RefreshCommand {
    pub fn new(subcommand: u8) -> Self {
        Self { subcommand }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, io::Error> {
        Ok(vec![CommandType::Refresh as u8, self.subcommand])
    }
}

pub struct ShutdownCommand {
    pub shutdown_type: u8,
}

impl ShutdownCommand {
    pub fn new(shutdown_type: u8) -> Self {
        Self { shutdown_type }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, io::Error> {
        Ok(vec![CommandType::Shutdown as u8, self.shutdown_type])
    }
}
