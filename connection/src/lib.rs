use std::time::Duration;

pub mod commands;
pub mod conn;
pub mod declar;
pub mod packet;
pub mod value;

pub mod bytes;

/// Packet constants
pub const PACKET_HEADER_SIZE: usize = 4;
pub const MAX_BODY_LENGTH: usize = 16777215;
pub const NULL_TERMINATOR: u8 = 0;
pub const UTF8_MB4_GENERAL_CI: u8 = 45;

/// Bytes per `STMT_SEND_LONG_DATA` chunk.
pub const LONG_DATA_CHUNK_SIZE: usize = 8192;

/// Bytes per `LOAD DATA LOCAL INFILE` chunk (`NET_BUFFER_LENGTH-16`).
pub const LOCAL_INFILE_CHUNK_SIZE: usize = 16384 - 16;

/// Timeout constants. Takes into account network latency.
pub const TIMEOUT_LATENCY_DELTA: Duration = Duration::from_secs(10);
