use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use regex::Regex;

use common::err::{CResult, MySqlError};

use crate::packet::len_enc::read_null_term_string_with_cursor;

/// Initial handshake packet (Protocol::HandshakeV10).
#[derive(Debug, Clone)]
pub struct HandshakePacket {
    pub protocol_version: u8,
    pub server_version: String,
    pub server_version_tuple: (u8, u8, u16),
    pub connection_id: u32,
    pub scramble: String,
    pub server_capabilities: u64,
    pub server_collation: u8,
    pub status_flags: u16,
    pub auth_plugin_name: String,
}

impl HandshakePacket {
    pub fn parse(packet: &[u8]) -> CResult<Self> {
        let mut cursor = Cursor::new(packet);

        let protocol_version = cursor.read_u8()?;
        let server_version = read_null_term_string_with_cursor(&mut cursor)?;
        let connection_id = cursor.read_u32::<LittleEndian>()?;

        let mut scramble = [0u8; 8];
        cursor.read_exact(&mut scramble)?;
        // filler
        cursor.read_u8()?;

        let capabilities_lower = cursor.read_u16::<LittleEndian>()? as u64;
        let server_collation = cursor.read_u8()?;
        let status_flags = cursor.read_u16::<LittleEndian>()?;
        let capabilities_upper = cursor.read_u16::<LittleEndian>()? as u64;
        let server_capabilities = capabilities_lower | (capabilities_upper << 16);

        let auth_plugin_data_len = cursor.read_u8()?;

        // 10 reserved bytes
        let mut reserved = [0u8; 10];
        cursor.read_exact(&mut reserved)?;

        use crate::declar::capability_flags;
        let mut full_scramble = scramble.to_vec();
        if server_capabilities & capability_flags::CLIENT_SECURE_CONNECTION != 0 {
            let rest_len = std::cmp::max(13, auth_plugin_data_len as i32 - 8) as usize;
            let mut rest = vec![0u8; rest_len];
            cursor.read_exact(&mut rest)?;
            // last byte is a NULL terminator
            if let Some((_, head)) = rest.split_last() {
                full_scramble.extend_from_slice(head);
            }
        }

        let auth_plugin_name = if server_capabilities & capability_flags::CLIENT_PLUGIN_AUTH != 0 {
            let mut remaining = String::new();
            cursor.read_to_string(&mut remaining)?;
            remaining.trim_end_matches('\0').to_string()
        } else {
            String::new()
        };

        let server_version_tuple = parse_server_version(&server_version)?;

        Ok(Self {
            protocol_version,
            server_version,
            server_version_tuple,
            connection_id,
            scramble: String::from_utf8_lossy(&full_scramble).to_string(),
            server_capabilities,
            server_collation,
            status_flags,
            auth_plugin_name,
        })
    }
}

/// Matches the leading `major.minor.patch` triple the way a server version
/// string like `8.0.34-log` or `5.7.44` does. Rejects anything that doesn't
/// start with three dot-separated numbers.
fn parse_server_version(version: &str) -> CResult<(u8, u8, u16)> {
    let re = Regex::new(r"^(\d{1,2})\.(\d{1,2})\.(\d{1,3})").unwrap();
    let caps = re.captures(version).ok_or_else(|| {
        MySqlError::interface(format!("unparseable server version string: {version}"))
    })?;
    let major: u8 = caps[1].parse().unwrap();
    let minor: u8 = caps[2].parse().unwrap();
    let patch: u16 = caps[3].parse().unwrap();
    Ok((major, minor, patch))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_version_with_suffix() {
        assert_eq!(parse_server_version("8.0.34-log").unwrap(), (8, 0, 34));
    }

    #[test]
    fn rejects_non_numeric_version() {
        assert!(parse_server_version("not-a-version").is_err());
    }
}
