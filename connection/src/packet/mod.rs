use common::err::{CResult, MySqlError};

use crate::packet::error_packet::ErrorPacket;
use crate::packet::response_type::ResponseType;

pub mod binary_row_packet;
pub mod end_of_file_packet;
pub mod error_packet;
pub mod handshake_packet;
pub mod len_enc;
pub mod ok_packet;
pub mod prepare_ok_packet;
pub mod response_type;
pub mod result_set_column_packet;
pub mod result_set_row_packet;

/// Checks a freshly-read packet for the ERR tag and, if present, decodes it
/// and classifies it into the server-error taxonomy.
pub fn check_error_packet(packet: &[u8], message: &str) -> CResult<()> {
    if packet[0] == ResponseType::ERROR {
        let error = ErrorPacket::parse(&packet[1..])?;
        return Err(MySqlError::from_server_error(
            error.error_code,
            error.sql_state,
            format!("{message} {}", error.error_message),
        ));
    }

    Ok(())
}
