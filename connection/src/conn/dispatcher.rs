//! Classifies the first packet that follows a command and drives whatever
//! sub-protocol that tag implies: a plain `OkPacket`, an end-of-metadata
//! `EOF`, the `LOCAL INFILE` file-upload exchange, or a result-set
//! `ColumnCount` that kicks off column-definition + row reading.

use std::fs::File;
use std::io::Read;

use common::err::{CResult, MySqlError};

use crate::conn::packet_channel::PacketChannel;
use crate::packet::binary_row_packet::parse_binary_row;
use crate::packet::check_error_packet;
use crate::packet::end_of_file_packet::EndOfFilePacket;
use crate::packet::len_enc::read_len_enc_num;
use crate::packet::ok_packet::OkPacket;
use crate::packet::response_type::ResponseType;
use crate::packet::result_set_column_packet::ResultSetColumnPacket;
use crate::packet::result_set_row_packet::ResultSetRowPacket;
use crate::value::Row;
use crate::LOCAL_INFILE_CHUNK_SIZE;

pub enum PacketKind {
    Ok(OkPacket),
    Eof(EndOfFilePacket),
    LocalInfile(String),
    ColumnCount(u64),
}

pub fn classify_first_packet(packet: &[u8]) -> CResult<PacketKind> {
    check_error_packet(packet, "Command response error.")?;

    match packet[0] {
        ResponseType::OK => Ok(PacketKind::Ok(OkPacket::parse(packet)?)),
        ResponseType::END_OF_FILE if EndOfFilePacket::is_eof(packet) => {
            Ok(PacketKind::Eof(EndOfFilePacket::parse(&packet[1..])?))
        }
        ResponseType::LOCAL_INFILE => {
            let filename = String::from_utf8_lossy(&packet[1..]).into_owned();
            Ok(PacketKind::LocalInfile(filename))
        }
        _ => {
            let mut cursor = std::io::Cursor::new(packet);
            let (_, column_count) = read_len_enc_num(&mut cursor)?;
            Ok(PacketKind::ColumnCount(column_count))
        }
    }
}

/// Reads `count` column-definition packets followed by the metadata EOF.
pub fn read_column_defs(
    channel: &mut PacketChannel,
    count: u64,
) -> CResult<Vec<ResultSetColumnPacket>> {
    let mut columns = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (packet, _) = channel.read_packet()?;
        check_error_packet(&packet, "Reading column definition error.")?;
        columns.push(ResultSetColumnPacket::parse(&packet)?);
    }

    let (packet, _) = channel.read_packet()?;
    check_error_packet(&packet, "Reading column metadata EOF error.")?;
    if !EndOfFilePacket::is_eof(&packet) {
        return Err(MySqlError::internal(
            "expected EOF packet after column definitions",
        ));
    }

    Ok(columns)
}

/// One row, or the terminator that ends a result set.
pub enum RowOrEof {
    Row(Row),
    Eof(EndOfFilePacket),
}

pub fn read_one_text_row(channel: &mut PacketChannel) -> CResult<RowOrEof> {
    let (packet, _) = channel.read_packet()?;
    check_error_packet(&packet, "Reading result row error.")?;
    if EndOfFilePacket::is_eof(&packet) {
        return Ok(RowOrEof::Eof(EndOfFilePacket::parse(&packet[1..])?));
    }
    let row = ResultSetRowPacket::parse(&packet)?;
    Ok(RowOrEof::Row(Row::from_text_cells(row.cells)))
}

pub fn read_one_binary_row(
    channel: &mut PacketChannel,
    columns: &[ResultSetColumnPacket],
) -> CResult<RowOrEof> {
    let (packet, _) = channel.read_packet()?;
    check_error_packet(&packet, "Reading binary result row error.")?;
    if EndOfFilePacket::is_eof(&packet) {
        return Ok(RowOrEof::Eof(EndOfFilePacket::parse(&packet[1..])?));
    }
    Ok(RowOrEof::Row(parse_binary_row(&packet, columns)?))
}

/// Reads every remaining text-protocol row up to the terminating EOF.
pub fn read_text_rows(channel: &mut PacketChannel) -> CResult<(Vec<Row>, EndOfFilePacket)> {
    let mut rows = Vec::new();
    loop {
        match read_one_text_row(channel)? {
            RowOrEof::Row(row) => rows.push(row),
            RowOrEof::Eof(eof) => return Ok((rows, eof)),
        }
    }
}

/// Reads every remaining binary-protocol row up to the terminating EOF.
pub fn read_binary_rows(
    channel: &mut PacketChannel,
    columns: &[ResultSetColumnPacket],
) -> CResult<(Vec<Row>, EndOfFilePacket)> {
    let mut rows = Vec::new();
    loop {
        match read_one_binary_row(channel, columns)? {
            RowOrEof::Row(row) => rows.push(row),
            RowOrEof::Eof(eof) => return Ok((rows, eof)),
        }
    }
}

/// Drives the `LOCAL INFILE` sub-protocol: streams the requested file in
/// [`LOCAL_INFILE_CHUNK_SIZE`] chunks, terminated by an empty packet, and
/// returns the OK packet the server sends once it has consumed the data.
/// If the file can't be opened, an empty packet is still sent (the server
/// is waiting for *something*) before the error is raised.
pub fn handle_local_infile(
    channel: &mut PacketChannel,
    filename: &str,
    mut seq_num: u8,
) -> CResult<OkPacket> {
    let file = match File::open(filename) {
        Ok(file) => file,
        Err(err) => {
            seq_num = seq_num.wrapping_add(1);
            channel.write_packet(&[], seq_num)?;
            let (packet, _) = channel.read_packet()?;
            check_error_packet(&packet, "LOCAL INFILE open error.")?;
            return Err(MySqlError::interface(format!(
                "could not open {filename} for LOCAL INFILE: {err}"
            )));
        }
    };

    let mut reader = file;
    let mut buf = vec![0u8; LOCAL_INFILE_CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        seq_num = seq_num.wrapping_add(1);
        channel.write_packet(&buf[..n], seq_num)?;
    }

    seq_num = seq_num.wrapping_add(1);
    channel.write_packet(&[], seq_num)?;

    let (packet, _) = channel.read_packet()?;
    check_error_packet(&packet, "LOCAL INFILE completion error.")?;
    OkPacket::parse(&packet)
}
