//! End-to-end tests against an in-process TCP listener that plays back
//! scripted packet bytes, exercising the handshake, authentication, and
//! query flow without requiring a real MySQL server.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use connection::conn::connection::Connection;
use connection::conn::connection_options::ConnectionOptions;

fn packet(seq: u8, payload: &[u8]) -> Vec<u8> {
    let len = payload.len() as u32;
    let mut out = vec![
        (len & 0xff) as u8,
        ((len >> 8) & 0xff) as u8,
        ((len >> 16) & 0xff) as u8,
        seq,
    ];
    out.extend_from_slice(payload);
    out
}

/// A minimal protocol-v10 handshake with `CLIENT_PROTOCOL_41` and
/// `mysql_native_password`, no SSL, no auth-plugin switch.
fn handshake_payload() -> Vec<u8> {
    let mut body = Vec::new();
    body.push(10u8); // protocol_version
    body.extend_from_slice(b"8.0.34-test\0"); // server_version
    body.extend_from_slice(&1u32.to_le_bytes()); // connection_id
    body.extend_from_slice(b"AUTHDATA"); // auth_plugin_data_part_1 (8 bytes)
    body.push(0); // filler
    let capability_flags_lower = 0xa20fu16; // PROTOCOL_41 | SECURE_CONNECTION | ... (lower word)
    body.extend_from_slice(&capability_flags_lower.to_le_bytes());
    body.push(45); // character_set (utf8mb4_general_ci)
    body.extend_from_slice(&2u16.to_le_bytes()); // status_flags
    let capability_flags_upper = 0x0008u16; // CLIENT_PLUGIN_AUTH
    body.extend_from_slice(&capability_flags_upper.to_le_bytes());
    body.push(21); // auth_plugin_data_len
    body.extend_from_slice(&[0u8; 10]); // reserved
    body.extend_from_slice(b"DATASALT1234\0"); // auth_plugin_data_part_2: 13 bytes, last is the NUL terminator
    body.extend_from_slice(b"mysql_native_password\0");
    body
}

fn spawn_scripted_server(responses: Vec<Vec<u8>>) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind scripted server");
    let port = listener.local_addr().unwrap().port();

    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let handshake = packet(0, &handshake_payload());
            let _ = stream.write_all(&handshake);

            // Drain the client's auth response before replying OK.
            let mut header = [0u8; 4];
            if stream.read_exact(&mut header).is_ok() {
                let len = (header[0] as usize) | ((header[1] as usize) << 8) | ((header[2] as usize) << 16);
                let mut body = vec![0u8; len];
                let _ = stream.read_exact(&mut body);
            }

            for response in responses {
                let _ = stream.write_all(&response);
                // Drain whatever the client sends next, if anything, so
                // the connection doesn't stall waiting on us.
                let mut header = [0u8; 4];
                stream.set_nonblocking(true).ok();
                let _ = stream.read(&mut header);
                stream.set_nonblocking(false).ok();
            }
        }
    });

    port
}

fn test_options(port: u16) -> ConnectionOptions {
    let mut opts = ConnectionOptions::new_str("127.0.0.1", port, "root", "");
    opts.database = None;
    opts.autocommit = false;
    opts.sql_mode = None;
    opts.time_zone = None;
    opts
}

fn ok_packet_body(status_flags: u16) -> Vec<u8> {
    let mut body = vec![0x00]; // OK header
    body.push(0); // affected_rows (len-enc: 0)
    body.push(0); // last_insert_id (len-enc: 0)
    body.extend_from_slice(&status_flags.to_le_bytes());
    body.extend_from_slice(&0u16.to_le_bytes()); // warnings
    body
}

#[test]
fn handshake_and_auth_ok_opens_connection() {
    let ok = packet(2, &ok_packet_body(2));
    let port = spawn_scripted_server(vec![ok]);

    let mut conn = Connection::new(test_options(port));
    conn.open().expect("handshake + auth should succeed");
    assert!(conn.is_open());
    assert_eq!(conn.server_version(), "8.0.34-test");
    assert_eq!(conn.connection_id(), 1);
}

#[test]
fn query_without_rows_returns_ok_result() {
    // one OK for auth (in do_handshake), then an OK for the `query()` call
    // issued inside apply_session_defaults (SET NAMES), then the actual
    // test query's OK.
    let auth_ok = packet(2, &ok_packet_body(2));
    let set_names_ok = packet(1, &ok_packet_body(2));
    let query_ok = packet(1, &ok_packet_body(2));
    let port = spawn_scripted_server(vec![auth_ok, set_names_ok, query_ok]);

    let mut opts = test_options(port);
    opts.charset = "utf8mb4".to_string();
    opts.collation = None;
    let mut conn = Connection::new(opts);
    conn.open().expect("open should succeed");

    let result = conn.query("DELETE FROM t WHERE id = 1");
    assert!(result.is_ok(), "expected OK result: {:?}", result.err());
}

#[test]
fn connecting_to_a_dead_port_fails_cleanly() {
    // Bind then immediately drop, so the port is (almost certainly)
    // refused on connect.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut conn = Connection::new(test_options(port));
    assert!(conn.open().is_err());
    assert!(!conn.is_open());
}

#[test]
fn commands_are_rejected_before_open() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut conn = Connection::new(test_options(port));
    assert!(conn.ping().is_err());
    assert!(conn.query("SELECT 1").is_err());
}
