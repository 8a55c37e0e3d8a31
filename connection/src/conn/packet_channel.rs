use std::fmt;
use std::fs::File;
use std::io;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
#[cfg(unix)]
use std::os::unix::net::UnixStream;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use native_tls::{Certificate, TlsConnector};

use common::err::{CResult, MySqlError};

use crate::conn::connection_options::ConnectionOptions;
use crate::PACKET_HEADER_SIZE;

#[derive(Debug)]
pub struct PacketChannel {
    stream: ChannelStream,
    compressed: bool,
    compressed_seq: u8,
}

impl PacketChannel {
    pub fn new(options: &ConnectionOptions) -> CResult<Self> {
        let stream = if let Some(path) = &options.unix_socket {
            connect_unix(path)?
        } else {
            ChannelStream::Tcp(connect_tcp(options)?)
        };

        if let Some(timeout) = options.connection_timeout {
            stream.set_read_timeout(Some(timeout))?;
        }

        Ok(Self {
            stream,
            compressed: false,
            compressed_seq: 0,
        })
    }

    pub fn is_ssl(&self) -> bool {
        matches!(self.stream, ChannelStream::Tls(_))
    }

    /// Switches this channel to the compressed framing variant. Called
    /// once, after handshake, when both sides negotiated `CLIENT_COMPRESS`.
    pub fn enable_compression(&mut self) {
        self.compressed = true;
        self.compressed_seq = 0;
    }

    pub fn read_packet(&mut self) -> CResult<(Vec<u8>, u8)> {
        if self.compressed {
            return self.read_compressed_packet();
        }

        let mut header_buffer = [0; PACKET_HEADER_SIZE];
        self.stream.read_exact(&mut header_buffer)?;
        let packet_size = (&header_buffer[0..3]).read_u24::<LittleEndian>()?;
        let seq_num = header_buffer[3];

        let mut packet: Vec<u8> = vec![0; packet_size as usize];
        self.stream.read_exact(&mut packet)?;

        Ok((packet, seq_num))
    }

    pub fn write_packet(&mut self, packet: &[u8], seq_num: u8) -> CResult<()> {
        if self.compressed {
            return self.write_compressed_packet(packet, seq_num);
        }

        let packet_len = packet.len() as u32;
        self.stream.write_u24::<LittleEndian>(packet_len)?;
        self.stream.write_u8(seq_num)?;
        self.stream.write_all(packet)?;
        Ok(())
    }

    /// Compressed-protocol framing wraps every plain packet in a
    /// `compressed_len + seq + uncompressed_len` header. Payloads under the
    /// zlib-worthwhile threshold are legally sent with `uncompressed_len=0`
    /// (meaning "not compressed"), which is the branch taken here; this
    /// crate does not depend on a zlib binding.
    fn write_compressed_packet(&mut self, packet: &[u8], seq_num: u8) -> CResult<()> {
        let mut inner = Vec::with_capacity(packet.len() + 4);
        inner.write_u24::<LittleEndian>(packet.len() as u32)?;
        inner.write_u8(seq_num)?;
        inner.write_all(packet)?;

        self.stream.write_u24::<LittleEndian>(inner.len() as u32)?;
        self.stream.write_u8(self.compressed_seq)?;
        self.stream.write_u24::<LittleEndian>(0)?;
        self.stream.write_all(&inner)?;
        self.compressed_seq = self.compressed_seq.wrapping_add(1);
        Ok(())
    }

    fn read_compressed_packet(&mut self) -> CResult<(Vec<u8>, u8)> {
        let mut header = [0u8; 7];
        self.stream.read_exact(&mut header)?;
        let compressed_len = (&header[0..3]).read_u24::<LittleEndian>()?;
        self.compressed_seq = header[3].wrapping_add(1);
        let uncompressed_len = (&header[4..7]).read_u24::<LittleEndian>()?;

        let mut body = vec![0u8; compressed_len as usize];
        self.stream.read_exact(&mut body)?;

        if uncompressed_len != 0 {
            return Err(MySqlError::not_supported(
                "zlib-compressed payloads are not supported by this build",
            ));
        }

        let mut cursor = io::Cursor::new(body.as_slice());
        let packet_size = cursor.read_u24::<LittleEndian>()?;
        let seq_num = cursor.read_u8()?;
        let mut packet = vec![0u8; packet_size as usize];
        cursor.read_exact(&mut packet)?;
        Ok((packet, seq_num))
    }

    pub fn close(&mut self) -> CResult<()> {
        self.stream.shutdown().or(Ok(()))
    }

    pub fn upgrade_to_ssl(self, options: &ConnectionOptions) -> CResult<Self> {
        if options.ssl_opts.is_none() {
            return Err(MySqlError::operational("the ssl options bag is empty"));
        }
        let ssl_opts = options.ssl_opts.clone().unwrap();

        let domain = options.hostname.clone();

        let mut builder = TlsConnector::builder();
        if let Some(root_cert_path) = ssl_opts.root_cert_path() {
            let mut root_cert_data = vec![];
            let mut root_cert_file = File::open(root_cert_path)?;
            root_cert_file.read_to_end(&mut root_cert_data)?;

            let root_certs = match Certificate::from_der(&root_cert_data)
                .map(|x| vec![x])
                .or_else(|_| {
                    pem::parse_many(&*root_cert_data)
                        .unwrap_or_default()
                        .iter()
                        .map(pem::encode)
                        .map(|s| Certificate::from_pem(s.as_bytes()))
                        .collect()
                }) {
                Ok(cert) => cert,
                Err(err) => {
                    return Err(MySqlError::operational(format!(
                        "the ssl cert can not be loaded: {err}"
                    )))
                }
            };

            for root_cert in root_certs {
                builder.add_root_certificate(root_cert);
            }
        }
        if let Some(client_identity) = ssl_opts.client_identity() {
            let identity = client_identity.load()?;
            builder.identity(identity);
        }
        builder.danger_accept_invalid_hostnames(ssl_opts.skip_domain_validation());
        builder.danger_accept_invalid_certs(ssl_opts.accept_invalid_certs());
        let tls_connector = match builder.build() {
            Ok(tls) => tls,
            Err(err) => return Err(MySqlError::operational(format!("can not build tls: {err}"))),
        };

        match self.stream {
            ChannelStream::Tcp(tcp_stream) => {
                let secure_stream = match tls_connector.connect(&domain, tcp_stream) {
                    Ok(stream) => stream,
                    Err(err) => {
                        return Err(MySqlError::operational(format!("can not connect tls: {err}")))
                    }
                };
                Ok(Self {
                    stream: ChannelStream::Tls(secure_stream),
                    compressed: self.compressed,
                    compressed_seq: self.compressed_seq,
                })
            }
            other => Ok(Self {
                stream: other,
                compressed: self.compressed,
                compressed_seq: self.compressed_seq,
            }),
        }
    }
}

fn connect_tcp(options: &ConnectionOptions) -> CResult<TcpStream> {
    if options.force_ipv6 {
        let addrs = (options.hostname.as_str(), options.port).to_socket_addrs()?;
        for addr in addrs {
            if addr.is_ipv6() {
                return Ok(TcpStream::connect(addr)?);
            }
        }
        return Err(MySqlError::operational(format!(
            "{} has no IPv6 address and force_ipv6 is set",
            options.hostname
        )));
    }

    Ok(TcpStream::connect((options.hostname.as_str(), options.port))?)
}

#[cfg(unix)]
fn connect_unix(path: &str) -> CResult<ChannelStream> {
    Ok(ChannelStream::Unix(UnixStream::connect(path)?))
}

#[cfg(not(unix))]
fn connect_unix(_path: &str) -> CResult<ChannelStream> {
    Err(MySqlError::not_supported(
        "unix domain sockets are not supported on this platform",
    ))
}

enum ChannelStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
    Tls(native_tls::TlsStream<TcpStream>),
}

impl ChannelStream {
    fn shutdown(&mut self) -> io::Result<()> {
        match self {
            ChannelStream::Tcp(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(unix)]
            ChannelStream::Unix(stream) => stream.shutdown(Shutdown::Both),
            ChannelStream::Tls(stream) => stream.shutdown(),
        }
    }

    fn set_read_timeout(&self, timeout: Option<std::time::Duration>) -> io::Result<()> {
        match self {
            ChannelStream::Tcp(stream) => stream.set_read_timeout(timeout),
            #[cfg(unix)]
            ChannelStream::Unix(stream) => stream.set_read_timeout(timeout),
            ChannelStream::Tls(stream) => stream.get_ref().set_read_timeout(timeout),
        }
    }
}

impl Write for ChannelStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ChannelStream::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            ChannelStream::Unix(stream) => stream.write(buf),
            ChannelStream::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ChannelStream::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            ChannelStream::Unix(stream) => stream.flush(),
            ChannelStream::Tls(stream) => stream.flush(),
        }
    }
}

impl Read for ChannelStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ChannelStream::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            ChannelStream::Unix(stream) => stream.read(buf),
            ChannelStream::Tls(stream) => stream.read(buf),
        }
    }
}

impl fmt::Debug for ChannelStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelStream::Tcp(s) => write!(f, "Tcp stream {:?}", s),
            #[cfg(unix)]
            ChannelStream::Unix(s) => write!(f, "Unix stream {:?}", s),
            ChannelStream::Tls(s) => write!(f, "Tls stream {:?}", s),
        }
    }
}
