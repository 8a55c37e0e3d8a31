/// Ordering matters: `ssl_mode as u8 >= SslMode::Require as u8` is how the
/// handshake decides whether a server that doesn't advertise `CLIENT_SSL`
/// is a hard failure or a silent downgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SslMode {
    Disabled = 0,
    Preferred = 1,
    Require = 2,
    VerifyCa = 3,
    VerifyIdentity = 4,
}

impl Default for SslMode {
    fn default() -> Self {
        SslMode::Disabled
    }
}
