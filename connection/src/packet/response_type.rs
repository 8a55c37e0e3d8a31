/// First payload byte of a response packet. `OLD_PASSWORD` shares the EOF
/// tag value; the auth-response handler interprets it that way only at the
/// fixed protocol position right after the auth packet is sent, where a
/// pre-4.1 server signals it expects the old insecure password hash.
pub struct ResponseType;

impl ResponseType {
    pub const OK: u8 = 0x00;
    pub const OLD_PASSWORD: u8 = 0xfe;
    pub const END_OF_FILE: u8 = 0xfe;
    pub const LOCAL_INFILE: u8 = 0xfb;
    pub const ERROR: u8 = 0xff;
}
