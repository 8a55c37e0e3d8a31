use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use native_tls::Identity;

use common::charset::DEFAULT_CHARSET_ID;
use common::err::{CResult, MySqlError};

use crate::conn::ssl_mode::SslMode;
use crate::declar::capability_flags;

/// Settings used to connect to MySQL/MariaDB.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub hostname: String,
    pub port: u16,
    pub unix_socket: Option<String>,

    pub username: String,
    pub password: String,
    pub database: Option<String>,

    pub charset: String,
    pub collation: Option<String>,

    pub autocommit: bool,
    pub time_zone: Option<String>,
    pub sql_mode: Option<String>,

    pub get_warnings: bool,
    pub raise_on_warnings: bool,

    pub connection_timeout: Option<Duration>,
    pub client_flags: u64,
    pub compress: bool,

    pub buffered: bool,
    pub raw: bool,

    pub ssl_mode: SslMode,
    pub ssl_opts: Option<SslOpts>,

    pub use_unicode: bool,
    pub force_ipv6: bool,

    pub converter_class: Option<String>,
}

impl Default for ConnectionOptions {
    fn default() -> ConnectionOptions {
        ConnectionOptions {
            hostname: String::from("127.0.0.1"),
            port: 3306,
            unix_socket: None,
            username: String::new(),
            password: String::new(),
            database: None,
            charset: String::from("utf8"),
            collation: None,
            autocommit: false,
            time_zone: None,
            sql_mode: None,
            get_warnings: false,
            raise_on_warnings: false,
            connection_timeout: None,
            client_flags: 0,
            compress: false,
            buffered: false,
            raw: false,
            ssl_mode: SslMode::Disabled,
            ssl_opts: None,
            use_unicode: true,
            force_ipv6: false,
            converter_class: None,
        }
    }
}

impl ConnectionOptions {
    pub fn new_str(hostname: &str, port: u16, username: &str, password: &str) -> ConnectionOptions {
        ConnectionOptions::new(
            hostname.to_string(),
            port,
            username.to_string(),
            password.to_string(),
        )
    }

    pub fn new(hostname: String, port: u16, username: String, password: String) -> ConnectionOptions {
        ConnectionOptions {
            hostname,
            port,
            username,
            password,
            ..ConnectionOptions::default()
        }
    }

    pub fn update_auth(&mut self, username: String, password: String) {
        self.username = username;
        self.password = password;
    }

    /// `client_flags=n>0` replaces the capability set; a list of `[flag,
    /// -flag2]` adds `flag` and clears `flag2`; `0` or a malformed argument
    /// is a programming error.
    pub fn set_client_flags_replace(&mut self, flags: u64) -> CResult<()> {
        if flags == 0 {
            return Err(MySqlError::programming(
                "client_flags must be non-zero; use set_client_flags_delta to clear flags",
            ));
        }
        self.client_flags = flags;
        Ok(())
    }

    pub fn set_client_flags_delta(&mut self, deltas: &[i64]) -> CResult<()> {
        if deltas.is_empty() {
            return Err(MySqlError::programming(
                "client_flags delta list must not be empty",
            ));
        }
        for &delta in deltas {
            if delta == 0 {
                return Err(MySqlError::programming("client_flags delta must not be 0"));
            }
            if delta > 0 {
                self.client_flags |= delta as u64;
            } else {
                self.client_flags &= !((-delta) as u64);
            }
        }
        Ok(())
    }

    /// Resolved charset id, honoring the `charset`/`collation` config keys;
    /// falls back to the connector default if neither names a known entry.
    pub fn charset_id(&self) -> u8 {
        common::charset::charset_by_name(&self.charset, self.collation.as_deref())
            .map(|c| c.id)
            .unwrap_or(DEFAULT_CHARSET_ID)
    }

    /// Builds options from a loosely-typed key/value configuration map,
    /// applying compatibility aliases and rejecting unknown/forbidden keys
    /// the way a config-file-driven embedder would feed this in.
    pub fn from_config(mut config: HashMap<String, String>) -> CResult<ConnectionOptions> {
        if config.remove("dsn").is_some() {
            return Err(MySqlError::NotSupported(
                "the 'dsn' configuration key is not supported".to_string(),
            ));
        }

        if let Some(db) = config.remove("db") {
            config.entry("database".to_string()).or_insert(db);
        }
        if let Some(passwd) = config.remove("passwd") {
            config.entry("password".to_string()).or_insert(passwd);
        }
        if let Some(timeout) = config.remove("connect_timeout") {
            config
                .entry("connection_timeout".to_string())
                .or_insert(timeout);
        }

        const KNOWN_KEYS: &[&str] = &[
            "host",
            "port",
            "unix_socket",
            "user",
            "password",
            "database",
            "charset",
            "collation",
            "autocommit",
            "time_zone",
            "sql_mode",
            "get_warnings",
            "raise_on_warnings",
            "connection_timeout",
            "client_flags",
            "compress",
            "buffered",
            "raw",
            "ssl_ca",
            "ssl_cert",
            "ssl_key",
            "ssl_verify_cert",
            "use_unicode",
            "force_ipv6",
            "converter_class",
        ];
        for key in config.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                return Err(MySqlError::programming(format!(
                    "unknown configuration key: {key}"
                )));
            }
        }

        let mut opts = ConnectionOptions::default();
        if let Some(v) = config.remove("host") {
            opts.hostname = v;
        }
        if let Some(v) = config.remove("port") {
            opts.port = v
                .parse()
                .map_err(|_| MySqlError::programming("port must be an integer"))?;
        }
        opts.unix_socket = config.remove("unix_socket");
        if let Some(v) = config.remove("user") {
            opts.username = v;
        }
        if let Some(v) = config.remove("password") {
            opts.password = v;
        }
        opts.database = config.remove("database");
        if let Some(v) = config.remove("charset") {
            opts.charset = v;
        }
        opts.collation = config.remove("collation");
        if let Some(v) = config.remove("autocommit") {
            opts.autocommit = parse_bool(&v)?;
        }
        opts.time_zone = config.remove("time_zone");
        opts.sql_mode = config.remove("sql_mode");
        if let Some(v) = config.remove("get_warnings") {
            opts.get_warnings = parse_bool(&v)?;
        }
        if let Some(v) = config.remove("raise_on_warnings") {
            let value = parse_bool(&v)?;
            opts.raise_on_warnings = value;
            if value {
                opts.get_warnings = true;
            } else {
                opts.get_warnings = false;
            }
        }
        if let Some(v) = config.remove("connection_timeout") {
            opts.connection_timeout = Some(Duration::from_secs(
                v.parse()
                    .map_err(|_| MySqlError::programming("connection_timeout must be an integer"))?,
            ));
        }
        if let Some(v) = config.remove("client_flags") {
            opts.client_flags = v
                .parse()
                .map_err(|_| MySqlError::programming("client_flags must be an integer"))?;
        }
        if let Some(v) = config.remove("compress") {
            opts.compress = parse_bool(&v)?;
        }
        if let Some(v) = config.remove("buffered") {
            opts.buffered = parse_bool(&v)?;
        }
        if let Some(v) = config.remove("raw") {
            opts.raw = parse_bool(&v)?;
        }
        if let Some(v) = config.remove("use_unicode") {
            opts.use_unicode = parse_bool(&v)?;
        }
        if let Some(v) = config.remove("force_ipv6") {
            opts.force_ipv6 = parse_bool(&v)?;
        }
        opts.converter_class = config.remove("converter_class");

        let ssl_ca = config.remove("ssl_ca");
        let ssl_cert = config.remove("ssl_cert");
        let ssl_key = config.remove("ssl_key");
        let ssl_verify_cert = config
            .remove("ssl_verify_cert")
            .map(|v| parse_bool(&v))
            .transpose()?
            .unwrap_or(false);

        if ssl_ca.is_some() || ssl_cert.is_some() || ssl_key.is_some() || ssl_verify_cert {
            let (ca, cert, key) = match (ssl_ca, ssl_cert, ssl_key) {
                (Some(ca), Some(cert), Some(key)) => (ca, cert, key),
                _ => {
                    return Err(MySqlError::programming(
                        "ssl_ca, ssl_cert and ssl_key are all required once any SSL key is set",
                    ))
                }
            };
            opts.ssl_opts = Some(
                SslOpts::default()
                    .with_root_cert_path(Some(ca))
                    .with_client_identity(Some(ClientIdentity::new(cert, Some(key))))
                    .with_danger_accept_invalid_certs(!ssl_verify_cert),
            );
            opts.ssl_mode = SslMode::Require;
            opts.client_flags |= capability_flags::CLIENT_SSL;
        }

        Ok(opts)
    }
}

fn parse_bool(v: &str) -> CResult<bool> {
    match v {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(MySqlError::programming(format!(
            "expected a boolean, got '{other}'"
        ))),
    }
}

/// SSL configuration bag.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Default)]
pub struct SslOpts {
    client_identity: Option<ClientIdentity>,
    root_cert_path: Option<String>,
    skip_domain_validation: bool,
    accept_invalid_certs: bool,
}

impl SslOpts {
    pub fn with_client_identity(mut self, identity: Option<ClientIdentity>) -> Self {
        self.client_identity = identity;
        self
    }

    /// Supports `.der` and `.pem` (multi-cert) paths.
    pub fn with_root_cert_path(mut self, root_cert_path: Option<String>) -> Self {
        self.root_cert_path = root_cert_path;
        self
    }

    pub fn with_danger_skip_domain_validation(mut self, value: bool) -> Self {
        self.skip_domain_validation = value;
        self
    }

    pub fn with_danger_accept_invalid_certs(mut self, value: bool) -> Self {
        self.accept_invalid_certs = value;
        self
    }

    pub fn client_identity(&self) -> Option<&ClientIdentity> {
        self.client_identity.as_ref()
    }

    pub fn root_cert_path(&self) -> Option<&Path> {
        self.root_cert_path.as_ref().map(Path::new)
    }

    pub fn skip_domain_validation(&self) -> bool {
        self.skip_domain_validation
    }

    pub fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity {
    pkcs12_path: String,
    password: Option<String>,
}

impl ClientIdentity {
    pub fn new(pkcs12_path: String, password: Option<String>) -> Self {
        Self {
            pkcs12_path,
            password,
        }
    }

    pub fn with_password(mut self, pass: String) -> Self {
        self.password = Some(pass);
        self
    }

    pub fn pkcs12_path(&self) -> &Path {
        Path::new(&self.pkcs12_path)
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub(crate) fn load(&self) -> CResult<Identity> {
        let der = std::fs::read(&self.pkcs12_path)?;
        match Identity::from_pkcs12(&der, self.password.as_deref().unwrap_or("")) {
            Ok(identity) => Ok(identity),
            Err(err) => Err(MySqlError::operational(format!(
                "can not load client identity: {err}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_use_connector_defaults() {
        let opts = ConnectionOptions::default();
        assert_eq!(opts.hostname, "127.0.0.1");
        assert_eq!(opts.port, 3306);
        assert!(!opts.autocommit);
    }

    #[test]
    fn rejects_dsn_key() {
        let mut config = HashMap::new();
        config.insert("dsn".to_string(), "whatever".to_string());
        assert!(ConnectionOptions::from_config(config).is_err());
    }

    #[test]
    fn rejects_unknown_key() {
        let mut config = HashMap::new();
        config.insert("bogus".to_string(), "1".to_string());
        assert!(ConnectionOptions::from_config(config).is_err());
    }

    #[test]
    fn applies_compat_aliases() {
        let mut config = HashMap::new();
        config.insert("db".to_string(), "shop".to_string());
        config.insert("passwd".to_string(), "secret".to_string());
        let opts = ConnectionOptions::from_config(config).unwrap();
        assert_eq!(opts.database.as_deref(), Some("shop"));
        assert_eq!(opts.password, "secret");
    }

    #[test]
    fn raise_on_warnings_implies_get_warnings() {
        let mut config = HashMap::new();
        config.insert("raise_on_warnings".to_string(), "true".to_string());
        let opts = ConnectionOptions::from_config(config).unwrap();
        assert!(opts.get_warnings);
        assert!(opts.raise_on_warnings);
    }

    #[test]
    fn partial_ssl_keys_are_rejected() {
        let mut config = HashMap::new();
        config.insert("ssl_ca".to_string(), "ca.pem".to_string());
        assert!(ConnectionOptions::from_config(config).is_err());
    }
}
