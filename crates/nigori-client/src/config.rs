//! Client configuration, passed explicitly to every client.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use nigori_crypto::BlockCipher;

use crate::error::ClientError;

/// Default timeout for HTTP requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout (10 seconds).
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A remote store's host and port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| ClientError::Config(format!("expected host:port, got {s:?}")))?;
        if host.is_empty() {
            return Err(ClientError::Config(format!("missing host in {s:?}")));
        }
        let port = port
            .parse()
            .map_err(|_| ClientError::Config(format!("invalid port in {s:?}")))?;
        Ok(Self::new(host, port))
    }
}

/// URL scheme used to reach every endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Settings shared by all operations of one client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Home store: where plain resources and the split topology live.
    pub endpoint: Endpoint,
    pub cipher: BlockCipher,
    pub scheme: Scheme,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::new("localhost", 8080),
            cipher: BlockCipher::default(),
            scheme: Scheme::default(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            ..Self::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_cipher(mut self, cipher: BlockCipher) -> Self {
        self.cipher = cipher;
        self
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Base URL for `endpoint`, e.g. `http://localhost:8080`.
    pub fn base_url(&self, endpoint: &Endpoint) -> String {
        format!("{}://{}", self.scheme.as_str(), endpoint)
    }
}
