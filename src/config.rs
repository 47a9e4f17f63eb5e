//! Connection configuration.
//!
//! The configuration enumerates everything the protocol core needs to open
//! and drive a connection. Nothing here reads config files or command lines;
//! the embedder assembles a [`Config`] and hands it over.

use std::time::Duration;

use crate::error::{BoltError, BoltResult};
use crate::handshake::BoltVersion;
use crate::message::AuthToken;

/// Default Bolt port.
pub const DEFAULT_PORT: u16 = 7687;

/// Default PULL batch size.
pub const DEFAULT_FETCH_SIZE: i64 = 1000;

/// URI schemes and the transport security they imply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    /// `bolt://`: plain TCP
    #[default]
    Bolt,
    /// `bolt+s://`: TLS with full chain verification
    BoltS,
    /// `bolt+ssc://`: TLS accepting self-signed certificates
    BoltSsc,
    /// `neo4j://`: plain TCP
    Neo4j,
    /// `neo4j+s://`: TLS with full chain verification
    Neo4jS,
    /// `neo4j+ssc://`: TLS accepting self-signed certificates
    Neo4jSsc,
}

impl Scheme {
    /// Parse a scheme string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bolt" => Some(Scheme::Bolt),
            "bolt+s" => Some(Scheme::BoltS),
            "bolt+ssc" => Some(Scheme::BoltSsc),
            "neo4j" => Some(Scheme::Neo4j),
            "neo4j+s" => Some(Scheme::Neo4jS),
            "neo4j+ssc" => Some(Scheme::Neo4jSsc),
            _ => None,
        }
    }

    /// Whether the scheme calls for TLS.
    pub fn encrypted(&self) -> bool {
        !matches!(self, Scheme::Bolt | Scheme::Neo4j)
    }

    /// Peer verification the scheme implies, if encrypted.
    pub fn trust_strategy(&self) -> TrustStrategy {
        match self {
            Scheme::Bolt | Scheme::Neo4j => TrustStrategy::TrustSystemCas,
            Scheme::BoltS | Scheme::Neo4jS => TrustStrategy::TrustSystemCas,
            Scheme::BoltSsc | Scheme::Neo4jSsc => TrustStrategy::TrustAllCertificates,
        }
    }
}

/// TLS peer verification policy, consumed by the TLS collaborator.
///
/// The core itself never performs TLS I/O; connections are generic over the
/// byte stream. This enumeration travels alongside so the embedder can build
/// the right stream.
#[derive(Debug, Clone, Default)]
pub enum TrustStrategy {
    /// Verify the full chain against the system CA store
    #[default]
    TrustSystemCas,
    /// Accept any certificate, including self-signed ones
    TrustAllCertificates,
    /// Verify against a caller-supplied CA set (DER)
    TrustCustomCas {
        /// DER-encoded certificates
        certificates: Vec<Vec<u8>>,
    },
}

/// A resolved host/port pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerAddress {
    /// Hostname or IP literal
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl ServerAddress {
    /// Create an address.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The `host:port` form used for socket connects.
    pub fn to_socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerAddress {
    fn default() -> Self {
        Self::new("localhost", DEFAULT_PORT)
    }
}

impl std::fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Configuration for one connection.
#[derive(Debug, Clone)]
pub struct Config {
    /// URI scheme; selects transport security
    pub scheme: Scheme,
    /// Server address
    pub address: ServerAddress,
    /// Authentication material
    pub auth: AuthToken,
    /// Client identification sent in HELLO
    pub user_agent: String,
    /// Handshake candidates, highest preference first (max four)
    pub bolt_versions: Vec<BoltVersion>,
    /// Records requested per PULL
    pub fetch_size: i64,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Per-response read timeout; `None` waits indefinitely
    pub read_timeout: Option<Duration>,
    /// Server-side query timeout passed as `tx_timeout`
    pub query_timeout: Option<Duration>,
    /// TLS peer verification policy for the transport collaborator
    pub trust_strategy: TrustStrategy,
}

impl Config {
    /// Configuration for a URI like `bolt://host:port`.
    pub fn new(uri: &str, auth: AuthToken) -> BoltResult<Self> {
        let (scheme, address) = parse_uri(uri)?;
        Ok(Self {
            trust_strategy: scheme.trust_strategy(),
            scheme,
            address,
            auth,
            ..Self::default()
        })
    }

    /// Start building a configuration from a URI.
    pub fn builder(uri: &str, auth: AuthToken) -> BoltResult<ConfigBuilder> {
        Ok(ConfigBuilder {
            config: Self::new(uri, auth)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheme: Scheme::Bolt,
            address: ServerAddress::default(),
            auth: AuthToken::None,
            user_agent: format!("neobolt/{}", env!("CARGO_PKG_VERSION")),
            bolt_versions: BoltVersion::DEFAULT_CANDIDATES.to_vec(),
            fetch_size: DEFAULT_FETCH_SIZE,
            connect_timeout: Duration::from_secs(30),
            read_timeout: None,
            query_timeout: None,
            trust_strategy: TrustStrategy::default(),
        }
    }
}

/// Builder over [`Config`].
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the handshake candidates.
    pub fn with_bolt_versions(mut self, versions: Vec<BoltVersion>) -> Self {
        self.config.bolt_versions = versions;
        self
    }

    /// Set the PULL batch size; -1 pulls everything at once.
    pub fn with_fetch_size(mut self, fetch_size: i64) -> Self {
        self.config.fetch_size = fetch_size;
        self
    }

    /// Set the TCP connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the per-response read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = Some(timeout);
        self
    }

    /// Set the server-side query timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.config.query_timeout = Some(timeout);
        self
    }

    /// Override the TLS trust policy.
    pub fn with_trust_strategy(mut self, strategy: TrustStrategy) -> Self {
        self.config.trust_strategy = strategy;
        self
    }

    /// Finish building.
    pub fn build(self) -> Config {
        self.config
    }
}

fn parse_uri(uri: &str) -> BoltResult<(Scheme, ServerAddress)> {
    let (scheme_str, rest) = uri
        .split_once("://")
        .ok_or_else(|| BoltError::configuration(format!("URI has no scheme: {}", uri)))?;
    let scheme = Scheme::parse(scheme_str)
        .ok_or_else(|| BoltError::configuration(format!("unknown scheme: {}", scheme_str)))?;
    let rest = rest.trim_end_matches('/');
    if rest.is_empty() {
        return Err(BoltError::configuration("URI has no host"));
    }
    let address = match rest.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => {
            let port = port
                .parse()
                .map_err(|_| BoltError::configuration(format!("invalid port: {}", port)))?;
            ServerAddress::new(host, port)
        }
        // no port, or an unbracketed IPv6 literal
        _ => ServerAddress::new(rest, DEFAULT_PORT),
    };
    Ok((scheme, address))
}

/// Handshake candidates from the `BOLT_VERSIONS` environment variable, a
/// comma-separated list like `5.4,4.2,3.0`. Test/tooling hook only.
pub fn versions_from_env() -> Option<Vec<BoltVersion>> {
    let raw = std::env::var("BOLT_VERSIONS").ok()?;
    let versions: Vec<BoltVersion> = raw
        .split(',')
        .filter_map(|part| {
            let (major, minor) = part.trim().split_once('.')?;
            Some(BoltVersion::new(
                major.parse().ok()?,
                minor.parse().ok()?,
            ))
        })
        .collect();
    if versions.is_empty() {
        None
    } else {
        Some(versions)
    }
}

/// Port from the `BOLT_TCP_PORT` environment variable. Test/tooling hook only.
pub fn port_from_env() -> Option<u16> {
    std::env::var("BOLT_TCP_PORT").ok()?.trim().parse().ok()
}
