//! Client-to-server messages.
//!
//! Requests are encoded against the negotiated protocol version: the same
//! logical message takes different wire shapes across versions, and some
//! messages do not exist at all outside their version window.

use std::collections::HashMap;
use std::time::Duration;

use super::signature;
use crate::error::BoltError;
use crate::handshake::BoltVersion;
use crate::packstream::{Structure, Value};

/// Transaction access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Read-write access (default)
    #[default]
    Write,
    /// Read-only access
    Read,
}

impl AccessMode {
    /// Wire form used in RUN/BEGIN extras.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::Read => "r",
            AccessMode::Write => "w",
        }
    }
}

/// Authentication material carried by HELLO (pre-5.1) or LOGON (5.1+).
#[derive(Debug, Clone, PartialEq)]
pub enum AuthToken {
    /// No authentication
    None,
    /// Username/password authentication
    Basic {
        /// Principal (username)
        username: String,
        /// Credentials (password)
        password: String,
        /// Optional authentication realm
        realm: Option<String>,
    },
    /// Bearer token authentication
    Bearer {
        /// The token
        token: String,
    },
    /// Kerberos ticket authentication
    Kerberos {
        /// Base64-encoded ticket
        ticket: String,
    },
    /// Arbitrary scheme with caller-supplied entries
    Custom {
        /// Scheme name
        scheme: String,
        /// Scheme-specific entries merged into the auth map
        parameters: HashMap<String, Value>,
    },
}

impl AuthToken {
    /// Basic authentication.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        AuthToken::Basic {
            username: username.into(),
            password: password.into(),
            realm: None,
        }
    }

    /// Bearer token authentication.
    pub fn bearer(token: impl Into<String>) -> Self {
        AuthToken::Bearer {
            token: token.into(),
        }
    }

    /// No authentication.
    pub fn none() -> Self {
        AuthToken::None
    }

    /// Scheme name sent to the server.
    pub fn scheme(&self) -> &str {
        match self {
            AuthToken::None => "none",
            AuthToken::Basic { .. } => "basic",
            AuthToken::Bearer { .. } => "bearer",
            AuthToken::Kerberos { .. } => "kerberos",
            AuthToken::Custom { scheme, .. } => scheme,
        }
    }

    /// Assemble the auth entries for a HELLO extra or LOGON map.
    pub fn to_map(&self) -> HashMap<String, Value> {
        let mut map = HashMap::new();
        map.insert("scheme".to_string(), Value::from(self.scheme()));
        match self {
            AuthToken::None => {}
            AuthToken::Basic {
                username,
                password,
                realm,
            } => {
                map.insert("principal".to_string(), Value::from(username.as_str()));
                map.insert("credentials".to_string(), Value::from(password.as_str()));
                if let Some(realm) = realm {
                    map.insert("realm".to_string(), Value::from(realm.as_str()));
                }
            }
            AuthToken::Bearer { token } => {
                map.insert("credentials".to_string(), Value::from(token.as_str()));
            }
            AuthToken::Kerberos { ticket } => {
                map.insert("principal".to_string(), Value::from(""));
                map.insert("credentials".to_string(), Value::from(ticket.as_str()));
            }
            AuthToken::Custom { parameters, .. } => {
                for (k, v) in parameters {
                    map.insert(k.clone(), v.clone());
                }
            }
        }
        map
    }
}

impl Default for AuthToken {
    fn default() -> Self {
        AuthToken::None
    }
}

/// All client-to-server messages.
#[derive(Debug, Clone)]
pub enum Request {
    /// Initialize and (pre-5.1) authenticate the connection;
    /// encodes as INIT on Bolt 1/2
    Hello(HelloMessage),
    /// Authenticate after HELLO (Bolt 5.1+)
    Logon(LogonMessage),
    /// Submit a query
    Run(RunMessage),
    /// Request records from an open stream
    Pull(PullMessage),
    /// Drop remaining records of an open stream server-side
    Discard(DiscardMessage),
    /// Open an explicit transaction (Bolt 3+)
    Begin(BeginMessage),
    /// Commit the open transaction (Bolt 3+)
    Commit,
    /// Roll back the open transaction (Bolt 3+)
    Rollback,
    /// Abort outstanding work and clear a failure
    Reset,
    /// Clear a failure (Bolt 1/2 only)
    AckFailure,
    /// Close the connection gracefully (Bolt 3+)
    Goodbye,
}

impl Request {
    /// Message name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Request::Hello(_) => "HELLO",
            Request::Logon(_) => "LOGON",
            Request::Run(_) => "RUN",
            Request::Pull(_) => "PULL",
            Request::Discard(_) => "DISCARD",
            Request::Begin(_) => "BEGIN",
            Request::Commit => "COMMIT",
            Request::Rollback => "ROLLBACK",
            Request::Reset => "RESET",
            Request::AckFailure => "ACK_FAILURE",
            Request::Goodbye => "GOODBYE",
        }
    }

    /// Whether the server answers this message. GOODBYE is fire-and-forget.
    pub fn expects_response(&self) -> bool {
        !matches!(self, Request::Goodbye)
    }

    /// Encode against the negotiated version.
    ///
    /// Fails with [`BoltError::UnsupportedVersion`] when the message (or one
    /// of its populated fields) does not exist in that version.
    pub fn to_structure(&self, version: BoltVersion) -> Result<Structure, BoltError> {
        match self {
            Request::Hello(msg) => Ok(msg.to_structure(version)),
            Request::Logon(msg) => msg.to_structure(version),
            Request::Run(msg) => msg.to_structure(version),
            Request::Pull(msg) => Ok(msg.to_structure(version)),
            Request::Discard(msg) => Ok(msg.to_structure(version)),
            Request::Begin(msg) => msg.to_structure(version),
            Request::Commit => {
                require(version.supports_explicit_tx(), "COMMIT", "3.0", version)?;
                Ok(Structure::new(signature::COMMIT, vec![]))
            }
            Request::Rollback => {
                require(version.supports_explicit_tx(), "ROLLBACK", "3.0", version)?;
                Ok(Structure::new(signature::ROLLBACK, vec![]))
            }
            Request::Reset => Ok(Structure::new(signature::RESET, vec![])),
            Request::AckFailure => {
                require(version.uses_ack_failure(), "ACK_FAILURE", "< 3.0", version)?;
                Ok(Structure::new(signature::ACK_FAILURE, vec![]))
            }
            Request::Goodbye => {
                require(version.supports_hello(), "GOODBYE", "3.0", version)?;
                Ok(Structure::new(signature::GOODBYE, vec![]))
            }
        }
    }
}

fn require(
    ok: bool,
    what: &'static str,
    required: &'static str,
    negotiated: BoltVersion,
) -> Result<(), BoltError> {
    if ok {
        Ok(())
    } else {
        Err(BoltError::UnsupportedVersion {
            what,
            required,
            negotiated,
        })
    }
}

/// HELLO: initialize the connection.
///
/// Bolt 1/2 spell this INIT with positional fields; Bolt 3+ fold everything
/// into a single extra map. Authentication rides along until Bolt 5.1 moved
/// it into LOGON.
#[derive(Debug, Clone, Default)]
pub struct HelloMessage {
    /// Client identification string
    pub user_agent: String,
    /// Authentication material (ignored for v5.1+, which uses LOGON)
    pub auth: AuthToken,
    /// Routing context (v4.1+); carried opaquely
    pub routing: Option<HashMap<String, Value>>,
    /// Structured client identification (v5.2+)
    pub bolt_agent: Option<HashMap<String, Value>>,
    /// Minimum notification severity filter (v5.2+)
    pub notifications_minimum_severity: Option<String>,
    /// Disabled notification categories (v5.2+)
    pub notifications_disabled_categories: Option<Vec<String>>,
}

impl HelloMessage {
    /// Create a HELLO with the given user agent.
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ..Default::default()
        }
    }

    /// Attach authentication material.
    pub fn with_auth(mut self, auth: AuthToken) -> Self {
        self.auth = auth;
        self
    }

    /// Attach a routing context.
    pub fn with_routing(mut self, routing: HashMap<String, Value>) -> Self {
        self.routing = Some(routing);
        self
    }

    /// Encode for the given version.
    pub fn to_structure(&self, version: BoltVersion) -> Structure {
        if !version.supports_hello() {
            // INIT(user_agent, auth)
            return Structure::new(
                signature::HELLO,
                vec![
                    Value::from(self.user_agent.as_str()),
                    Value::Map(self.auth.to_map()),
                ],
            );
        }

        let mut extra = HashMap::new();
        extra.insert(
            "user_agent".to_string(),
            Value::from(self.user_agent.as_str()),
        );
        if !version.supports_logon() {
            for (k, v) in self.auth.to_map() {
                extra.insert(k, v);
            }
        }
        if version.supports_routing_context() {
            if let Some(ref routing) = self.routing {
                extra.insert("routing".to_string(), Value::Map(routing.clone()));
            }
        }
        if version.supports_notification_filters() {
            if let Some(ref agent) = self.bolt_agent {
                extra.insert("bolt_agent".to_string(), Value::Map(agent.clone()));
            }
            if let Some(ref severity) = self.notifications_minimum_severity {
                extra.insert(
                    "notifications_minimum_severity".to_string(),
                    Value::from(severity.as_str()),
                );
            }
            if let Some(ref categories) = self.notifications_disabled_categories {
                extra.insert(
                    "notifications_disabled_categories".to_string(),
                    Value::List(categories.iter().map(|c| Value::from(c.as_str())).collect()),
                );
            }
        }
        Structure::new(signature::HELLO, vec![Value::Map(extra)])
    }
}

/// LOGON: authenticate after HELLO (Bolt 5.1+).
#[derive(Debug, Clone)]
pub struct LogonMessage {
    /// Authentication material
    pub auth: AuthToken,
}

impl LogonMessage {
    /// Create a LOGON message.
    pub fn new(auth: AuthToken) -> Self {
        Self { auth }
    }

    /// Encode for the given version.
    pub fn to_structure(&self, version: BoltVersion) -> Result<Structure, BoltError> {
        require(version.supports_logon(), "LOGON", "5.1", version)?;
        Ok(Structure::new(
            signature::LOGON,
            vec![Value::Map(self.auth.to_map())],
        ))
    }
}

/// RUN: submit a query for execution.
#[derive(Debug, Clone, Default)]
pub struct RunMessage {
    /// Query text
    pub query: String,
    /// Query parameters
    pub parameters: HashMap<String, Value>,
    /// Bookmarks to wait for (causal chaining); carried opaquely
    pub bookmarks: Vec<String>,
    /// Server-side query timeout
    pub tx_timeout: Option<Duration>,
    /// Caller-supplied transaction metadata
    pub tx_metadata: HashMap<String, Value>,
    /// Access mode hint; carried opaquely
    pub mode: AccessMode,
    /// Target database (v4+)
    pub db: Option<String>,
    /// Impersonated user (v4.4+)
    pub imp_user: Option<String>,
    /// Minimum notification severity filter (v5.2+)
    pub notifications_minimum_severity: Option<String>,
    /// Disabled notification categories (v5.2+)
    pub notifications_disabled_categories: Option<Vec<String>>,
}

impl RunMessage {
    /// Create a RUN message for a query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set query parameters.
    pub fn with_parameters(mut self, parameters: HashMap<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set bookmarks.
    pub fn with_bookmarks(mut self, bookmarks: Vec<String>) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    /// Set the server-side timeout.
    pub fn with_tx_timeout(mut self, timeout: Duration) -> Self {
        self.tx_timeout = Some(timeout);
        self
    }

    /// Set the target database.
    pub fn with_db(mut self, db: impl Into<String>) -> Self {
        self.db = Some(db.into());
        self
    }

    /// Set the access mode hint.
    pub fn with_mode(mut self, mode: AccessMode) -> Self {
        self.mode = mode;
        self
    }

    /// Encode for the given version.
    pub fn to_structure(&self, version: BoltVersion) -> Result<Structure, BoltError> {
        if !version.supports_hello() {
            // v1/v2: RUN(query, parameters), no extra
            return Ok(Structure::new(
                signature::RUN,
                vec![
                    Value::from(self.query.as_str()),
                    Value::Map(self.parameters.clone()),
                ],
            ));
        }
        let extra = tx_extra(
            version,
            &self.bookmarks,
            self.tx_timeout,
            &self.tx_metadata,
            self.mode,
            self.db.as_deref(),
            self.imp_user.as_deref(),
            self.notifications_minimum_severity.as_deref(),
            self.notifications_disabled_categories.as_deref(),
        )?;
        Ok(Structure::new(
            signature::RUN,
            vec![
                Value::from(self.query.as_str()),
                Value::Map(self.parameters.clone()),
                Value::Map(extra),
            ],
        ))
    }
}

/// PULL: request up to `n` records from the stream identified by `qid`.
///
/// `n = -1` requests everything; `qid = -1` addresses the most recent
/// stream. Before Bolt 4 the message is PULL_ALL and carries no fields.
#[derive(Debug, Clone, Copy)]
pub struct PullMessage {
    /// Maximum number of records, or -1 for all
    pub n: i64,
    /// Stream to pull from, or -1 for the last one
    pub qid: i64,
}

impl PullMessage {
    /// Pull all remaining records of the last stream.
    pub fn all() -> Self {
        Self { n: -1, qid: -1 }
    }

    /// Pull at most `n` records of the last stream.
    pub fn with_n(n: i64) -> Self {
        Self { n, qid: -1 }
    }

    /// Address a specific stream.
    pub fn with_qid(mut self, qid: i64) -> Self {
        self.qid = qid;
        self
    }

    /// Encode for the given version.
    pub fn to_structure(&self, version: BoltVersion) -> Structure {
        if !version.supports_pull_n() {
            return Structure::new(signature::PULL, vec![]);
        }
        let mut extra = HashMap::new();
        extra.insert("n".to_string(), Value::Integer(self.n));
        extra.insert("qid".to_string(), Value::Integer(self.qid));
        Structure::new(signature::PULL, vec![Value::Map(extra)])
    }
}

/// DISCARD: drop remaining records server-side.
///
/// Before Bolt 4 the message is DISCARD_ALL and carries no fields.
#[derive(Debug, Clone, Copy)]
pub struct DiscardMessage {
    /// Maximum number of records to discard, or -1 for all
    pub n: i64,
    /// Stream to discard from, or -1 for the last one
    pub qid: i64,
}

impl DiscardMessage {
    /// Discard all remaining records of the last stream.
    pub fn all() -> Self {
        Self { n: -1, qid: -1 }
    }

    /// Address a specific stream.
    pub fn with_qid(mut self, qid: i64) -> Self {
        self.qid = qid;
        self
    }

    /// Encode for the given version.
    pub fn to_structure(&self, version: BoltVersion) -> Structure {
        if !version.supports_pull_n() {
            return Structure::new(signature::DISCARD, vec![]);
        }
        let mut extra = HashMap::new();
        extra.insert("n".to_string(), Value::Integer(self.n));
        extra.insert("qid".to_string(), Value::Integer(self.qid));
        Structure::new(signature::DISCARD, vec![Value::Map(extra)])
    }
}

/// BEGIN: open an explicit transaction (Bolt 3+).
#[derive(Debug, Clone, Default)]
pub struct BeginMessage {
    /// Bookmarks to wait for; carried opaquely
    pub bookmarks: Vec<String>,
    /// Server-side transaction timeout
    pub tx_timeout: Option<Duration>,
    /// Caller-supplied transaction metadata
    pub tx_metadata: HashMap<String, Value>,
    /// Access mode hint; carried opaquely
    pub mode: AccessMode,
    /// Target database (v4+)
    pub db: Option<String>,
    /// Impersonated user (v4.4+)
    pub imp_user: Option<String>,
}

impl BeginMessage {
    /// Create an empty BEGIN message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bookmarks.
    pub fn with_bookmarks(mut self, bookmarks: Vec<String>) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    /// Set the server-side timeout.
    pub fn with_tx_timeout(mut self, timeout: Duration) -> Self {
        self.tx_timeout = Some(timeout);
        self
    }

    /// Set the target database.
    pub fn with_db(mut self, db: impl Into<String>) -> Self {
        self.db = Some(db.into());
        self
    }

    /// Set the access mode hint.
    pub fn with_mode(mut self, mode: AccessMode) -> Self {
        self.mode = mode;
        self
    }

    /// Encode for the given version.
    pub fn to_structure(&self, version: BoltVersion) -> Result<Structure, BoltError> {
        require(version.supports_explicit_tx(), "BEGIN", "3.0", version)?;
        let extra = tx_extra(
            version,
            &self.bookmarks,
            self.tx_timeout,
            &self.tx_metadata,
            self.mode,
            self.db.as_deref(),
            self.imp_user.as_deref(),
            None,
            None,
        )?;
        Ok(Structure::new(signature::BEGIN, vec![Value::Map(extra)]))
    }
}

/// Assemble the extra map shared by RUN and BEGIN.
#[allow(clippy::too_many_arguments)]
fn tx_extra(
    version: BoltVersion,
    bookmarks: &[String],
    tx_timeout: Option<Duration>,
    tx_metadata: &HashMap<String, Value>,
    mode: AccessMode,
    db: Option<&str>,
    imp_user: Option<&str>,
    notifications_minimum_severity: Option<&str>,
    notifications_disabled_categories: Option<&[String]>,
) -> Result<HashMap<String, Value>, BoltError> {
    let mut extra = HashMap::new();
    if !bookmarks.is_empty() {
        extra.insert(
            "bookmarks".to_string(),
            Value::List(bookmarks.iter().map(|b| Value::from(b.as_str())).collect()),
        );
    }
    if let Some(timeout) = tx_timeout {
        extra.insert(
            "tx_timeout".to_string(),
            Value::Integer(timeout.as_millis() as i64),
        );
    }
    if !tx_metadata.is_empty() {
        extra.insert("tx_metadata".to_string(), Value::Map(tx_metadata.clone()));
    }
    if mode == AccessMode::Read {
        extra.insert("mode".to_string(), Value::from("r"));
    }
    if let Some(db) = db {
        require(version.supports_pull_n(), "db selection", "4.0", version)?;
        extra.insert("db".to_string(), Value::from(db));
    }
    if let Some(user) = imp_user {
        require(version.supports_impersonation(), "imp_user", "4.4", version)?;
        extra.insert("imp_user".to_string(), Value::from(user));
    }
    if let Some(severity) = notifications_minimum_severity {
        require(
            version.supports_notification_filters(),
            "notification filters",
            "5.2",
            version,
        )?;
        extra.insert(
            "notifications_minimum_severity".to_string(),
            Value::from(severity),
        );
    }
    if let Some(categories) = notifications_disabled_categories {
        require(
            version.supports_notification_filters(),
            "notification filters",
            "5.2",
            version,
        )?;
        extra.insert(
            "notifications_disabled_categories".to_string(),
            Value::List(categories.iter().map(|c| Value::from(c.as_str())).collect()),
        );
    }
    Ok(extra)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extra_of(s: &Structure, index: usize) -> &HashMap<String, Value> {
        s.fields[index].as_map().unwrap()
    }

    #[test]
    fn test_hello_v3_shape() {
        let msg = HelloMessage::new("neobolt/0.1").with_auth(AuthToken::basic("neo4j", "secret"));
        let s = msg.to_structure(BoltVersion::V4_4);
        assert_eq!(s.signature, signature::HELLO);
        assert_eq!(s.fields.len(), 1);

        let extra = extra_of(&s, 0);
        assert_eq!(extra.get("user_agent").unwrap().as_str(), Some("neobolt/0.1"));
        assert_eq!(extra.get("scheme").unwrap().as_str(), Some("basic"));
        assert_eq!(extra.get("principal").unwrap().as_str(), Some("neo4j"));
        assert_eq!(extra.get("credentials").unwrap().as_str(), Some("secret"));
    }

    #[test]
    fn test_hello_encodes_as_init_pre_v3() {
        let msg = HelloMessage::new("neobolt/0.1").with_auth(AuthToken::basic("neo4j", "secret"));
        let s = msg.to_structure(BoltVersion::V2_0);
        assert_eq!(s.signature, signature::HELLO);
        assert_eq!(s.fields.len(), 2);
        assert_eq!(s.fields[0].as_str(), Some("neobolt/0.1"));
        let auth = s.fields[1].as_map().unwrap();
        assert_eq!(auth.get("principal").unwrap().as_str(), Some("neo4j"));
    }

    #[test]
    fn test_hello_withholds_credentials_on_v5_1() {
        let msg = HelloMessage::new("neobolt/0.1").with_auth(AuthToken::basic("neo4j", "secret"));
        let s = msg.to_structure(BoltVersion::V5_1);
        let extra = extra_of(&s, 0);
        assert!(extra.get("credentials").is_none());
        assert!(extra.get("scheme").is_none());
        assert!(extra.get("user_agent").is_some());
    }

    #[test]
    fn test_hello_routing_gated() {
        let mut routing = HashMap::new();
        routing.insert("address".to_string(), Value::from("example.com:7687"));
        let msg = HelloMessage::new("x").with_routing(routing);

        let s = msg.clone().to_structure(BoltVersion::V4_0);
        assert!(extra_of(&s, 0).get("routing").is_none());

        let s = msg.to_structure(BoltVersion::V4_1);
        assert!(extra_of(&s, 0).get("routing").is_some());
    }

    #[test]
    fn test_hello_notification_filters_gated() {
        let mut msg = HelloMessage::new("x");
        msg.notifications_minimum_severity = Some("WARNING".to_string());
        msg.notifications_disabled_categories = Some(vec!["HINT".to_string()]);

        let s = msg.to_structure(BoltVersion::V5_1);
        assert!(extra_of(&s, 0).get("notifications_minimum_severity").is_none());

        let mut msg = HelloMessage::new("x");
        msg.notifications_minimum_severity = Some("WARNING".to_string());
        let s = msg.to_structure(BoltVersion::V5_2);
        assert_eq!(
            extra_of(&s, 0)
                .get("notifications_minimum_severity")
                .unwrap()
                .as_str(),
            Some("WARNING")
        );
    }

    #[test]
    fn test_logon_version_gate() {
        let msg = LogonMessage::new(AuthToken::basic("neo4j", "secret"));
        assert!(msg.to_structure(BoltVersion::V5_0).is_err());

        let s = msg.to_structure(BoltVersion::V5_1).unwrap();
        assert_eq!(s.signature, signature::LOGON);
        let auth = s.fields[0].as_map().unwrap();
        assert_eq!(auth.get("scheme").unwrap().as_str(), Some("basic"));
    }

    #[test]
    fn test_run_v3_shape() {
        let mut params = HashMap::new();
        params.insert("name".to_string(), Value::from("Alice"));
        let msg = RunMessage::new("RETURN $name").with_parameters(params);

        let s = msg.to_structure(BoltVersion::V4_4).unwrap();
        assert_eq!(s.signature, signature::RUN);
        assert_eq!(s.fields.len(), 3);
        assert_eq!(s.fields[0].as_str(), Some("RETURN $name"));
        assert!(s.fields[1].as_map().unwrap().contains_key("name"));
        assert!(extra_of(&s, 2).is_empty());
    }

    #[test]
    fn test_run_v2_shape() {
        let msg = RunMessage::new("RETURN 1");
        let s = msg.to_structure(BoltVersion::V1_0).unwrap();
        assert_eq!(s.fields.len(), 2);
    }

    #[test]
    fn test_run_extras() {
        let msg = RunMessage::new("RETURN 1")
            .with_bookmarks(vec!["bm:1".to_string()])
            .with_tx_timeout(Duration::from_millis(2500))
            .with_mode(AccessMode::Read)
            .with_db("movies");

        let s = msg.to_structure(BoltVersion::V4_4).unwrap();
        let extra = extra_of(&s, 2);
        assert_eq!(extra.get("tx_timeout").unwrap().as_int(), Some(2500));
        assert_eq!(extra.get("mode").unwrap().as_str(), Some("r"));
        assert_eq!(extra.get("db").unwrap().as_str(), Some("movies"));
        let bookmarks = extra.get("bookmarks").unwrap().as_list().unwrap();
        assert_eq!(bookmarks[0].as_str(), Some("bm:1"));
    }

    #[test]
    fn test_run_db_requires_v4() {
        let msg = RunMessage::new("RETURN 1").with_db("movies");
        let err = msg.to_structure(BoltVersion::V3_0).unwrap_err();
        assert!(matches!(err, BoltError::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_run_imp_user_requires_v4_4() {
        let mut msg = RunMessage::new("RETURN 1");
        msg.imp_user = Some("alice".to_string());
        assert!(msg.to_structure(BoltVersion::V4_3).is_err());

        let s = msg.to_structure(BoltVersion::V4_4).unwrap();
        assert_eq!(extra_of(&s, 2).get("imp_user").unwrap().as_str(), Some("alice"));
    }

    #[test]
    fn test_pull_shapes() {
        let msg = PullMessage::with_n(1000);
        let s = msg.to_structure(BoltVersion::V4_0);
        let extra = extra_of(&s, 0);
        assert_eq!(extra.get("n").unwrap().as_int(), Some(1000));
        assert_eq!(extra.get("qid").unwrap().as_int(), Some(-1));

        // PULL_ALL before v4
        let s = msg.to_structure(BoltVersion::V3_0);
        assert_eq!(s.signature, signature::PULL);
        assert!(s.fields.is_empty());
    }

    #[test]
    fn test_discard_shapes() {
        let msg = DiscardMessage::all().with_qid(7);
        let s = msg.to_structure(BoltVersion::V4_4);
        let extra = extra_of(&s, 0);
        assert_eq!(extra.get("n").unwrap().as_int(), Some(-1));
        assert_eq!(extra.get("qid").unwrap().as_int(), Some(7));

        let s = msg.to_structure(BoltVersion::V2_0);
        assert!(s.fields.is_empty());
    }

    #[test]
    fn test_begin_version_gate() {
        let msg = BeginMessage::new();
        assert!(msg.to_structure(BoltVersion::V2_0).is_err());

        let s = msg.to_structure(BoltVersion::V3_0).unwrap();
        assert_eq!(s.signature, signature::BEGIN);
        assert_eq!(s.fields.len(), 1);
    }

    #[test]
    fn test_bare_messages() {
        for (request, sig) in [
            (Request::Commit, signature::COMMIT),
            (Request::Rollback, signature::ROLLBACK),
            (Request::Reset, signature::RESET),
            (Request::Goodbye, signature::GOODBYE),
        ] {
            let s = request.to_structure(BoltVersion::V5_4).unwrap();
            assert_eq!(s.signature, sig);
            assert!(s.fields.is_empty());
        }
    }

    #[test]
    fn test_ack_failure_only_pre_v3() {
        let s = Request::AckFailure.to_structure(BoltVersion::V1_0).unwrap();
        assert_eq!(s.signature, signature::ACK_FAILURE);
        assert!(Request::AckFailure.to_structure(BoltVersion::V3_0).is_err());
    }

    #[test]
    fn test_commit_requires_v3() {
        assert!(Request::Commit.to_structure(BoltVersion::V2_0).is_err());
        assert!(Request::Rollback.to_structure(BoltVersion::V2_0).is_err());
        assert!(Request::Goodbye.to_structure(BoltVersion::V2_0).is_err());
        assert!(Request::Reset.to_structure(BoltVersion::V2_0).is_ok());
    }

    #[test]
    fn test_auth_token_maps() {
        let map = AuthToken::basic("u", "p").to_map();
        assert_eq!(map.get("scheme").unwrap().as_str(), Some("basic"));
        assert_eq!(map.get("principal").unwrap().as_str(), Some("u"));

        let map = AuthToken::bearer("tok").to_map();
        assert_eq!(map.get("scheme").unwrap().as_str(), Some("bearer"));
        assert_eq!(map.get("credentials").unwrap().as_str(), Some("tok"));

        let map = AuthToken::none().to_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("scheme").unwrap().as_str(), Some("none"));
    }

    #[test]
    fn test_request_names() {
        assert_eq!(Request::Reset.name(), "RESET");
        assert_eq!(Request::Run(RunMessage::new("")).name(), "RUN");
        assert_eq!(Request::Pull(PullMessage::all()).name(), "PULL");
        assert!(Request::Reset.expects_response());
        assert!(!Request::Goodbye.expects_response());
    }
}
