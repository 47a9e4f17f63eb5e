//! # neobolt
//!
//! The wire-level core of a Bolt protocol client for Neo4j-compatible graph
//! databases: connection establishment and version negotiation, the
//! PackStream binary codec, the versioned message catalog and protocol
//! state machine, and a lazy, server-paged result stream.
//!
//! This crate deliberately stops below the user-facing driver surface.
//! Connection pooling, session management, and cluster routing are the
//! embedder's concern; the core hands them a well-behaved single
//! connection.
//!
//! ## Basic usage
//!
//! ```rust,no_run
//! use neobolt::{AuthToken, Config, Connection, RunMessage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::new(
//!         "bolt://localhost:7687",
//!         AuthToken::basic("neo4j", "password"),
//!     )?;
//!     let mut connection = Connection::connect(&config).await?;
//!
//!     let mut stream = connection.run(RunMessage::new("RETURN 1 AS n")).await?;
//!     while let Some(record) = stream.next().await? {
//!         println!("{}", record);
//!     }
//!
//!     connection.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Streams and cancellation
//!
//! [`RecordStream`] pulls records from the server in `fetch_size` batches
//! as it is consumed. Stopping early is explicit: [`RecordStream::close`]
//! discards the remainder server-side and returns the connection to its
//! idle state. [`RecordStream::collect`] materializes everything into a
//! [`QueryResult`], which iterates without further I/O.
//!
//! ## Transport
//!
//! [`Connection`] is generic over any `AsyncRead + AsyncWrite` duplex
//! stream. `Connection::connect` covers plain TCP; for `bolt+s`/`bolt+ssc`
//! schemes the embedder establishes the TLS session (the [`config`] module
//! spells out the peer-verification policy each scheme implies) and hands
//! the stream to [`Connection::negotiate`].
//!
//! ## Modules
//!
//! - [`packstream`]: the binary value format
//! - [`message`]: request/response catalog, version-gated shapes
//! - [`handshake`]: magic preamble and version negotiation
//! - [`codec`]: chunked transport framing
//! - [`state`]: the protocol state machine, as plain data
//! - [`connection`]: the single-owner transport actor
//! - [`stream`]: result streaming
//! - [`value`]: caller-facing typed values

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod handshake;
pub mod message;
pub mod packstream;
pub mod state;
pub mod stream;
pub mod value;

pub use config::{Config, ConfigBuilder, Scheme, ServerAddress, TrustStrategy};
pub use connection::Connection;
pub use error::{BoltError, BoltResult, HandshakeError};
pub use handshake::{BoltVersion, HandshakeRequest, VersionOffer};
pub use message::{
    AccessMode, AuthToken, BeginMessage, DiscardMessage, HelloMessage, LogonMessage, Notification,
    PullMessage, QueryPlan, QueryProfile, QueryStats, QueryType, Request, Response, ResultSummary,
    RunMessage,
};
pub use state::{ConnectionState, ProtocolState};
pub use stream::{QueryResult, Record, RecordStream};
pub use value::{
    Crs, Date, DateTime, DateTimeZoneId, Duration, LocalDateTime, LocalTime, Node, Path, Point,
    Relationship, Time, UnboundRelationship, Value,
};
