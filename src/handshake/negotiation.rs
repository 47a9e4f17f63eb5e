//! Client-side version negotiation.

use super::{BoltVersion, HandshakeError, BOLT_MAGIC, HANDSHAKE_REQUEST_SIZE};

/// A single version slot in the handshake request.
///
/// From Bolt 4.3 a slot may offer a contiguous range of minor versions:
/// `back` is how many minors below `version.minor` the client also accepts.
/// On the wire a slot is `[0, back, minor, major]`; a plain version has
/// `back == 0`, which degenerates to the `[0, 0, minor, major]` layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionOffer {
    /// Highest version offered by this slot
    pub version: BoltVersion,
    /// Number of consecutive lower minors also offered
    pub back: u8,
}

impl VersionOffer {
    /// Offer exactly one version.
    pub fn exact(version: BoltVersion) -> Self {
        Self { version, back: 0 }
    }

    /// Offer `version` down to `version.minor - back` of the same major.
    pub fn range(version: BoltVersion, back: u8) -> Self {
        Self {
            version,
            back: back.min(version.minor),
        }
    }

    fn to_bytes(self) -> [u8; 4] {
        [0, self.back, self.version.minor, self.version.major]
    }

    /// Whether the slot covers `candidate`.
    pub fn covers(&self, candidate: BoltVersion) -> bool {
        candidate.major == self.version.major
            && candidate.minor <= self.version.minor
            && candidate.minor >= self.version.minor.saturating_sub(self.back)
    }
}

impl From<BoltVersion> for VersionOffer {
    fn from(version: BoltVersion) -> Self {
        Self::exact(version)
    }
}

/// The 20-byte handshake request: magic preamble plus four version slots.
#[derive(Debug, Clone)]
pub struct HandshakeRequest {
    offers: Vec<VersionOffer>,
}

impl HandshakeRequest {
    /// Build a request from up to four offers, highest preference first.
    /// Additional offers are silently dropped; empty slots are zero-padded.
    pub fn new<O: Into<VersionOffer> + Copy>(offers: &[O]) -> Self {
        Self {
            offers: offers.iter().take(4).map(|o| (*o).into()).collect(),
        }
    }

    /// Request advertising the default candidate set.
    pub fn default_candidates() -> Self {
        Self::new(&BoltVersion::DEFAULT_CANDIDATES)
    }

    /// Serialize to the wire form.
    pub fn to_bytes(&self) -> [u8; HANDSHAKE_REQUEST_SIZE] {
        let mut buf = [0u8; HANDSHAKE_REQUEST_SIZE];
        buf[0..4].copy_from_slice(&BOLT_MAGIC);
        for (i, offer) in self.offers.iter().enumerate() {
            let at = 4 + i * 4;
            buf[at..at + 4].copy_from_slice(&offer.to_bytes());
        }
        buf
    }

    /// Interpret the server's 4-byte reply.
    ///
    /// An all-zero reply means no offered version was acceptable. A version
    /// outside every offered slot is a negotiation failure too: the server
    /// must pick from what was proposed.
    pub fn parse_response(&self, reply: [u8; 4]) -> Result<BoltVersion, HandshakeError> {
        let version = match BoltVersion::from_bytes(reply) {
            Some(v) => v,
            None => {
                if reply == [0, 0, 0, 0] {
                    return Err(HandshakeError::NoCompatibleVersion);
                }
                return Err(HandshakeError::InvalidResponse(reply));
            }
        };
        if !self.offers.iter().any(|o| o.covers(version)) {
            return Err(HandshakeError::UnexpectedVersion(version));
        }
        Ok(version)
    }
}

impl Default for HandshakeRequest {
    fn default() -> Self {
        Self::default_candidates()
    }
}
