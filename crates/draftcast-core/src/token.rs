//! Share tokens for dialing a controller
//!
//! A share token carries everything a display needs to reach a controller:
//! the controller's endpoint identity plus optional relay and direct
//! addresses. Tokens are encoded as `draftcast:{base58}` strings so they fit
//! in a URL fragment and survive copy/paste.
//!
//! The controller's token is the session's role-selector: a process that
//! finds one in its launch fragment becomes a display and dials it.

use std::net::SocketAddr;

use iroh::{EndpointAddr, EndpointId, PublicKey, RelayUrl};
use serde::{Deserialize, Serialize};

use crate::error::{MirrorError, MirrorResult};

/// Prefix for encoded share tokens
pub const TOKEN_PREFIX: &str = "draftcast:";

/// Current token format version
const TOKEN_VERSION: u8 = 1;

/// Dialing information for a controller, in a portable serializable form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareToken {
    /// Token format version (for future compatibility)
    pub version: u8,
    /// Controller's endpoint public key (32 bytes)
    pub endpoint_id: [u8; 32],
    /// Optional relay URL for NAT traversal
    pub relay_url: Option<String>,
    /// Direct socket addresses as strings (e.g., "192.168.1.1:4433")
    pub direct_addresses: Vec<String>,
}

impl ShareToken {
    /// Create a token carrying just an endpoint identity
    pub fn new(endpoint_id: EndpointId) -> Self {
        Self {
            version: TOKEN_VERSION,
            endpoint_id: *endpoint_id.as_bytes(),
            relay_url: None,
            direct_addresses: Vec::new(),
        }
    }

    /// Build a token from a full endpoint address
    ///
    /// Captures the identity, relay URL, and direct addresses so displays can
    /// dial without relying on global discovery alone.
    pub fn from_endpoint_addr(addr: &EndpointAddr) -> Self {
        let endpoint_id = addr.id.as_bytes().to_owned();
        let relay_url = addr.relay_urls().next().map(|url| url.to_string());
        let direct_addresses = addr.ip_addrs().map(|addr| addr.to_string()).collect();

        Self {
            version: TOKEN_VERSION,
            endpoint_id,
            relay_url,
            direct_addresses,
        }
    }

    /// The controller's endpoint identity
    ///
    /// # Errors
    ///
    /// Returns `MirrorError::InvalidToken` if the key bytes are not a valid
    /// public key.
    pub fn endpoint_id(&self) -> MirrorResult<EndpointId> {
        PublicKey::from_bytes(&self.endpoint_id)
            .map_err(|e| MirrorError::InvalidToken(format!("Invalid public key: {}", e)))
    }

    /// Convert to an iroh endpoint address for dialing
    ///
    /// # Errors
    ///
    /// Returns `MirrorError::InvalidToken` if the key bytes, relay URL, or a
    /// socket address is malformed.
    pub fn to_endpoint_addr(&self) -> MirrorResult<EndpointAddr> {
        let mut addr = EndpointAddr::new(self.endpoint_id()?);

        if let Some(ref relay_str) = self.relay_url {
            let relay_url: RelayUrl = relay_str
                .parse()
                .map_err(|e| MirrorError::InvalidToken(format!("Invalid relay URL: {}", e)))?;
            addr = addr.with_relay_url(relay_url);
        }

        for addr_str in &self.direct_addresses {
            let socket_addr: SocketAddr = addr_str
                .parse()
                .map_err(|e| MirrorError::InvalidToken(format!("Invalid socket address: {}", e)))?;
            addr = addr.with_ip_addr(socket_addr);
        }

        Ok(addr)
    }

    /// Encode the token as a `draftcast:{base58}` string
    ///
    /// # Errors
    ///
    /// Returns `MirrorError::Serialization` if encoding fails.
    pub fn encode(&self) -> MirrorResult<String> {
        let bytes = postcard::to_stdvec(self)
            .map_err(|e| MirrorError::Serialization(format!("Failed to encode token: {}", e)))?;
        let encoded = bs58::encode(&bytes).into_string();
        Ok(format!("{}{}", TOKEN_PREFIX, encoded))
    }

    /// Decode a token from a `draftcast:{base58}` string
    ///
    /// # Errors
    ///
    /// Returns `MirrorError::InvalidToken` if the prefix, base58 encoding, or
    /// binary payload is invalid.
    pub fn decode(s: &str) -> MirrorResult<Self> {
        let data = s.strip_prefix(TOKEN_PREFIX).ok_or_else(|| {
            MirrorError::InvalidToken(format!(
                "Invalid prefix: expected '{}', got '{}'",
                TOKEN_PREFIX,
                s.chars().take(12).collect::<String>()
            ))
        })?;

        let bytes = bs58::decode(data)
            .into_vec()
            .map_err(|e| MirrorError::InvalidToken(format!("Invalid base58: {}", e)))?;

        let token: ShareToken = postcard::from_bytes(&bytes)
            .map_err(|e| MirrorError::InvalidToken(format!("Invalid token data: {}", e)))?;

        Ok(token)
    }
}
