//! Launch context: the page address a process starts from
//!
//! The URL fragment carries the role-selector token; query parameters `A`
//! and `B` carry the presentational side labels. Both are read once at load.
//! Out-of-band sharing of the full URL is the only discovery mechanism.

use url::Url;

use crate::error::{MirrorError, MirrorResult};
use crate::role::Role;
use crate::token::ShareToken;

/// Free-text side labels; presentational only, never synchronized
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideLabels {
    /// Label for side A (the `A` query parameter)
    pub a: String,
    /// Label for side B (the `B` query parameter)
    pub b: String,
}

/// Everything resolved from a launch URL
#[derive(Debug, Clone)]
pub struct Launch {
    /// The role this process will play
    pub role: Role,
    /// Side labels from the query string; empty when absent
    pub labels: SideLabels,
}

impl Launch {
    /// Parse a launch URL, e.g. `https://host/board?A=Red&B=Blue#draftcast:...`
    ///
    /// # Errors
    ///
    /// Returns `MirrorError::InvalidUrl` if the URL does not parse, or
    /// `MirrorError::InvalidToken` if the fragment is present but not a valid
    /// share token.
    pub fn from_url(raw: &str) -> MirrorResult<Self> {
        let url = Url::parse(raw)
            .map_err(|e| MirrorError::InvalidUrl(format!("'{}': {}", raw, e)))?;

        let labels = SideLabels {
            a: query_param(&url, "A"),
            b: query_param(&url, "B"),
        };
        let role = Role::resolve(url.fragment())?;

        Ok(Self { role, labels })
    }

    /// Compose the shareable URL a controller publishes for displays
    ///
    /// Writes the token into the fragment of `base`, preserving any query
    /// parameters already there.
    pub fn share_url(base: &str, token: &ShareToken) -> MirrorResult<String> {
        let mut url = Url::parse(base)
            .map_err(|e| MirrorError::InvalidUrl(format!("'{}': {}", base, e)))?;
        url.set_fragment(Some(&token.encode()?));
        Ok(url.to_string())
    }
}

fn query_param(url: &Url, key: &str) -> String {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}
