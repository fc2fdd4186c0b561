//! Role resolution from the launch context
//!
//! A process decides its role exactly once, at startup, from the presence or
//! absence of a share token in its launch fragment. There is no runtime role
//! switching, and resolution touches nothing but the given string.

use crate::error::MirrorResult;
use crate::token::ShareToken;

/// Which side of the mirror protocol this process plays
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Owns and edits the board; publishes its identity for displays to dial
    Controller,
    /// Mirrors a controller's board read-only
    Display {
        /// The controller to dial, captured from the fragment token
        token: ShareToken,
    },
}

impl Role {
    /// Decide the role from the optional fragment token
    ///
    /// Absent or empty fragment → Controller. Non-empty fragment → Display,
    /// dialing the decoded token.
    ///
    /// # Errors
    ///
    /// Returns `MirrorError::InvalidToken` if a non-empty fragment is not a
    /// valid share token.
    pub fn resolve(fragment: Option<&str>) -> MirrorResult<Self> {
        match fragment {
            None => Ok(Role::Controller),
            Some(s) if s.is_empty() => Ok(Role::Controller),
            Some(s) => Ok(Role::Display {
                token: ShareToken::decode(s)?,
            }),
        }
    }

    /// Whether this process owns the board
    pub fn is_controller(&self) -> bool {
        matches!(self, Role::Controller)
    }

    /// Whether this process mirrors a controller
    pub fn is_display(&self) -> bool {
        matches!(self, Role::Display { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MirrorError;

    fn make_token_string() -> String {
        let secret_key = iroh::SecretKey::generate(&mut rand::rng());
        ShareToken::new(secret_key.public()).encode().unwrap()
    }

    #[test]
    fn test_absent_fragment_is_controller() {
        assert_eq!(Role::resolve(None).unwrap(), Role::Controller);
    }

    #[test]
    fn test_empty_fragment_behaves_like_absent() {
        assert_eq!(Role::resolve(Some("")).unwrap(), Role::Controller);
    }

    #[test]
    fn test_token_fragment_is_display() {
        let encoded = make_token_string();
        let role = Role::resolve(Some(&encoded)).unwrap();
        assert!(role.is_display());

        match role {
            Role::Display { token } => assert_eq!(token.encode().unwrap(), encoded),
            Role::Controller => panic!("expected display role"),
        }
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let encoded = make_token_string();

        for _ in 0..3 {
            assert!(Role::resolve(None).unwrap().is_controller());
            assert!(Role::resolve(Some("")).unwrap().is_controller());
            assert!(Role::resolve(Some(&encoded)).unwrap().is_display());
        }
    }

    #[test]
    fn test_garbage_fragment_is_an_error() {
        let err = Role::resolve(Some("not-a-token")).unwrap_err();
        assert!(matches!(err, MirrorError::InvalidToken(_)));
    }
}
