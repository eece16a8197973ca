//! Server-side peer acceptance policy.
//!
//! Generalizes the C original's nullable `allowed_peers` array + length
//! (`c-lib/src/crypto/handshake.c`'s `is_peer_allowed`) into a typed enum:
//! a null allowlist becomes `AcceptAny`.

use subtle::ConstantTimeEq;

/// Which client identities a server-side handshake will accept.
pub enum PeerPolicy {
    /// Accept a connecting client regardless of identity.
    AcceptAny,
    /// Accept only clients whose public key appears in this list.
    Allowlist(Vec<[u8; 32]>),
}

impl PeerPolicy {
    /// Whether `candidate` is acceptable under this policy. Allowlist
    /// membership is checked with a constant-time comparison per entry.
    pub fn accepts(&self, candidate: &[u8; 32]) -> bool {
        match self {
            PeerPolicy::AcceptAny => true,
            PeerPolicy::Allowlist(allowed) => allowed
                .iter()
                .any(|entry| entry.ct_eq(candidate).unwrap_u8() == 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_any_allows_everything() {
        let policy = PeerPolicy::AcceptAny;
        assert!(policy.accepts(&[0u8; 32]));
        assert!(policy.accepts(&[9u8; 32]));
    }

    #[test]
    fn allowlist_rejects_unknown_peers() {
        let policy = PeerPolicy::Allowlist(vec![[1u8; 32]]);
        assert!(policy.accepts(&[1u8; 32]));
        assert!(!policy.accepts(&[2u8; 32]));
    }
}
