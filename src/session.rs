//! The post-handshake session object.

use zeroize::Zeroizing;

use crate::identity::fingerprint_of;

/// A live, authenticated, confidential channel to a peer.
///
/// Produced only by [`crate::handshake::handshake_client`] or
/// [`crate::handshake::handshake_server`]. Holds the derived session key
/// and the verified peer public key, plus independent send/receive nonce
/// counters. The session key is never exposed through the public API —
/// the encrypted transport reaches it only because it is implemented as
/// methods directly on `Session`, in the same crate.
pub struct Session {
    pub(crate) session_key: Zeroizing<[u8; 32]>,
    peer_public: [u8; 32],
    pub(crate) send_nonce: u64,
    pub(crate) recv_nonce: u64,
}

impl Session {
    pub(crate) fn new(session_key: Zeroizing<[u8; 32]>, peer_public: [u8; 32]) -> Self {
        Session {
            session_key,
            peer_public,
            send_nonce: 0,
            recv_nonce: 0,
        }
    }

    /// The verified long-term public key of the peer.
    pub fn peer_public_key(&self) -> [u8; 32] {
        self.peer_public
    }

    /// URL-safe, unpadded Base64 fingerprint of the peer's public key.
    pub fn peer_fingerprint(&self) -> String {
        fingerprint_of(&self.peer_public)
    }

    /// Number of messages successfully sent on this session.
    pub fn send_count(&self) -> u64 {
        self.send_nonce
    }

    /// Number of messages successfully received on this session.
    pub fn recv_count(&self) -> u64 {
        self.recv_nonce
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let session = Session::new(Zeroizing::new([0u8; 32]), [1u8; 32]);
        assert_eq!(session.send_count(), 0);
        assert_eq!(session.recv_count(), 0);
    }

    #[test]
    fn peer_fingerprint_is_43_chars() {
        let session = Session::new(Zeroizing::new([0u8; 32]), [1u8; 32]);
        assert_eq!(session.peer_fingerprint().len(), 43);
    }
}
