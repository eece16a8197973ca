//! Session-key derivation.
//!
//! `session_key = BLAKE2b-256(shared_secret ∥ client_identity_pub ∥
//! server_identity_pub ∥ "P2PNetSessionKey\0")`, matching
//! `c-lib/src/crypto/handshake.c`'s `derive_session_key`. Both sides place
//! the client's identity first and the server's second regardless of which
//! side is computing, which makes the derivation role-asymmetric and
//! identical on both ends.

use blake2::digest::{Update, VariableOutput};
use blake2::Blake2bVar;
use zeroize::Zeroizing;

const DOMAIN_SEPARATOR: &[u8] = b"P2PNetSessionKey\0";

/// Derives the 32-byte session key from the ECDH shared secret and both
/// parties' long-term identity public keys.
pub fn derive_session_key(
    shared_secret: &[u8; 32],
    client_identity_pub: &[u8; 32],
    server_identity_pub: &[u8; 32],
) -> Zeroizing<[u8; 32]> {
    let mut input = Zeroizing::new([0u8; 32 + 32 + 32 + 17]);
    input[0..32].copy_from_slice(shared_secret);
    input[32..64].copy_from_slice(client_identity_pub);
    input[64..96].copy_from_slice(server_identity_pub);
    input[96..113].copy_from_slice(DOMAIN_SEPARATOR);

    let mut hasher = Blake2bVar::new(32).expect("32 is a valid BLAKE2b output length");
    hasher.update(&input[..]);

    let mut out = Zeroizing::new([0u8; 32]);
    hasher
        .finalize_variable(&mut out[..])
        .expect("output buffer is exactly the requested length");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_and_role_asymmetric() {
        let shared = [7u8; 32];
        let client_pub = [1u8; 32];
        let server_pub = [2u8; 32];

        let a = derive_session_key(&shared, &client_pub, &server_pub);
        let b = derive_session_key(&shared, &client_pub, &server_pub);
        assert_eq!(*a, *b);

        let swapped = derive_session_key(&shared, &server_pub, &client_pub);
        assert_ne!(*a, *swapped);
    }
}
