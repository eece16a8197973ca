//! The handshake state machine: a four-message exchange combining ephemeral
//! X25519 key agreement, long-term Ed25519 identity signatures, a
//! server-issued challenge, and session-key derivation.
//!
//! Threat model and message formats are documented on
//! [`handshake_client`] and [`handshake_server`]; see also
//! `c-lib/src/crypto/handshake.c`, which this state machine mirrors
//! message-for-message.

mod kdf;
pub mod policy;

pub(crate) mod message;

use std::io::{Read, Write};

use rand_core::OsRng;
use subtle::ConstantTimeEq;
use x25519_dalek::{EphemeralSecret, PublicKey as EphemeralPublic};
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::identity::{verify_signature, Identity};
use crate::session::Session;

pub use policy::PeerPolicy;

use message::{Accept, ClientHello, KeyExchange, ServerHello};

/// Runs the client side of the handshake over `conn`.
///
/// Steps (spec §4.3):
/// 1. Generate an ephemeral X25519 keypair.
/// 2. Send `ClientHello`.
/// 3. Receive `ServerHello`; extract the server's identity and challenge.
/// 4. If `expected_peer` is set, reject (constant-time) unless it matches
///    the server's identity.
/// 5. Sign `challenge ∥ client_ephemeral_pub`.
/// 6. Send `KeyExchange`.
/// 7. Receive `Accept`; extract the server's ephemeral key and signature.
/// 8. Verify the server's signature over
///    `challenge ∥ server_ephemeral_pub ∥ client_ephemeral_pub`.
/// 9. Compute the ECDH shared secret; reject an all-zero result.
/// 10. Derive the session key and return a [`Session`].
///
/// Any deviation — a short read, an unexpected tag, a signature failure, a
/// policy mismatch, or a degenerate shared secret — is a terminal failure;
/// no partial session is ever returned.
pub fn handshake_client<T: Read + Write>(
    conn: &mut T,
    identity: &Identity,
    expected_peer: Option<[u8; 32]>,
) -> Result<Session> {
    crate::init::init();

    let client_pub = identity.public_key();

    // Step 1: ephemeral keypair.
    let ephemeral_secret = EphemeralSecret::new(&mut OsRng);
    let ephemeral_public = EphemeralPublic::from(&ephemeral_secret);

    // Step 2.
    tracing::trace!("handshake_client: sending ClientHello");
    ClientHello { client_identity_pub: client_pub }.send(conn)?;

    // Step 3.
    let server_hello = ServerHello::recv(conn)?;
    let server_pub = server_hello.server_identity_pub;
    let challenge = server_hello.challenge;
    tracing::trace!("handshake_client: received ServerHello");

    // Step 4.
    if let Some(expected) = expected_peer {
        if expected.ct_eq(&server_pub).unwrap_u8() != 1 {
            tracing::warn!("handshake_client: peer identity mismatch");
            return Err(Error::PolicyReject);
        }
    }

    // Step 5.
    let mut to_sign = Zeroizing::new([0u8; 64]);
    to_sign[..32].copy_from_slice(&challenge);
    to_sign[32..].copy_from_slice(ephemeral_public.as_bytes());
    let client_sig = identity.sign(&to_sign[..])?;

    // Step 6.
    KeyExchange {
        client_ephemeral_pub: *ephemeral_public.as_bytes(),
        client_sig,
    }
    .send(conn)?;
    tracing::trace!("handshake_client: sent KeyExchange");

    // Step 7.
    let accept = Accept::recv(conn)?;
    tracing::trace!("handshake_client: received Accept");

    // Step 8.
    let mut server_signed = Zeroizing::new([0u8; 96]);
    server_signed[..32].copy_from_slice(&challenge);
    server_signed[32..64].copy_from_slice(&accept.server_ephemeral_pub);
    server_signed[64..].copy_from_slice(ephemeral_public.as_bytes());
    verify_signature(&server_pub, &server_signed[..], &accept.server_sig)?;

    // Step 9.
    let shared_secret = ephemeral_secret.diffie_hellman(&EphemeralPublic::from(accept.server_ephemeral_pub));
    if shared_secret.as_bytes().ct_eq(&[0u8; 32]).unwrap_u8() == 1 {
        return Err(Error::BadKeyExchange("all-zero shared secret (low-order point)"));
    }
    let shared_secret = Zeroizing::new(*shared_secret.as_bytes());

    // Step 10.
    let session_key = kdf::derive_session_key(&shared_secret, &client_pub, &server_pub);
    tracing::debug!("handshake_client: session established with {}", crate::identity::fingerprint_of(&server_pub));

    Ok(Session::new(session_key, server_pub))
}

/// Runs the server side of the handshake over `conn`.
///
/// Steps (spec §4.3):
/// 1. Generate an ephemeral X25519 keypair.
/// 2. Generate a fresh 32-byte challenge from the CSPRNG.
/// 3. Receive `ClientHello`; extract the client's identity.
/// 4. Consult `policy`; reject clients it does not accept.
/// 5. Send `ServerHello`.
/// 6. Receive `KeyExchange`; extract the client's ephemeral key and
///    signature.
/// 7. Verify the client's signature over
///    `challenge ∥ client_ephemeral_pub`.
/// 8. Sign `challenge ∥ server_ephemeral_pub ∥ client_ephemeral_pub`.
/// 9. Send `Accept`.
/// 10. Compute the ECDH shared secret; reject an all-zero result.
/// 11. Derive the session key and return a [`Session`].
pub fn handshake_server<T: Read + Write>(
    conn: &mut T,
    identity: &Identity,
    policy: &PeerPolicy,
) -> Result<Session> {
    crate::init::init();

    let server_pub = identity.public_key();

    // Step 1.
    let ephemeral_secret = EphemeralSecret::new(&mut OsRng);
    let ephemeral_public = EphemeralPublic::from(&ephemeral_secret);

    // Step 2.
    let mut challenge = [0u8; 32];
    rand_core::RngCore::fill_bytes(&mut OsRng, &mut challenge);

    // Step 3.
    let client_hello = ClientHello::recv(conn)?;
    let client_pub = client_hello.client_identity_pub;
    tracing::trace!("handshake_server: received ClientHello");

    // Step 4.
    if !policy.accepts(&client_pub) {
        tracing::warn!("handshake_server: client not in allowlist");
        return Err(Error::PolicyReject);
    }

    // Step 5.
    ServerHello {
        server_identity_pub: server_pub,
        challenge,
    }
    .send(conn)?;
    tracing::trace!("handshake_server: sent ServerHello");

    // Step 6.
    let key_exchange = KeyExchange::recv(conn)?;
    tracing::trace!("handshake_server: received KeyExchange");

    // Step 7.
    let mut client_signed = Zeroizing::new([0u8; 64]);
    client_signed[..32].copy_from_slice(&challenge);
    client_signed[32..].copy_from_slice(&key_exchange.client_ephemeral_pub);
    verify_signature(&client_pub, &client_signed[..], &key_exchange.client_sig)?;

    // Step 8.
    let mut to_sign = Zeroizing::new([0u8; 96]);
    to_sign[..32].copy_from_slice(&challenge);
    to_sign[32..64].copy_from_slice(ephemeral_public.as_bytes());
    to_sign[64..].copy_from_slice(&key_exchange.client_ephemeral_pub);
    let server_sig = identity.sign(&to_sign[..])?;

    // Step 9.
    Accept {
        server_ephemeral_pub: *ephemeral_public.as_bytes(),
        server_sig,
    }
    .send(conn)?;
    tracing::trace!("handshake_server: sent Accept");

    // Step 10.
    let shared_secret =
        ephemeral_secret.diffie_hellman(&EphemeralPublic::from(key_exchange.client_ephemeral_pub));
    if shared_secret.as_bytes().ct_eq(&[0u8; 32]).unwrap_u8() == 1 {
        return Err(Error::BadKeyExchange("all-zero shared secret (low-order point)"));
    }
    let shared_secret = Zeroizing::new(*shared_secret.as_bytes());

    // Step 11.
    let session_key = kdf::derive_session_key(&shared_secret, &client_pub, &server_pub);
    tracing::debug!("handshake_server: session established with {}", crate::identity::fingerprint_of(&client_pub));

    Ok(Session::new(session_key, client_pub))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn client_and_server_agree_on_session_key() {
        let (pipe1, pipe2) = pipe::bipipe_buffered();

        let client_identity = Identity::generate();
        let server_identity = Identity::generate();
        let client_pub = client_identity.public_key();
        let server_pub = server_identity.public_key();

        let client = thread::spawn(move || {
            let mut conn = pipe1;
            handshake_client(&mut conn, &client_identity, None).expect("client handshake should succeed")
        });

        let server = thread::spawn(move || {
            let mut conn = pipe2;
            handshake_server(&mut conn, &server_identity, &PeerPolicy::AcceptAny)
                .expect("server handshake should succeed")
        });

        let client_session = client.join().unwrap();
        let server_session = server.join().unwrap();

        assert_eq!(*client_session.session_key, *server_session.session_key);
        assert_eq!(client_session.peer_public_key(), server_pub);
        assert_eq!(server_session.peer_public_key(), client_pub);
    }

    #[test]
    fn expected_peer_mismatch_rejects_client() {
        let (pipe1, pipe2) = pipe::bipipe_buffered();
        let fake_peer = [0xABu8; 32];

        let client = thread::spawn(move || {
            let mut conn = pipe1;
            let identity = Identity::generate();
            handshake_client(&mut conn, &identity, Some(fake_peer))
        });

        let _server = thread::spawn(move || {
            let mut conn = pipe2;
            let identity = Identity::generate();
            let _ = handshake_server(&mut conn, &identity, &PeerPolicy::AcceptAny);
        });

        let result = client.join().unwrap();
        assert!(matches!(result, Err(Error::PolicyReject)));
    }

    #[test]
    fn allowlist_excluding_client_rejects_server_side() {
        let (pipe1, pipe2) = pipe::bipipe_buffered();
        let other_client = Identity::generate();
        let allowlist = PeerPolicy::Allowlist(vec![other_client.public_key()]);

        let _client = thread::spawn(move || {
            let mut conn = pipe1;
            let identity = Identity::generate();
            let _ = handshake_client(&mut conn, &identity, None);
        });

        let server = thread::spawn(move || {
            let mut conn = pipe2;
            let identity = Identity::generate();
            handshake_server(&mut conn, &identity, &allowlist)
        });

        let result = server.join().unwrap();
        assert!(matches!(result, Err(Error::PolicyReject)));
    }
}
