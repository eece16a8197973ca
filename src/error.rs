//! Error types returned by every fallible operation in this crate.

use std::io;

use thiserror::Error;

/// Convenience alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while establishing or using a secure
/// connection.
///
/// Every variant is terminal: the core never retries internally, and the
/// caller is expected to close the underlying byte-stream and drop whatever
/// partially-constructed state (handshake context, session) it was holding.
#[derive(Debug, Error)]
pub enum Error {
    /// The byte-stream reached EOF (a `send`/`recv` returned zero).
    #[error("connection closed by peer")]
    IoClosed,

    /// The byte-stream reported an error (a `send`/`recv` returned negative,
    /// or the underlying `std::io` call failed).
    #[error("i/o error: {0}")]
    IoError(#[from] io::Error),

    /// A frame or handshake message was malformed: out-of-bounds length,
    /// unexpected message tag, or a short `recv_exact`.
    #[error("bad frame: {0}")]
    BadFrame(String),

    /// The peer's identity was rejected by policy (expected-peer mismatch on
    /// the client, or allowlist exclusion on the server).
    #[error("peer identity rejected by policy")]
    PolicyReject,

    /// An Ed25519 signature failed to verify.
    #[error("signature verification failed")]
    BadSignature,

    /// The X25519 key exchange produced a degenerate (all-zero) shared
    /// secret, or an ephemeral public key was malformed.
    #[error("bad key exchange: {0}")]
    BadKeyExchange(&'static str),

    /// The received nonce counter was not strictly ahead of the session's
    /// receive counter: a replay, a rewind, or reordering.
    #[error("replayed or rewound nonce counter")]
    ReplayOrRewind,

    /// AEAD tag verification failed while decrypting a frame.
    #[error("decryption failed")]
    Decrypt,

    /// The send-nonce counter is exhausted (2^64 messages sent); the
    /// session can no longer send.
    #[error("send nonce counter exhausted")]
    CounterExhausted,

    /// An `Identity`'s embedded public key does not match its secret key.
    #[error("identity self-consistency check failed")]
    Invariant,
}
