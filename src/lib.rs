//! A mutually-authenticated handshake and authenticated-encryption message
//! transport for point-to-point peer connections.
//!
//! ```text
//! Identity ---+
//!             |
//!             v
//!   handshake_client/handshake_server  --->  Session  --->  send_message/recv_message
//!             ^
//!             |
//!      PeerPolicy
//! ```
//!
//! An [`Identity`] is a long-term Ed25519 keypair. [`handshake::handshake_client`]
//! and [`handshake::handshake_server`] run a four-message exchange over any
//! `Read + Write` connection, combining ephemeral X25519 key agreement with
//! long-term signatures to produce a [`Session`]: an authenticated,
//! forward-secret channel. From there, [`Session::send_message`] and
//! [`Session::recv_message`] carry ChaCha20-Poly1305-sealed, replay-checked
//! frames for the life of the connection.
//!
//! This crate is the cryptographic core only. It does not open sockets,
//! poll for readiness, or persist anything beyond identity files; callers
//! supply their own connection type and event loop.

mod error;
mod framing;
mod handshake;
mod identity;
mod init;
mod session;
mod transport;

pub use error::{Error, Result};
pub use framing::{recv_exact, recv_frame, send_exact, send_frame, MAX_MESSAGE_SIZE};
pub use handshake::{handshake_client, handshake_server, PeerPolicy};
pub use identity::Identity;
pub use init::init;
pub use session::Session;
