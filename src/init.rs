//! Process-wide, idempotent cryptographic initialization.
//!
//! The C original (`p2p_crypto_init`, backed by libsodium's `sodium_init`)
//! seeds the platform CSPRNG and runs one-time CPU feature detection before
//! any key is generated. The pure-Rust primitives used here (`rand_core`,
//! `ed25519-dalek`, `x25519-dalek`, `chacha20poly1305`) draw randomness
//! lazily from the OS on every call and pick their fastest backend at
//! compile time, so there is no equivalent per-process setup to perform.
//!
//! `init()` is kept anyway so the crate's call sites (`Identity::generate`,
//! `handshake_client`, `handshake_server`, `Session::send_message`,
//! `Session::recv_message`) still carry an explicit, idempotent
//! initialization point per spec, implemented as a
//! `once_cell::sync::OnceCell` rather than a hand-rolled atomic flag.

use once_cell::sync::OnceCell;

static INIT: OnceCell<()> = OnceCell::new();

/// Ensure process-wide crypto initialization has run. Safe to call any
/// number of times from any thread; the first call does the (trivial) work
/// and every subsequent call is a no-op cell read.
pub fn init() {
    INIT.get_or_init(|| {
        tracing::trace!("p2pnet-transport crypto init");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent() {
        init();
        init();
        init();
    }
}
