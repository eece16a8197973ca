//! Authenticated-encryption message transport over an established
//! [`Session`].
//!
//! Every message is ChaCha20-Poly1305-sealed under the session key with a
//! nonce built from a monotonic 64-bit counter, then sent as
//! `total_length(4, big-endian) ∥ nonce(12) ∥ ciphertext∥tag`. The nonce's
//! counter travels on the wire so the receiver can check it directly
//! against its own expectation rather than trusting its local counter
//! alone. Send and receive counters are independent and start at zero; a
//! receiver's counter names the counter it next expects, so any received
//! counter below it is a replay or a rewind.

use std::convert::TryInto;
use std::io::{Read, Write};

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};

use crate::error::{Error, Result};
use crate::framing::{recv_exact, send_exact, MAX_MESSAGE_SIZE};
use crate::session::Session;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const MIN_TOTAL_LENGTH: usize = NONCE_LEN + TAG_LEN;
const MAX_TOTAL_LENGTH: usize = NONCE_LEN + TAG_LEN + MAX_MESSAGE_SIZE;

/// Builds the 12-byte nonce for `counter`: an 8-byte big-endian counter
/// followed by 4 zero bytes.
fn build_nonce(counter: u64) -> [u8; NONCE_LEN] {
    let mut bytes = [0u8; NONCE_LEN];
    bytes[..8].copy_from_slice(&counter.to_be_bytes());
    bytes
}

impl Session {
    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.session_key[..]))
    }

    /// Encrypts and sends one message. The send counter advances only on
    /// success; a failed send leaves the counter untouched, but the spec's
    /// own guidance is to tear the session down on any send failure rather
    /// than retry.
    pub fn send_message<W: Write>(&mut self, stream: &mut W, plaintext: &[u8]) -> Result<()> {
        crate::init::init();

        if self.send_nonce == u64::MAX {
            return Err(Error::CounterExhausted);
        }

        let nonce_bytes = build_nonce(self.send_nonce);
        let sealed = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| Error::Decrypt)?;

        let total_length = (NONCE_LEN + sealed.len()) as u32;
        send_exact(stream, &total_length.to_be_bytes())?;
        send_exact(stream, &nonce_bytes)?;
        send_exact(stream, &sealed)?;

        self.send_nonce += 1;
        Ok(())
    }

    /// Receives and decrypts one message.
    ///
    /// The counter carried in the wire nonce is checked against this
    /// session's receive counter before decryption is attempted: a counter
    /// below the expectation is rejected outright as a replay or rewind.
    /// The receive counter advances only on successful decryption, to
    /// exactly `counter + 1`.
    pub fn recv_message<R: Read>(&mut self, stream: &mut R) -> Result<Vec<u8>> {
        crate::init::init();

        let mut len_bytes = [0u8; 4];
        recv_exact(stream, &mut len_bytes)?;
        let total_length = u32::from_be_bytes(len_bytes) as usize;

        if total_length < MIN_TOTAL_LENGTH || total_length > MAX_TOTAL_LENGTH {
            return Err(Error::BadFrame(format!(
                "encrypted frame length {} out of bounds",
                total_length
            )));
        }

        let mut nonce_bytes = [0u8; NONCE_LEN];
        recv_exact(stream, &mut nonce_bytes)?;
        let counter = u64::from_be_bytes(nonce_bytes[..8].try_into().expect("8 bytes"));

        if counter < self.recv_nonce {
            return Err(Error::ReplayOrRewind);
        }

        let mut sealed = vec![0u8; total_length - NONCE_LEN];
        recv_exact(stream, &mut sealed)?;

        let plaintext = self
            .cipher()
            .decrypt(Nonce::from_slice(&nonce_bytes), sealed.as_slice())
            .map_err(|_| Error::Decrypt)?;

        self.recv_nonce = counter + 1;
        Ok(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeroize::Zeroizing;

    fn paired_sessions() -> (Session, Session) {
        let key = Zeroizing::new([0x42u8; 32]);
        (
            Session::new(key.clone(), [1u8; 32]),
            Session::new(key, [2u8; 32]),
        )
    }

    #[test]
    fn round_trip_single_message() {
        let (mut sender, mut receiver) = paired_sessions();
        let mut wire = Vec::new();

        sender.send_message(&mut wire, b"hello peer").unwrap();
        let plaintext = receiver.recv_message(&mut wire.as_slice()).unwrap();

        assert_eq!(plaintext, b"hello peer");
        assert_eq!(sender.send_count(), 1);
        assert_eq!(receiver.recv_count(), 1);
    }

    #[test]
    fn round_trip_multiple_messages_advance_counters() {
        let (mut sender, mut receiver) = paired_sessions();
        let mut wire = Vec::new();

        for i in 0..5u32 {
            sender
                .send_message(&mut wire, format!("msg {}", i).as_bytes())
                .unwrap();
        }

        let mut cursor = wire.as_slice();
        for i in 0..5u32 {
            let plaintext = receiver.recv_message(&mut cursor).unwrap();
            assert_eq!(plaintext, format!("msg {}", i).as_bytes());
        }
        assert_eq!(sender.send_count(), 5);
        assert_eq!(receiver.recv_count(), 5);
    }

    #[test]
    fn tampered_ciphertext_fails_decryption_and_does_not_advance_counter() {
        let (mut sender, mut receiver) = paired_sessions();
        let mut wire = Vec::new();

        sender.send_message(&mut wire, b"do not tamper").unwrap();
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;

        let result = receiver.recv_message(&mut wire.as_slice());
        assert!(matches!(result, Err(Error::Decrypt)));
        assert_eq!(receiver.recv_count(), 0);
    }

    #[test]
    fn duplicated_frame_is_rejected_as_replay() {
        let (mut sender, mut receiver) = paired_sessions();
        let mut wire = Vec::new();

        sender.send_message(&mut wire, b"only once").unwrap();
        receiver.recv_message(&mut wire.as_slice()).unwrap();

        let result = receiver.recv_message(&mut wire.as_slice());
        assert!(matches!(result, Err(Error::ReplayOrRewind)));
    }

    #[test]
    fn swapped_frames_are_both_rejected() {
        let (mut sender, mut receiver) = paired_sessions();
        let mut first = Vec::new();
        let mut second = Vec::new();

        sender.send_message(&mut first, b"first").unwrap();
        sender.send_message(&mut second, b"second").unwrap();

        // Deliver k+1 before k: it advances the counter past k...
        receiver.recv_message(&mut second.as_slice()).unwrap();
        assert_eq!(receiver.recv_count(), 2);

        // ...so k now looks like a rewind.
        let result = receiver.recv_message(&mut first.as_slice());
        assert!(matches!(result, Err(Error::ReplayOrRewind)));
    }

    #[test]
    fn wrong_key_fails_decryption() {
        let mut sender = Session::new(Zeroizing::new([1u8; 32]), [1u8; 32]);
        let mut receiver = Session::new(Zeroizing::new([2u8; 32]), [2u8; 32]);
        let mut wire = Vec::new();

        sender.send_message(&mut wire, b"mismatched keys").unwrap();
        let result = receiver.recv_message(&mut wire.as_slice());
        assert!(matches!(result, Err(Error::Decrypt)));
    }

    #[test]
    fn counter_exhaustion_is_rejected_before_encrypting() {
        let mut sender = Session::new(Zeroizing::new([9u8; 32]), [1u8; 32]);
        sender.send_nonce = u64::MAX;
        let mut wire = Vec::new();
        let result = sender.send_message(&mut wire, b"one too many");
        assert!(matches!(result, Err(Error::CounterExhausted)));
        assert_eq!(sender.send_nonce, u64::MAX);
    }

    #[test]
    fn undersized_total_length_is_rejected() {
        let mut receiver = Session::new(Zeroizing::new([1u8; 32]), [1u8; 32]);
        let mut wire = Vec::new();
        send_exact(&mut wire, &20u32.to_be_bytes()).unwrap();
        wire.extend_from_slice(&[0u8; 20]);

        let result = receiver.recv_message(&mut wire.as_slice());
        assert!(matches!(result, Err(Error::BadFrame(_))));
    }
}
