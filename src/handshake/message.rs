//! Fixed-layout wire messages exchanged during the handshake.
//!
//! Every message is transmitted as the raw bytes of its stated length, with
//! no outer length prefix — sizes are known from the kind and the position
//! in the exchange, mirroring `c-lib/src/crypto/handshake.c`'s
//! `SIZE_CLIENT_HELLO` / `SIZE_SERVER_HELLO` / `SIZE_KEY_EXCHANGE` /
//! `SIZE_ACCEPT` constants.

use std::io::{Read, Write};

use crate::error::{Error, Result};
use crate::framing::{recv_exact, send_exact};

const TAG_CLIENT_HELLO: u8 = 0x01;
const TAG_SERVER_HELLO: u8 = 0x02;
const TAG_KEY_EXCHANGE: u8 = 0x03;
const TAG_ACCEPT: u8 = 0x04;

/// `ClientHello`: tag(1) ∥ client_identity_pub(32) = 33 bytes.
pub struct ClientHello {
    pub client_identity_pub: [u8; 32],
}

impl ClientHello {
    pub const SIZE: usize = 33;

    pub fn send<W: Write>(&self, stream: &mut W) -> Result<()> {
        let mut buf = [0u8; Self::SIZE];
        buf[0] = TAG_CLIENT_HELLO;
        buf[1..33].copy_from_slice(&self.client_identity_pub);
        send_exact(stream, &buf)
    }

    pub fn recv<R: Read>(stream: &mut R) -> Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        recv_exact(stream, &mut buf)?;
        if buf[0] != TAG_CLIENT_HELLO {
            return Err(Error::BadFrame(format!(
                "expected ClientHello tag 0x{:02x}, got 0x{:02x}",
                TAG_CLIENT_HELLO, buf[0]
            )));
        }
        let mut client_identity_pub = [0u8; 32];
        client_identity_pub.copy_from_slice(&buf[1..33]);
        Ok(ClientHello { client_identity_pub })
    }
}

/// `ServerHello`: tag(1) ∥ server_identity_pub(32) ∥ challenge(32) = 65 bytes.
pub struct ServerHello {
    pub server_identity_pub: [u8; 32],
    pub challenge: [u8; 32],
}

impl ServerHello {
    pub const SIZE: usize = 65;

    pub fn send<W: Write>(&self, stream: &mut W) -> Result<()> {
        let mut buf = [0u8; Self::SIZE];
        buf[0] = TAG_SERVER_HELLO;
        buf[1..33].copy_from_slice(&self.server_identity_pub);
        buf[33..65].copy_from_slice(&self.challenge);
        send_exact(stream, &buf)
    }

    pub fn recv<R: Read>(stream: &mut R) -> Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        recv_exact(stream, &mut buf)?;
        if buf[0] != TAG_SERVER_HELLO {
            return Err(Error::BadFrame(format!(
                "expected ServerHello tag 0x{:02x}, got 0x{:02x}",
                TAG_SERVER_HELLO, buf[0]
            )));
        }
        let mut server_identity_pub = [0u8; 32];
        server_identity_pub.copy_from_slice(&buf[1..33]);
        let mut challenge = [0u8; 32];
        challenge.copy_from_slice(&buf[33..65]);
        Ok(ServerHello { server_identity_pub, challenge })
    }
}

/// `KeyExchange`: tag(1) ∥ client_ephemeral_pub(32) ∥ client_sig(64) = 97 bytes.
pub struct KeyExchange {
    pub client_ephemeral_pub: [u8; 32],
    pub client_sig: [u8; 64],
}

impl KeyExchange {
    pub const SIZE: usize = 97;

    pub fn send<W: Write>(&self, stream: &mut W) -> Result<()> {
        let mut buf = [0u8; Self::SIZE];
        buf[0] = TAG_KEY_EXCHANGE;
        buf[1..33].copy_from_slice(&self.client_ephemeral_pub);
        buf[33..97].copy_from_slice(&self.client_sig);
        send_exact(stream, &buf)
    }

    pub fn recv<R: Read>(stream: &mut R) -> Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        recv_exact(stream, &mut buf)?;
        if buf[0] != TAG_KEY_EXCHANGE {
            return Err(Error::BadFrame(format!(
                "expected KeyExchange tag 0x{:02x}, got 0x{:02x}",
                TAG_KEY_EXCHANGE, buf[0]
            )));
        }
        let mut client_ephemeral_pub = [0u8; 32];
        client_ephemeral_pub.copy_from_slice(&buf[1..33]);
        let mut client_sig = [0u8; 64];
        client_sig.copy_from_slice(&buf[33..97]);
        Ok(KeyExchange { client_ephemeral_pub, client_sig })
    }
}

/// `Accept`: tag(1) ∥ server_ephemeral_pub(32) ∥ server_sig(64) = 97 bytes.
pub struct Accept {
    pub server_ephemeral_pub: [u8; 32],
    pub server_sig: [u8; 64],
}

impl Accept {
    pub const SIZE: usize = 97;

    pub fn send<W: Write>(&self, stream: &mut W) -> Result<()> {
        let mut buf = [0u8; Self::SIZE];
        buf[0] = TAG_ACCEPT;
        buf[1..33].copy_from_slice(&self.server_ephemeral_pub);
        buf[33..97].copy_from_slice(&self.server_sig);
        send_exact(stream, &buf)
    }

    pub fn recv<R: Read>(stream: &mut R) -> Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        recv_exact(stream, &mut buf)?;
        if buf[0] != TAG_ACCEPT {
            return Err(Error::BadFrame(format!(
                "expected Accept tag 0x{:02x}, got 0x{:02x}",
                TAG_ACCEPT, buf[0]
            )));
        }
        let mut server_ephemeral_pub = [0u8; 32];
        server_ephemeral_pub.copy_from_slice(&buf[1..33]);
        let mut server_sig = [0u8; 64];
        server_sig.copy_from_slice(&buf[33..97]);
        Ok(Accept { server_ephemeral_pub, server_sig })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn client_hello_rejects_wrong_tag() {
        let mut buf = [0u8; ClientHello::SIZE];
        buf[0] = 0xFF;
        let mut cursor = Cursor::new(buf);
        let err = ClientHello::recv(&mut cursor).unwrap_err();
        assert!(matches!(err, Error::BadFrame(_)));
    }

    #[test]
    fn server_hello_rejects_wrong_tag() {
        let mut buf = [0u8; ServerHello::SIZE];
        buf[0] = 0xFF;
        let mut cursor = Cursor::new(buf);
        let err = ServerHello::recv(&mut cursor).unwrap_err();
        assert!(matches!(err, Error::BadFrame(_)));
    }

    #[test]
    fn key_exchange_rejects_wrong_tag() {
        let mut buf = [0u8; KeyExchange::SIZE];
        buf[0] = 0xFF;
        let mut cursor = Cursor::new(buf);
        let err = KeyExchange::recv(&mut cursor).unwrap_err();
        assert!(matches!(err, Error::BadFrame(_)));
    }

    #[test]
    fn accept_rejects_wrong_tag() {
        let mut buf = [0u8; Accept::SIZE];
        buf[0] = 0xFF;
        let mut cursor = Cursor::new(buf);
        let err = Accept::recv(&mut cursor).unwrap_err();
        assert!(matches!(err, Error::BadFrame(_)));
    }
}
