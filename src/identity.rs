//! Long-term Ed25519 identity keypairs.

use std::fs;
use std::io::Write as _;
use std::path::Path;

use base64::{engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD}, Engine as _};
use ed25519_dalek::{Keypair, PublicKey as DalekPublicKey, Signature, Signer, Verifier};
use rand_core::OsRng;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::init;

const PRIVATE_HEADER: &str = "-----BEGIN P2P PRIVATE KEY-----";
const PRIVATE_FOOTER: &str = "-----END P2P PRIVATE KEY-----";
const PUBLIC_HEADER: &str = "-----BEGIN P2P PUBLIC KEY-----";
const PUBLIC_FOOTER: &str = "-----END P2P PUBLIC KEY-----";

/// A long-term Ed25519 signing keypair identifying a peer.
///
/// Immutable after construction. The secret key is the standard 64-byte
/// Ed25519 layout (32-byte seed followed by the 32-byte public key) and is
/// wiped from memory when the `Identity` is dropped.
pub struct Identity {
    secret: Zeroizing<[u8; 64]>,
    public: [u8; 32],
}

impl Identity {
    /// Generates a fresh `Identity` using the platform CSPRNG.
    pub fn generate() -> Self {
        init::init();
        let keypair = Keypair::generate(&mut OsRng);
        let public = keypair.public.to_bytes();
        Identity {
            secret: Zeroizing::new(keypair.to_bytes()),
            public,
        }
    }

    /// Confirms that the trailing 32 bytes of the secret key equal the
    /// public key, per the Ed25519 secret-key layout invariant.
    pub fn verify(&self) -> Result<()> {
        let embedded = &self.secret[32..64];
        if embedded.ct_eq(&self.public).unwrap_u8() == 1 {
            Ok(())
        } else {
            Err(Error::Invariant)
        }
    }

    /// The 32-byte Ed25519 public key.
    pub fn public_key(&self) -> [u8; 32] {
        self.public
    }

    /// URL-safe, unpadded Base64 of the public key: exactly 43 characters.
    pub fn fingerprint(&self) -> String {
        fingerprint_of(&self.public)
    }

    /// Signs `message` with the long-term secret key.
    pub(crate) fn sign(&self, message: &[u8]) -> Result<[u8; 64]> {
        let keypair = Keypair::from_bytes(&*self.secret).map_err(|_| Error::Invariant)?;
        Ok(keypair.sign(message).to_bytes())
    }

    /// Saves the identity to `path` in the fixed PEM-like text format,
    /// restricting file permissions to owner read/write where the host OS
    /// supports it.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        init::init();
        let b64_secret = STANDARD.encode(&self.secret[..]);
        let b64_public = STANDARD.encode(&self.public);

        let mut contents = String::new();
        contents.push_str(PRIVATE_HEADER);
        contents.push('\n');
        contents.push_str(&b64_secret);
        contents.push('\n');
        contents.push_str(PRIVATE_FOOTER);
        contents.push('\n');
        contents.push_str(PUBLIC_HEADER);
        contents.push('\n');
        contents.push_str(&b64_public);
        contents.push('\n');
        contents.push_str(PUBLIC_FOOTER);
        contents.push('\n');

        let mut file = fs::File::create(path.as_ref())?;
        file.write_all(contents.as_bytes())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Loads an identity previously written by [`Identity::save`], and
    /// rejects it if the embedded public key does not match.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        init::init();
        let text = fs::read_to_string(path.as_ref())?;

        let b64_secret = extract_block(&text, PRIVATE_HEADER, PRIVATE_FOOTER)?;
        let b64_public = extract_block(&text, PUBLIC_HEADER, PUBLIC_FOOTER)?;

        let secret_bytes = STANDARD
            .decode(b64_secret.trim())
            .map_err(|_| Error::BadFrame("invalid base64 in private key block".into()))?;
        let public_bytes = STANDARD
            .decode(b64_public.trim())
            .map_err(|_| Error::BadFrame("invalid base64 in public key block".into()))?;

        if secret_bytes.len() != 64 {
            return Err(Error::BadFrame(format!(
                "secret key block is {} bytes, expected 64",
                secret_bytes.len()
            )));
        }
        if public_bytes.len() != 32 {
            return Err(Error::BadFrame(format!(
                "public key block is {} bytes, expected 32",
                public_bytes.len()
            )));
        }

        let mut secret = [0u8; 64];
        secret.copy_from_slice(&secret_bytes);
        let mut public = [0u8; 32];
        public.copy_from_slice(&public_bytes);

        let identity = Identity {
            secret: Zeroizing::new(secret),
            public,
        };
        identity.verify()?;
        Ok(identity)
    }
}

fn extract_block<'a>(text: &'a str, header: &str, footer: &str) -> Result<&'a str> {
    let start = text
        .find(header)
        .ok_or_else(|| Error::BadFrame(format!("missing {}", header)))?;
    let after_header = &text[start + header.len()..];
    let end = after_header
        .find(footer)
        .ok_or_else(|| Error::BadFrame(format!("missing {}", footer)))?;
    Ok(after_header[..end].trim())
}

/// URL-safe, unpadded Base64 of a 32-byte public key; shared by
/// `Identity::fingerprint` and `Session::peer_fingerprint`.
pub(crate) fn fingerprint_of(public_key: &[u8; 32]) -> String {
    URL_SAFE_NO_PAD.encode(public_key)
}

/// Verifies an Ed25519 signature under a raw 32-byte public key.
pub(crate) fn verify_signature(public_key: &[u8; 32], message: &[u8], signature: &[u8; 64]) -> Result<()> {
    let key = DalekPublicKey::from_bytes(public_key).map_err(|_| Error::BadSignature)?;
    let sig = Signature::from_bytes(signature).map_err(|_| Error::BadSignature)?;
    key.verify(message, &sig).map_err(|_| Error::BadSignature)
}
