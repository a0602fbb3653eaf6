//! SUDP: AES-128-CBC encrypted search results (§4.7, §6.5).
//!
//! Wire format: a random 16-byte IV prepended to the PKCS#7-padded
//! ciphertext. The key is generated by the searcher, handed to peers
//! inside the originating `SCH`'s `KY` parameter (base32-encoded), and
//! cached for a sliding 15-minute window so a late `URES` can still be
//! decrypted.

use aes::Aes128;
use cbc::{Decryptor, Encryptor};
use cipher::block_padding::Pkcs7;
use cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;

type Aes128CbcEnc = Encryptor<Aes128>;
type Aes128CbcDec = Decryptor<Aes128>;

const KEY_LEN: usize = 16;
const IV_LEN: usize = 16;

/// A 16-byte AES-128 SUDP key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SudpKey([u8; KEY_LEN]);

impl std::fmt::Debug for SudpKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SudpKey(..)")
    }
}

impl SudpKey {
    /// Generates a fresh random key using the OS RNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wraps a raw 16-byte key.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Base32-encodes the key for the `KY` search parameter.
    #[must_use]
    pub fn to_base32(self) -> String {
        base32::encode(base32::Alphabet::Rfc4648 { padding: false }, &self.0)
    }

    /// Decodes a base32-encoded `KY` value back into a key.
    #[must_use]
    pub fn from_base32(text: &str) -> Option<Self> {
        let decoded = base32::decode(base32::Alphabet::Rfc4648 { padding: false }, text)?;
        let bytes: [u8; KEY_LEN] = decoded.try_into().ok()?;
        Some(Self(bytes))
    }
}

/// A failure decrypting an SUDP packet.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SudpError {
    /// The packet was shorter than one IV plus one cipher block.
    #[error("SUDP packet too short to contain an IV and a block")]
    TooShort,
    /// PKCS#7 unpadding failed - most often a wrong key.
    #[error("SUDP padding invalid (wrong key or corrupt packet)")]
    BadPadding,
}

/// Encrypts `plaintext` under `key` with a freshly generated random IV,
/// returning `IV || ciphertext`.
#[must_use]
pub fn encrypt(key: &SudpKey, plaintext: &[u8]) -> Vec<u8> {
    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);
    let mut out = Vec::with_capacity(IV_LEN + plaintext.len() + 16);
    out.extend_from_slice(&iv);
    let ciphertext = Aes128CbcEnc::new(key.as_bytes().into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    out.extend_from_slice(&ciphertext);
    out
}

/// Decrypts an `IV || ciphertext` packet under `key`.
///
/// # Errors
///
/// Returns [`SudpError::TooShort`] if the packet has no room for an IV
/// and at least one block, or [`SudpError::BadPadding`] if PKCS#7
/// unpadding fails (almost always a wrong key, §8 property 8: never
/// panics on a wrong key, only rejects or returns garbage).
pub fn decrypt(key: &SudpKey, packet: &[u8]) -> Result<Vec<u8>, SudpError> {
    if packet.len() < IV_LEN + 16 || (packet.len() - IV_LEN) % 16 != 0 {
        return Err(SudpError::TooShort);
    }
    let (iv, ciphertext) = packet.split_at(IV_LEN);
    let mut buffer = ciphertext.to_vec();
    Aes128CbcDec::new(key.as_bytes().into(), iv.into())
        .decrypt_padded_mut::<Pkcs7>(&mut buffer)
        .map(<[u8]>::to_vec)
        .map_err(|_| SudpError::BadPadding)
}

/// Tries each key in `keys` (most-recently-added first, per §4.7's
/// "insertion order most-recent-first") against `packet`, returning the
/// first successful decryption.
#[must_use]
pub fn decrypt_with_any_key<'a>(
    keys: impl Iterator<Item = &'a SudpKey>,
    packet: &[u8],
) -> Option<Vec<u8>> {
    keys.filter_map(|key| decrypt(key, packet).ok()).next()
}
