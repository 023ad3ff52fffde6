//! Tron keypair generation.

use secp256k1::{PublicKey, Secp256k1, SecretKey};
use tiny_keccak::{Hasher, Keccak};

use super::Address;

/// Errors raised when building a keypair from caller-supplied bytes.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("Invalid secret key: {0}")]
    InvalidSecret(#[from] secp256k1::Error),
}

/// A secp256k1 private key together with its derived Tron address.
#[derive(Debug, Clone)]
pub struct Keypair {
    /// The private key bytes (32 bytes)
    secret_key: [u8; 32],
    /// The derived Tron address
    address: Address,
}

impl Keypair {
    /// Generates a new random keypair from the thread-local CSPRNG.
    #[inline]
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut rand::thread_rng());

        Self {
            secret_key: secret_key.secret_bytes(),
            address: Self::derive_address(&public_key),
        }
    }

    /// Rebuilds a keypair from an existing secret key.
    pub fn from_secret_key(secret_bytes: [u8; 32]) -> Result<Self, KeyError> {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(&secret_bytes)?;
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);

        Ok(Self {
            secret_key: secret_bytes,
            address: Self::derive_address(&public_key),
        })
    }

    /// Tron uses the Ethereum derivation: the last 20 bytes of
    /// Keccak-256 over the uncompressed public key without its 0x04 tag.
    #[inline]
    fn derive_address(public_key: &PublicKey) -> Address {
        let public_key_bytes = public_key.serialize_uncompressed();

        let mut hasher = Keccak::v256();
        hasher.update(&public_key_bytes[1..]);
        let mut hash = [0u8; 32];
        hasher.finalize(&mut hash);

        let mut address_bytes = [0u8; 20];
        address_bytes.copy_from_slice(&hash[12..]);
        Address::from_bytes(address_bytes)
    }

    /// Returns the private key as a hex string (without 0x prefix).
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key)
    }

    /// Returns a reference to the derived address.
    #[inline]
    pub fn address(&self) -> &Address {
        &self.address
    }
}

/// Key generation primitive used by the brute-force searcher.
///
/// Returns `(private_key_hex, base58_address)`.
pub fn generate_keypair() -> (String, String) {
    let keypair = Keypair::generate();
    (keypair.private_key_hex(), keypair.address().to_base58())
}
