//! Key generation and Tron address derivation.
//!
//! - secp256k1 keys from the OS-seeded thread RNG
//! - Keccak-256 payload, Base58Check with the 0x41 version byte

mod address;
mod keypair;

pub use address::{Address, ADDRESS_LEN, TRON_VERSION_BYTE};
pub use keypair::{generate_keypair, KeyError, Keypair};
