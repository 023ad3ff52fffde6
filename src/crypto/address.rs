//! Tron address representation and utilities.

use std::fmt;

/// Version byte prepended to every mainnet Tron address.
pub const TRON_VERSION_BYTE: u8 = 0x41;

/// Length of a Base58Check-encoded Tron address.
pub const ADDRESS_LEN: usize = 34;

/// A Tron address: the 20-byte Keccak payload behind the 0x41 version byte.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// Creates an address from the raw 20-byte payload.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Returns the payload with the version byte, as hex (`41...`).
    pub fn to_hex(&self) -> String {
        format!("{:02x}{}", TRON_VERSION_BYTE, hex::encode(self.0))
    }

    /// Returns the Base58Check form users see (`T...`, 34 characters).
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0)
            .with_check_version(TRON_VERSION_BYTE)
            .into_string()
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_base58())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}
