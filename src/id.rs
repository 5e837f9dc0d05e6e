use std::fmt;

use rand::Rng;
use thiserror::Error;

/// Width of the identifier space in bytes (160 bits).
pub const ID_LEN: usize = 20;

/// Width of the identifier space in bits.
pub const ID_BITS: u32 = (ID_LEN * 8) as u32;

/// A 160-bit value in the Kademlia identifier space.
///
/// Stored as big-endian bytes, so the derived `Ord` already gives the
/// correct unsigned numeric ordering without a bignum dependency.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id([u8; ID_LEN]);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdError {
    #[error("invalid identifier length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

impl Id {
    /// The smallest identifier, `0`.
    pub const ZERO: Id = Id([0u8; ID_LEN]);

    /// The largest identifier, `2^160 - 1`.
    pub const MAX: Id = Id([0xffu8; ID_LEN]);

    /// Builds an identifier from exactly [`ID_LEN`] big-endian bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IdError> {
        if bytes.len() != ID_LEN {
            return Err(IdError::InvalidLength {
                expected: ID_LEN,
                actual: bytes.len(),
            });
        }
        let mut data = [0u8; ID_LEN];
        data.copy_from_slice(bytes);
        Ok(Id(data))
    }

    /// Returns the big-endian byte representation.
    pub fn to_bytes(self) -> [u8; ID_LEN] {
        self.0
    }

    /// Samples an identifier uniformly from the 160-bit space.
    ///
    /// Any fair 160-bit sampler works here; the original node hashed an OS
    /// random seed through SHA-1 before use, but that step is a uniformizer,
    /// not a security primitive, so sampling the bytes directly is
    /// equivalent and avoids an extra hashing dependency.
    pub fn random() -> Self {
        let mut data = [0u8; ID_LEN];
        rand::thread_rng().fill(&mut data);
        Id(data)
    }

    /// XOR distance to `other`, itself a value in the identifier space.
    pub fn distance(&self, other: &Id) -> Id {
        let mut res = [0u8; ID_LEN];
        for i in 0..ID_LEN {
            res[i] = self.0[i] ^ other.0[i];
        }
        Id(res)
    }

    /// Number of leading zero bits, MSB-first. `ID_BITS` for `Id::ZERO`.
    pub fn leading_zeros(&self) -> u32 {
        let mut count = 0u32;
        for byte in self.0 {
            if byte == 0 {
                count += 8;
            } else {
                count += byte.leading_zeros();
                break;
            }
        }
        count
    }

    /// The identifier one greater than `self`, or `None` at `Id::MAX`.
    pub(crate) fn checked_successor(self) -> Option<Id> {
        let mut out = self.0;
        for i in (0..ID_LEN).rev() {
            if out[i] == 0xff {
                out[i] = 0;
            } else {
                out[i] += 1;
                return Some(Id(out));
            }
        }
        None
    }

    fn as_short_hex(&self) -> String {
        let hex_id = hex::encode(self.0);
        let trimmed = hex_id.trim_start_matches('0');
        if trimmed.is_empty() {
            "0".to_owned()
        } else {
            trimmed.to_owned()
        }
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Id").field(&self.as_short_hex()).finish()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_short_hex())
    }
}
