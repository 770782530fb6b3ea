//! Strong-name identity of an assembly: a full public key, or the 8-byte token derived from it.

use md5::{Digest, Md5};
use sha1::Sha1;

use crate::Result;

#[allow(non_snake_case)]
/// Hash algorithms used to derive a public key token
pub mod AssemblyHashAlgorithm {
    /// No hashing
    pub const NONE: u32 = 0x0000;
    /// MD5
    pub const MD5: u32 = 0x8003;
    /// SHA1
    pub const SHA1: u32 = 0x8004;
}

/// Cryptographic identity of a strong-named assembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// The full public key blob
    PubKey(Vec<u8>),
    /// The public key token (last 8 bytes of the key's hash, little-endian)
    Token(u64),
}

impl Identity {
    /// Create an identity from raw blob data
    ///
    /// ## Arguments
    /// * 'data'    - The public key, or at least 8 bytes of token data
    /// * 'is_pub'  - Whether `data` is a full public key
    ///
    /// # Errors
    /// Returns an error if a token is requested from less than 8 bytes.
    pub fn from(data: &[u8], is_pub: bool) -> Result<Self> {
        Ok(if is_pub {
            Identity::PubKey(data.to_vec())
        } else {
            Identity::Token(read_token(data)?)
        })
    }

    /// Derive the public key token using the given hash algorithm
    ///
    /// A [`Identity::Token`] is returned as-is regardless of `algo`.
    ///
    /// # Errors
    /// Returns an error if `algo` is neither MD5 nor SHA1 for a public key identity.
    pub fn to_token(&self, algo: u32) -> Result<u64> {
        match &self {
            Identity::PubKey(data) => match algo {
                AssemblyHashAlgorithm::MD5 => {
                    let mut hasher = Md5::new();
                    hasher.update(data);

                    let result = hasher.finalize();

                    read_token(&result[result.len() - 8..])
                }
                AssemblyHashAlgorithm::SHA1 => {
                    let mut hasher = Sha1::new();
                    hasher.update(data);

                    let result = hasher.finalize();

                    read_token(&result[result.len() - 8..])
                }
                _ => Err(invalid_metadata!(
                    "Unsupported public key hash algorithm 0x{:04x}",
                    algo
                )),
            },
            Identity::Token(token) => Ok(*token),
        }
    }
}

fn read_token(data: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = data
        .get(..8)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| {
            invalid_metadata!("Public key token needs 8 bytes, got {}", data.len())
        })?;

    Ok(u64::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_from_pubkey() {
        let data = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
        let identity = Identity::from(&data, true).unwrap();
        assert_eq!(identity, Identity::PubKey(data));
    }

    #[test]
    fn test_identity_from_token() {
        let data = vec![0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0];
        let identity = Identity::from(&data, false).unwrap();
        assert_eq!(identity, Identity::Token(0xF0DEBC9A78563412));
    }

    #[test]
    fn test_identity_from_token_insufficient_data() {
        assert!(Identity::from(&[1, 2, 3], false).is_err());
    }

    #[test]
    fn test_to_token_from_pubkey_sha1() {
        let pubkey_data = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
        let identity = Identity::PubKey(pubkey_data.clone());

        let token = identity.to_token(AssemblyHashAlgorithm::SHA1).unwrap();

        let mut hasher = Sha1::new();
        hasher.update(&pubkey_data);
        let result = hasher.finalize();
        let expected = read_token(&result[result.len() - 8..]).unwrap();

        assert_eq!(token, expected);
    }

    #[test]
    fn test_md5_and_sha1_differ() {
        let identity = Identity::PubKey((0..=255).collect());

        let token_md5 = identity.to_token(AssemblyHashAlgorithm::MD5).unwrap();
        let token_sha1 = identity.to_token(AssemblyHashAlgorithm::SHA1).unwrap();

        assert_ne!(token_md5, token_sha1);
    }

    #[test]
    fn test_to_token_from_token_identity() {
        let identity = Identity::Token(0x123456789ABCDEF0);

        assert_eq!(
            identity.to_token(AssemblyHashAlgorithm::NONE).unwrap(),
            0x123456789ABCDEF0
        );
        assert_eq!(
            identity.to_token(AssemblyHashAlgorithm::MD5).unwrap(),
            0x123456789ABCDEF0
        );
    }

    #[test]
    fn test_to_token_unsupported_algorithm() {
        let identity = Identity::PubKey(vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(identity.to_token(0x9999).is_err());
    }
}
