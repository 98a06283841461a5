use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::codec::{base58check_decode, base58check_encode};
use crate::error::{Error, Result};

pub const XPUB_VERSION_MAINNET: u32 = 0x0488_B21E;
pub const XPUB_VERSION_TESTNET: u32 = 0x0435_87CF;

pub const CHAIN_CODE_SIZE: usize = 32;
pub const COMPRESSED_KEY_SIZE: usize = 33;
pub const UNCOMPRESSED_KEY_SIZE: usize = 65;
pub const EXTENDED_KEY_SIZE: usize = 4 + 1 + 4 + 4 + CHAIN_CODE_SIZE + COMPRESSED_KEY_SIZE;

// SEC1 point prefixes
pub const POINT_UNCOMPRESSED: u8 = 0x04;
pub const POINT_COMPRESSED_EVEN: u8 = 0x02;
pub const POINT_COMPRESSED_ODD: u8 = 0x03;

/// Fields of a BIP32 extended public key as read from the dongle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtendedPublicKey {
    pub depth: u8,
    pub parent_fingerprint: [u8; 4],
    pub child_number: u32,
    pub chain_code: [u8; CHAIN_CODE_SIZE],
    /// SEC1 encoded, compressed or not.
    pub public_key: Vec<u8>,
}

/// Turn a 65 byte `04 || x || y` point into `02|03 || x`. Compressed points are returned as is.
pub fn compress_public_key(public_key: &[u8]) -> Result<[u8; COMPRESSED_KEY_SIZE]> {
    let mut compressed = [0u8; COMPRESSED_KEY_SIZE];

    match (public_key.len(), public_key.first()) {
        (COMPRESSED_KEY_SIZE, Some(&POINT_COMPRESSED_EVEN)) | (COMPRESSED_KEY_SIZE, Some(&POINT_COMPRESSED_ODD)) => {
            compressed.copy_from_slice(public_key);
        }
        (UNCOMPRESSED_KEY_SIZE, Some(&POINT_UNCOMPRESSED)) => {
            compressed[0] = POINT_COMPRESSED_EVEN | (public_key[UNCOMPRESSED_KEY_SIZE - 1] & 0x01);
            compressed[1..].copy_from_slice(&public_key[1..COMPRESSED_KEY_SIZE]);
        }
        (len, prefix) => {
            return Err(Error::InvalidArgument(format!(
                "Unsupported public key encoding, {} bytes with prefix {:?}",
                len, prefix
            )));
        }
    }

    Ok(compressed)
}

impl ExtendedPublicKey {
    /// The 78 byte payload, before base58check.
    pub fn to_payload(&self, is_testnet: bool) -> Result<Vec<u8>> {
        let public_key = compress_public_key(&self.public_key)?;
        let version = if is_testnet { XPUB_VERSION_TESTNET } else { XPUB_VERSION_MAINNET };

        let mut data = Vec::with_capacity(EXTENDED_KEY_SIZE);

        data.write_u32::<BigEndian>(version)?;
        data.write_u8(self.depth)?;
        data.extend_from_slice(&self.parent_fingerprint);
        data.write_u32::<BigEndian>(self.child_number)?;
        data.extend_from_slice(&self.chain_code);
        data.extend_from_slice(&public_key);

        Ok(data)
    }

    /// `xpub...` on mainnet, `tpub...` on testnet.
    pub fn serialize(&self, is_testnet: bool) -> Result<String> {
        Ok(base58check_encode(&self.to_payload(is_testnet)?))
    }

    /// Decode an xpub or tpub string, returns the fields and whether it was a testnet key.
    pub fn deserialize(encoded: &str) -> Result<(Self, bool)> {
        let data = base58check_decode(encoded)?;

        if data.len() != EXTENDED_KEY_SIZE {
            return Err(Error::InvalidArgument(format!(
                "Extended key payload is {} bytes, expected {}",
                data.len(),
                EXTENDED_KEY_SIZE
            )));
        }

        let mut cursor = Cursor::new(data);

        let is_testnet = match cursor.read_u32::<BigEndian>()? {
            XPUB_VERSION_MAINNET => false,
            XPUB_VERSION_TESTNET => true,
            version => return Err(Error::InvalidArgument(format!("Unknown extended key version {:08x}", version))),
        };

        let depth = cursor.read_u8()?;

        let mut parent_fingerprint = [0u8; 4];
        cursor.read_exact(&mut parent_fingerprint)?;

        let child_number = cursor.read_u32::<BigEndian>()?;

        let mut chain_code = [0u8; CHAIN_CODE_SIZE];
        cursor.read_exact(&mut chain_code)?;

        let mut public_key = vec![0u8; COMPRESSED_KEY_SIZE];
        cursor.read_exact(&mut public_key[..])?;

        // Validates the point prefix
        compress_public_key(&public_key)?;

        Ok((
            ExtendedPublicKey {
                depth,
                parent_fingerprint,
                child_number,
                chain_code,
                public_key,
            },
            is_testnet,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn master_key() -> ExtendedPublicKey {
        let mut chain_code = [0u8; CHAIN_CODE_SIZE];
        chain_code.copy_from_slice(&hex::decode("873dff81c02f525623fd1fe5167eac3a55a049de3d314bb42ee227ffed37d508").unwrap());

        ExtendedPublicKey {
            depth: 0,
            parent_fingerprint: [0; 4],
            child_number: 0,
            chain_code,
            public_key: hex::decode("0339a36013301597daef41fbe593a02cc513d0b55527ec2df1050e2e8ff49c85c2").unwrap(),
        }
    }

    #[test]
    fn test_master_xpub() {
        let xpub = master_key().serialize(false).unwrap();
        assert_eq!(
            xpub,
            "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8"
        );
        assert_eq!(ExtendedPublicKey::deserialize(&xpub).unwrap(), (master_key(), false));
    }

    #[test]
    fn test_hardened_child_xpub() {
        let mut chain_code = [0u8; CHAIN_CODE_SIZE];
        chain_code.copy_from_slice(&hex::decode("47fdacbd0f1097043b78c63c20c34ef4ed9a111d980047ad16282c7ae6236141").unwrap());

        let child = ExtendedPublicKey {
            depth: 1,
            parent_fingerprint: [0x34, 0x42, 0x19, 0x3e],
            child_number: 0x8000_0000,
            chain_code,
            public_key: hex::decode("035a784662a4a20a65bf6aab9ae98a6c068a81c52e4b032c0fb5400c706cfccc56").unwrap(),
        };

        assert_eq!(
            child.serialize(false).unwrap(),
            "xpub68Gmy5EdvgibQVfPdqkBBCHxA5htiqg55crXYuXoQRKfDBFA1WEjWgP6LHhwBZeNK1VTsfTFUHCdrfp1bgwQ9xv5ski8PX9rL2dZXvgGDnw"
        );
    }

    #[test]
    fn test_testnet_tpub() {
        let tpub = master_key().serialize(true).unwrap();
        assert!(tpub.starts_with("tpub"));
        assert_eq!(master_key().to_payload(true).unwrap().len(), EXTENDED_KEY_SIZE);

        let (decoded, is_testnet) = ExtendedPublicKey::deserialize(&tpub).unwrap();
        assert!(is_testnet);
        assert_eq!(decoded, master_key());
    }

    #[test]
    fn test_uncompressed_key_is_compressed() {
        let mut uncompressed = vec![POINT_UNCOMPRESSED];
        uncompressed.extend_from_slice(&[0x11; 32]);
        uncompressed.extend_from_slice(&[0x22; 31]);
        uncompressed.push(0x23);

        let compressed = compress_public_key(&uncompressed).unwrap();
        assert_eq!(compressed[0], POINT_COMPRESSED_ODD);
        assert_eq!(&compressed[1..], &[0x11; 32]);

        let key = ExtendedPublicKey {
            public_key: uncompressed,
            ..master_key()
        };
        assert_eq!(key.to_payload(false).unwrap()[45..], compressed);
    }

    #[test]
    fn test_bad_public_key_rejected() {
        for public_key in [vec![], vec![0x02; 32], vec![0x04; 33], vec![0x05; 65]] {
            let key = ExtendedPublicKey {
                public_key,
                ..master_key()
            };
            assert!(matches!(key.serialize(false), Err(Error::InvalidArgument(_))));
        }
    }

    #[test]
    fn test_deserialize_rejects_other_payloads() {
        assert!(matches!(
            ExtendedPublicKey::deserialize("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa"),
            Err(Error::InvalidArgument(_))
        ));
    }
}
