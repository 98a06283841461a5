use std::fmt::Display;

use tracing::debug;

use crate::bitcoin::message::{message_hash, CompactSignature};
use crate::bitcoin::path::Bip32Path;
use crate::bitcoin::xpub::ExtendedPublicKey;
use crate::error::{Error, Result};

/// Blocking calls into the dongle. Keys never leave the device, `PrivateKey` is whatever opaque handle the
/// device hands back (usually an encrypted blob).
pub trait DeviceDriver {
    type PrivateKey;
    type Error: Display;

    fn import_private_key(&self, seed: &[u8], is_testnet: bool) -> std::result::Result<Self::PrivateKey, Self::Error>;
    fn derive_bip32_key(&self, key: &Self::PrivateKey, path: &Bip32Path) -> std::result::Result<Self::PrivateKey, Self::Error>;
    fn get_public_key(&self, key: &Self::PrivateKey) -> std::result::Result<ExtendedPublicKey, Self::Error>;
    fn sign_immediate(&self, key: &Self::PrivateKey, hash: &[u8; 32]) -> std::result::Result<Vec<u8>, Self::Error>;
}

fn driver_error<E: Display>(operation: &str) -> impl FnOnce(E) -> Error + '_ {
    move |e| Error::Transport(format!("Device failed to {}: {}", operation, e))
}

/// Key provisioning and message signing on top of a `DeviceDriver`.
pub struct HdSigner<D> {
    driver: D,
}

impl<D: DeviceDriver> HdSigner<D> {
    pub fn new(driver: D) -> Self {
        HdSigner { driver }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Import `seed`, derive `path` and return the derived key with its serialized extended public key.
    pub fn provision(&self, seed: &[u8], path: &str, is_testnet: bool) -> Result<(D::PrivateKey, String)> {
        let path: Bip32Path = path.parse()?;

        let master = self
            .driver
            .import_private_key(seed, is_testnet)
            .map_err(driver_error("import private key"))?;

        let private_key = self
            .driver
            .derive_bip32_key(&master, &path)
            .map_err(driver_error("derive key"))?;

        let xpub = self.xpub(&private_key, is_testnet)?;

        debug!(%path, "Provisioned extended key");

        Ok((private_key, xpub))
    }

    pub fn xpub(&self, private_key: &D::PrivateKey, is_testnet: bool) -> Result<String> {
        self.driver
            .get_public_key(private_key)
            .map_err(driver_error("read public key"))?
            .serialize(is_testnet)
    }

    /// Signed message in the base64 form accepted by `verifymessage`.
    pub fn sign_message(&self, private_key: &D::PrivateKey, message: &[u8]) -> Result<String> {
        let hash = message_hash(message)?;

        let signature = self
            .driver
            .sign_immediate(private_key, &hash)
            .map_err(driver_error("sign"))?;

        Ok(CompactSignature::from_device_signature(&signature)?.to_base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base64::{Engine as _, BASE64};
    use std::cell::RefCell;

    struct MockDriver {
        signed_hashes: RefCell<Vec<[u8; 32]>>,
        signature: Vec<u8>,
    }

    impl MockDriver {
        fn new(signature: Vec<u8>) -> Self {
            MockDriver {
                signed_hashes: RefCell::new(Vec::new()),
                signature,
            }
        }
    }

    impl DeviceDriver for MockDriver {
        type PrivateKey = Vec<u32>;
        type Error = String;

        fn import_private_key(&self, seed: &[u8], _is_testnet: bool) -> std::result::Result<Vec<u32>, String> {
            if seed.is_empty() {
                return Err("empty seed".to_string());
            }
            Ok(Vec::new())
        }

        fn derive_bip32_key(&self, key: &Vec<u32>, path: &Bip32Path) -> std::result::Result<Vec<u32>, String> {
            let mut derived = key.clone();
            derived.extend_from_slice(path.as_slice());
            Ok(derived)
        }

        fn get_public_key(&self, key: &Vec<u32>) -> std::result::Result<ExtendedPublicKey, String> {
            let mut public_key = vec![0x02];
            public_key.extend_from_slice(&[0x42; 32]);

            Ok(ExtendedPublicKey {
                depth: key.len() as u8,
                parent_fingerprint: [1, 2, 3, 4],
                child_number: key.last().copied().unwrap_or(0),
                chain_code: [0x07; 32],
                public_key,
            })
        }

        fn sign_immediate(&self, _key: &Vec<u32>, hash: &[u8; 32]) -> std::result::Result<Vec<u8>, String> {
            self.signed_hashes.borrow_mut().push(*hash);
            Ok(self.signature.clone())
        }
    }

    fn device_signature() -> Vec<u8> {
        let mut sig = vec![0x31, 0x44, 0x02, 0x20];
        sig.extend_from_slice(&[0x11; 32]);
        sig.extend_from_slice(&[0x02, 0x20]);
        sig.extend_from_slice(&[0x22; 32]);
        sig
    }

    #[test]
    fn test_provision() {
        let signer = HdSigner::new(MockDriver::new(device_signature()));

        let (key, xpub) = signer.provision(&[0xfe; 32], "0'/2/0", true).unwrap();
        assert_eq!(key, vec![0x8000_0000, 2, 0]);
        assert!(xpub.starts_with("tpub"));

        let (fields, is_testnet) = ExtendedPublicKey::deserialize(&xpub).unwrap();
        assert!(is_testnet);
        assert_eq!(fields.depth, 3);
        assert_eq!(fields.child_number, 0);
    }

    #[test]
    fn test_provision_errors() {
        let signer = HdSigner::new(MockDriver::new(device_signature()));

        assert!(matches!(signer.provision(&[], "0'/2/0", false), Err(Error::Transport(_))));
        assert!(matches!(signer.provision(&[1], "0'/x", false), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_sign_message() {
        let signer = HdSigner::new(MockDriver::new(device_signature()));

        let signature = signer.sign_message(&vec![0], b"Coinkite").unwrap();
        let decoded = BASE64.decode(signature).unwrap();

        assert_eq!(decoded.len(), 65);
        assert_eq!(decoded[0], 32);
        assert_eq!(&decoded[1..33], &[0x11; 32]);
        assert_eq!(&decoded[33..], &[0x22; 32]);

        assert_eq!(signer.driver().signed_hashes.borrow()[0], message_hash(b"Coinkite").unwrap());
    }

    #[test]
    fn test_sign_message_malformed() {
        let signer = HdSigner::new(MockDriver::new(vec![0x30, 0x00]));
        assert!(matches!(signer.sign_message(&vec![0], b"Coinkite"), Err(Error::MalformedSignature(_))));
    }
}
