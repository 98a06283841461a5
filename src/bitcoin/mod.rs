//! Encoding of what the dongle hands back: extended public keys and signed messages.

pub mod device;
pub mod message;
pub mod path;
pub mod xpub;

pub use device::{DeviceDriver, HdSigner};
pub use message::{message_hash, parse_and_encode, write_varint, CompactSignature};
pub use path::Bip32Path;
pub use xpub::{compress_public_key, ExtendedPublicKey};
