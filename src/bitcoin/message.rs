use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::base64::{Engine as _, BASE64};
use crate::codec::double_sha256;
use crate::error::{Error, Result};

pub const MESSAGE_MAGIC: &[u8] = b"\x18Bitcoin Signed Message:\n";

pub const SIGNATURE_COMPONENT_SIZE: usize = 32;
pub const COMPACT_SIGNATURE_SIZE: usize = 1 + 2 * SIGNATURE_COMPONENT_SIZE;

// Header byte of a compact signature: 27 + recovery id, + 4 when the key is compressed
pub const COMPACT_HEADER_BASE: u8 = 27;
pub const COMPACT_HEADER_COMPRESSED: u8 = 4;

/// Bitcoin compact size encoding.
pub fn write_varint<W: Write>(writer: &mut W, value: u64) -> Result<()> {
    match value {
        0..=0xfc => writer.write_u8(value as u8)?,
        0xfd..=0xffff => {
            writer.write_u8(0xfd)?;
            writer.write_u16::<LittleEndian>(value as u16)?;
        }
        0x1_0000..=0xffff_ffff => {
            writer.write_u8(0xfe)?;
            writer.write_u32::<LittleEndian>(value as u32)?;
        }
        _ => {
            writer.write_u8(0xff)?;
            writer.write_u64::<LittleEndian>(value)?;
        }
    }

    Ok(())
}

/// Hash handed to the dongle when signing `message`.
pub fn message_hash(message: &[u8]) -> Result<[u8; 32]> {
    let mut data = Vec::with_capacity(MESSAGE_MAGIC.len() + 9 + message.len());

    data.write_all(MESSAGE_MAGIC)?;
    write_varint(&mut data, message.len() as u64)?;
    data.write_all(message)?;

    Ok(double_sha256(&data))
}

/// Recoverable signature in the 65 byte layout understood by Bitcoin Core `verifymessage`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompactSignature {
    pub header: u8,
    pub r: [u8; SIGNATURE_COMPONENT_SIZE],
    pub s: [u8; SIGNATURE_COMPONENT_SIZE],
}

fn read_component(name: &str, len: usize, bytes: &[u8]) -> Result<[u8; SIGNATURE_COMPONENT_SIZE]> {
    let bytes = match len {
        32 => bytes,
        // Leading sign byte
        33 => &bytes[1..],
        _ => {
            return Err(Error::MalformedSignature(format!("{} is {} bytes long, expected 32 or 33", name, len)));
        }
    };

    let mut component = [0u8; SIGNATURE_COMPONENT_SIZE];
    component.copy_from_slice(bytes);
    Ok(component)
}

impl CompactSignature {
    /// Parse the signature returned by the dongle.
    ///
    /// The layout is a DER sequence whose first byte also carries the parity of the nonce point:
    /// `30|31, len, 02, r_len, r, 02, s_len, s`.
    pub fn from_device_signature(signature: &[u8]) -> Result<Self> {
        if signature.len() < 4 {
            return Err(Error::MalformedSignature(format!("Signature is only {} bytes long", signature.len())));
        }

        let r_len = signature[3] as usize;
        let r_end = 4 + r_len;

        // r, then the s tag and length bytes
        if signature.len() < r_end + 2 {
            return Err(Error::MalformedSignature("Signature is truncated before s".to_string()));
        }

        let s_len = signature[r_end + 1] as usize;
        let s_bytes = &signature[r_end + 2..];

        if s_bytes.len() != s_len {
            return Err(Error::MalformedSignature(format!(
                "s is announced as {} bytes, got {}",
                s_len,
                s_bytes.len()
            )));
        }

        let r = read_component("r", r_len, &signature[4..r_end])?;
        let s = read_component("s", s_len, s_bytes)?;

        Ok(CompactSignature {
            header: COMPACT_HEADER_BASE + COMPACT_HEADER_COMPRESSED + (signature[0] & 0x01),
            r,
            s,
        })
    }

    pub fn to_bytes(&self) -> [u8; COMPACT_SIGNATURE_SIZE] {
        let mut bytes = [0u8; COMPACT_SIGNATURE_SIZE];
        bytes[0] = self.header;
        bytes[1..1 + SIGNATURE_COMPONENT_SIZE].copy_from_slice(&self.r);
        bytes[1 + SIGNATURE_COMPONENT_SIZE..].copy_from_slice(&self.s);
        bytes
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.to_bytes())
    }
}

/// Device signature to the base64 string expected by `verifymessage`.
pub fn parse_and_encode(device_signature: &[u8]) -> Result<String> {
    Ok(CompactSignature::from_device_signature(device_signature)?.to_base64())
}
