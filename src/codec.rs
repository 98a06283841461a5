use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

pub const BASE58_ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
pub const BASE58_CHECKSUM_LEN: usize = 4;

/// XOR pad applied cyclically over APDUs before they are smuggled in a key handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrambleKey {
    key: Vec<u8>,
}

impl ScrambleKey {
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.is_empty() {
            return Err(Error::InvalidArgument("Scramble key must not be empty".to_string()));
        }

        Ok(ScrambleKey { key: key.to_vec() })
    }

    pub fn from_ascii(key: &str) -> Result<Self> {
        if !key.is_ascii() {
            return Err(Error::InvalidArgument("Scramble key must be ascii".to_string()));
        }

        Self::new(key.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    pub fn scramble(&self, buffer: &[u8]) -> Vec<u8> {
        buffer.iter().zip(self.key.iter().cycle()).map(|(b, k)| b ^ k).collect()
    }
}

/// `out[i] = buffer[i] ^ key[i % key.len()]`, this is its own inverse.
pub fn scramble(buffer: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    Ok(ScrambleKey::new(key)?.scramble(buffer))
}

pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&Sha256::digest(first));
    hash
}

pub fn base58_encode(data: &[u8]) -> String {
    // Base 58 digits, least significant first
    let mut digits: Vec<u8> = Vec::with_capacity(data.len() * 138 / 100 + 1);

    for &byte in data {
        let mut carry = byte as u32;
        for digit in digits.iter_mut() {
            carry += (*digit as u32) << 8;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }

    // The big integer conversion drops leading zero bytes, each one becomes a leading '1'
    let zeros = data.iter().take_while(|b| **b == 0).count();

    let mut encoded = String::with_capacity(zeros + digits.len());
    encoded.extend(std::iter::repeat(BASE58_ALPHABET[0] as char).take(zeros));
    encoded.extend(digits.iter().rev().map(|d| BASE58_ALPHABET[*d as usize] as char));
    encoded
}

pub fn base58_decode(encoded: &str) -> Result<Vec<u8>> {
    // Base 256 bytes, least significant first
    let mut bytes: Vec<u8> = Vec::with_capacity(encoded.len() * 733 / 1000 + 1);

    for c in encoded.chars() {
        let mut carry = BASE58_ALPHABET
            .iter()
            .position(|a| *a as char == c)
            .ok_or_else(|| Error::InvalidArgument(format!("Invalid base58 character {:?}", c)))? as u32;

        for byte in bytes.iter_mut() {
            carry += (*byte as u32) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    let zeros = encoded.chars().take_while(|c| *c == BASE58_ALPHABET[0] as char).count();

    let mut decoded = vec![0u8; zeros];
    decoded.extend(bytes.iter().rev());
    Ok(decoded)
}

/// Base58 of `payload || first4(sha256d(payload))`
pub fn base58check_encode(payload: &[u8]) -> String {
    let checksum = double_sha256(payload);

    let mut data = Vec::with_capacity(payload.len() + BASE58_CHECKSUM_LEN);
    data.extend_from_slice(payload);
    data.extend_from_slice(&checksum[..BASE58_CHECKSUM_LEN]);

    base58_encode(&data)
}

pub fn base58check_decode(encoded: &str) -> Result<Vec<u8>> {
    let mut data = base58_decode(encoded)?;

    if data.len() < BASE58_CHECKSUM_LEN {
        return Err(Error::InvalidArgument("Base58check data is too short".to_string()));
    }

    let checksum = data.split_off(data.len() - BASE58_CHECKSUM_LEN);

    if double_sha256(&data)[..BASE58_CHECKSUM_LEN] != checksum[..] {
        return Err(Error::InvalidArgument("Base58check checksum mismatch".to_string()));
    }

    Ok(data)
}
