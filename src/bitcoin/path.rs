use std::fmt::{Display, Formatter};
use std::str::FromStr;

use byteorder::{BigEndian, WriteBytesExt};

use crate::error::{Error, Result};

pub const MAX_BIP32_PATH: usize = 10;
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// BIP32 derivation path, at most `MAX_BIP32_PATH` levels deep like the dongle accepts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bip32Path {
    path: Vec<u32>,
}

impl Bip32Path {
    pub fn new(path: Vec<u32>) -> Result<Self> {
        if path.len() > MAX_BIP32_PATH {
            return Err(Error::InvalidArgument(format!(
                "Bip32 path has {} levels, at most {} are supported",
                path.len(),
                MAX_BIP32_PATH
            )));
        }

        Ok(Bip32Path { path })
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Wire form sent to the dongle: level count followed by each index as a big endian u32.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(1 + 4 * self.path.len());

        data.write_u8(self.path.len() as u8)?;
        for index in &self.path {
            data.write_u32::<BigEndian>(*index)?;
        }

        Ok(data)
    }
}

impl FromStr for Bip32Path {
    type Err = Error;

    /// Accepts `m/0'/2/0`, `0'/2/0` or `0h/2/0`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let s = s.strip_prefix("m/").unwrap_or(if s == "m" { "" } else { s });

        if s.is_empty() {
            return Ok(Bip32Path::default());
        }

        let path = s
            .split('/')
            .map(|level| -> Result<u32> {
                let (index, hardened) = match level.strip_suffix(['\'', 'h', 'H']) {
                    Some(index) => (index, true),
                    None => (level, false),
                };

                let index = index
                    .parse::<u32>()
                    .ok()
                    .filter(|i| *i < HARDENED_OFFSET)
                    .ok_or_else(|| Error::InvalidArgument(format!("Invalid bip32 path level {:?}", level)))?;

                Ok(if hardened { index | HARDENED_OFFSET } else { index })
            })
            .collect::<Result<Vec<u32>>>()?;

        Bip32Path::new(path)
    }
}

impl Display for Bip32Path {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "m")?;
        for index in &self.path {
            if index & HARDENED_OFFSET != 0 {
                write!(f, "/{}'", index & !HARDENED_OFFSET)?;
            } else {
                write!(f, "/{}", index)?;
            }
        }
        Ok(())
    }
}

#[test]
fn test_parse_path() {
    let path: Bip32Path = "0'/2/0".parse().unwrap();
    assert_eq!(path.as_slice(), &[0x8000_0000, 2, 0]);
    assert_eq!(path.to_string(), "m/0'/2/0");

    let same: Bip32Path = "m/0h/2/0".parse().unwrap();
    assert_eq!(same, path);

    let master: Bip32Path = "m".parse().unwrap();
    assert_eq!(master.depth(), 0);
}

#[test]
fn test_serialize_path() {
    let path: Bip32Path = "44'/0'/0'/0/1".parse().unwrap();
    assert_eq!(
        hex::encode(path.serialize().unwrap()),
        "058000002c80000000800000000000000000000001"
    );
}

#[test]
fn test_invalid_paths() {
    for bad in ["0/x", "0//1", "2147483648", "-1", "0/1/2/3/4/5/6/7/8/9/10"] {
        assert!(matches!(bad.parse::<Bip32Path>(), Err(Error::InvalidArgument(_))), "{}", bad);
    }
}
