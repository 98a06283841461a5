//#![deny(warnings)]

//! # Apdu Tunnel
//!
//! Talk to a hardware dongle through the U2F sign exchange, and encode the keys and signatures it returns.

pub mod base64;
pub mod codec;
pub mod error;

#[cfg(feature = "u2f")]
pub mod u2f;

#[cfg(feature = "bitcoin")]
pub mod bitcoin;

pub use crate::error::{Error, Result};
