//! APDU tunneling through the U2F sign exchange.
//!
//! The command is scrambled with a shared key and sent as the key handle of a sign request, the dongle answers
//! inside the `signatureData` of the sign response.

pub mod proto;
pub mod tunnel;

pub use tunnel::{unwrap_response, wrap_apdu, ApduTunnel, ApduTunnelBuilder, SignedResponse, U2fTransport};
