use std::future::Future;
use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};
use tracing::{debug, trace, warn};

use crate::base64::{to_standard_base64, to_web_safe_base64, Engine as _, BASE64};
use crate::codec::ScrambleKey;
use crate::error::{Error, Result};
use crate::u2f::proto::{
    constants::*,
    web_message::{RegisteredKey, Response, U2fSignRequest},
};

/// The authenticator side of the exchange, `u2f.sign` in a browser.
///
/// `sign` is called exactly once per exchange and its future must resolve exactly once, either with a sign
/// response or with an error shaped response. The transport owns the timeout.
pub trait U2fTransport {
    fn sign(&self, request: U2fSignRequest) -> impl Future<Output = Response>;
}

impl<F, Fut> U2fTransport for F
where
    F: Fn(U2fSignRequest) -> Fut,
    Fut: Future<Output = Response>,
{
    fn sign(&self, request: U2fSignRequest) -> impl Future<Output = Response> {
        self(request)
    }
}

/// Scramble `apdu` and encode it as a U2F key handle.
pub fn wrap_apdu(apdu: &[u8], key: &ScrambleKey) -> Result<RegisteredKey> {
    if apdu.len() > U2F_MAX_KH_SIZE {
        return Err(Error::InvalidArgument(format!(
            "Apdu of {} bytes does not fit in a key handle",
            apdu.len()
        )));
    }

    let key_handle = key.scramble(apdu);

    Ok(RegisteredKey::new(to_web_safe_base64(&BASE64.encode(key_handle))))
}

/// Web safe encoding of the all zero challenge sent along every tunneled APDU.
pub fn zero_challenge() -> String {
    to_web_safe_base64(&BASE64.encode([0u8; U2F_CHAL_SIZE]))
}

/// Decoded `signatureData` of a tunneled exchange.
#[derive(Clone, Debug, PartialEq)]
pub struct SignedResponse {
    pub user_presence: u8,
    pub counter: u32,
    pub payload: Vec<u8>,
    pub status: u16,
}

impl SignedResponse {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < U2F_SIGNATURE_DATA_MIN_SIZE {
            return Err(Error::InvalidArgument(format!(
                "Signature data is {} bytes long, expected at least {}",
                data.len(),
                U2F_SIGNATURE_DATA_MIN_SIZE
            )));
        }

        let payload_len = data.len() - U2F_SIGNATURE_DATA_MIN_SIZE;
        let mut cursor = Cursor::new(data);

        let user_presence = cursor.read_u8()?;
        let counter = cursor.read_u32::<BigEndian>()?;

        let mut payload = vec![0u8; payload_len];
        cursor.read_exact(&mut payload[..])?;

        let status = cursor.read_u16::<BigEndian>()?;

        Ok(SignedResponse {
            user_presence,
            counter,
            payload,
            status,
        })
    }

    /// Parse the websafe-base64 `signatureData` field.
    pub fn from_signature_data(signature_data: &str) -> Result<Self> {
        let data = BASE64.decode(to_standard_base64(signature_data))?;
        Self::from_bytes(&data)
    }
}

/// Validate the transport response and extract the hex payload sitting between the counter and the status word.
pub fn unwrap_response(response: &Response, accepted_status: Option<&[u16]>) -> Result<String> {
    let signature_data = response.signature_data().ok_or_else(|| {
        Error::Transport(serde_json::to_string(response).unwrap_or_else(|e| format!("Unprintable transport response: {}", e)))
    })?;

    let signed = SignedResponse::from_signature_data(signature_data)?;

    trace!(status = signed.status, counter = signed.counter, "Unwrapped signature data");

    if let Some(accepted) = accepted_status {
        if !accepted.contains(&signed.status) {
            return Err(Error::UnexpectedStatus(signed.status));
        }
    }

    Ok(hex::encode(signed.payload))
}

pub struct ApduTunnelBuilder {
    scramble_key: Option<String>,
    timeout_seconds: u64,
    origin: Option<String>,
    accepted_status: Option<Vec<u16>>,
}

impl ApduTunnelBuilder {
    pub fn new() -> Self {
        ApduTunnelBuilder {
            scramble_key: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            origin: None,
            accepted_status: None,
        }
    }

    pub fn scramble_key(mut self, key: &str) -> Self {
        self.scramble_key = Some(key.to_string());
        self
    }

    pub fn timeout_sec(mut self, timeout: u64) -> Self {
        self.timeout_seconds = timeout;
        self
    }

    pub fn origin(mut self, origin: &str) -> Self {
        self.origin = Some(origin.to_string());
        self
    }

    /// Status words accepted when the caller of `exchange` does not pass its own list.
    pub fn accepted_status(mut self, status: Vec<u16>) -> Self {
        self.accepted_status = Some(status);
        self
    }

    pub fn build<T: U2fTransport>(self, transport: T) -> Result<ApduTunnel<T>> {
        let ApduTunnelBuilder {
            scramble_key,
            timeout_seconds,
            origin,
            accepted_status,
        } = self;

        let scramble_key = scramble_key
            .as_deref()
            .ok_or_else(|| Error::InvalidArgument("Unable to build a tunnel without a scramble key".to_string()))
            .and_then(ScrambleKey::from_ascii)?;

        let origin = origin.ok_or_else(|| Error::InvalidArgument("Unable to build a tunnel without an origin".to_string()))?;

        Ok(ApduTunnel {
            scramble_key,
            timeout_seconds,
            origin,
            accepted_status,
            transport,
        })
    }
}

impl Default for ApduTunnelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Sends APDUs to a dongle through the key handle of a U2F sign request.
pub struct ApduTunnel<T> {
    scramble_key: ScrambleKey,
    timeout_seconds: u64,
    origin: String,
    accepted_status: Option<Vec<u16>>,
    transport: T,
}

impl<T: U2fTransport> ApduTunnel<T> {
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn wrap(&self, apdu_hex: &str) -> Result<RegisteredKey> {
        let apdu = hex::decode(apdu_hex).map_err(|e| Error::InvalidArgument(format!("APDU is not valid hex: {}", e)))?;
        wrap_apdu(&apdu, &self.scramble_key)
    }

    pub fn sign_request(&self, apdu_hex: &str) -> Result<U2fSignRequest> {
        let key = self.wrap(apdu_hex)?;

        Ok(U2fSignRequest {
            app_id: self.origin.clone(),
            challenge: zero_challenge(),
            registered_keys: vec![key],
            timeout_seconds: self.timeout_seconds,
        })
    }

    pub fn unwrap(&self, response: &Response, accepted_status: Option<&[u16]>) -> Result<String> {
        unwrap_response(response, accepted_status.or(self.accepted_status.as_deref()))
    }

    /// Send `apdu_hex` to the dongle and resolve with the hex encoded answer, status word excluded.
    ///
    /// Nothing is retried. If the transport never completes, neither does this future.
    pub async fn exchange(&self, apdu_hex: &str, accepted_status: Option<&[u16]>) -> Result<String> {
        let request = self.sign_request(apdu_hex)?;

        debug!(origin = %self.origin, timeout = self.timeout_seconds, "Sending tunneled apdu");

        let response = self.transport.sign(request).await;

        self.unwrap(&response, accepted_status).map_err(|e| {
            warn!("Tunneled apdu failed: {}", e);
            e
        })
    }
}
