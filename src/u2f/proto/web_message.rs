use serde_derive::*;
use serde_repr::*;

use crate::error::Error;
use crate::u2f::proto::constants::U2F_V2_VERSION_STR;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
/// FIDO U2F Transports
pub enum Transport {
    /// Bluetooth Classic
    #[serde(rename = "bt")]
    Bluetooth,
    /// Bluetooth Low-Energy
    #[serde(rename = "ble")]
    BluetoothLE,
    /// Near field communication
    #[serde(rename = "nfc")]
    Nfc,
    /// Usb removable device
    #[serde(rename = "usb")]
    Usb,
    /// Usb non-removable device
    #[serde(rename = "usb-internal")]
    UsbInternal,
}

/// Key handle record handed to the authenticator. The key handle carries a scrambled APDU instead of a real
/// registration handle.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredKey {
    /// The version of the protocol that the token must speak, always "U2F_V2".
    pub version: String,
    /// Websafe-base64 encoding of the key handle bytes.
    pub key_handle: String,
    /// The transport(s) this token supports, if known by the RP.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub transports: Option<Vec<Transport>>,
    /// The application id to assert for this key handle, if it's distinct from the application id for the overall request.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub app_id: Option<String>,
}

impl RegisteredKey {
    pub fn new(key_handle: String) -> Self {
        RegisteredKey {
            version: U2F_V2_VERSION_STR.to_string(),
            key_handle,
            transports: None,
            app_id: None,
        }
    }
}

/// Everything the external `u2f.sign` call needs.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct U2fSignRequest {
    /// Origin of the caller, used as the application id.
    pub app_id: String,
    /// The websafe-base64-encoded challenge.
    pub challenge: String,
    /// The key handles to present to the token.
    pub registered_keys: Vec<RegisteredKey>,
    /// A timeout for the FIDO Client's processing, in seconds.
    pub timeout_seconds: u64,
}

#[derive(Serialize_repr, Deserialize_repr, PartialEq, Debug, Clone, Copy)]
#[repr(u8)]
pub enum ErrorCode {
    Ok = 0,
    OtherError = 1,
    BadRequest = 2,
    ConfigurationUnsupported = 3,
    DeviceIneligible = 4,
    Timeout = 5,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientError {
    pub error_code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ClientError {
    pub fn timeout() -> Self {
        ClientError {
            error_code: ErrorCode::Timeout,
            error_message: None,
        }
    }

    pub fn device_ineligible(message: Option<String>) -> Self {
        ClientError {
            error_code: ErrorCode::DeviceIneligible,
            error_message: message,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct U2fSignResponse {
    #[serde(default)]
    pub key_handle: String,
    pub signature_data: String,
    #[serde(default)]
    pub client_data: String,
}

/// What the transport hands back. Only `Sign` carries `signatureData`, anything else is a rejection.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum Response {
    Sign(U2fSignResponse),
    Error(ClientError),
    Other(serde_json::Value),
}

impl Response {
    /// Parse the raw JSON object the browser passed to the sign callback.
    pub fn from_json(raw: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn signature_data(&self) -> Option<&str> {
        match self {
            Response::Sign(sign) => Some(sign.signature_data.as_str()),
            Response::Error(_) | Response::Other(_) => None,
        }
    }
}

#[test]
fn test_registered_key_json() {
    let key = RegisteredKey::new("Ko4uKio".to_string());
    let json = serde_json::to_string(&key).unwrap();
    assert_eq!(json, r#"{"version":"U2F_V2","keyHandle":"Ko4uKio"}"#);
}

#[test]
fn test_response_shapes() {
    let sign = Response::from_json(r#"{"keyHandle":"abc","signatureData":"AQAAAAGQAA","clientData":"e30"}"#).unwrap();
    assert_eq!(sign.signature_data(), Some("AQAAAAGQAA"));

    let only_signature = Response::from_json(r#"{"signatureData":"AQAAAAGQAA"}"#).unwrap();
    assert!(matches!(only_signature, Response::Sign(_)));

    let error = Response::from_json(r#"{"errorCode":5}"#).unwrap();
    assert_eq!(error, Response::Error(ClientError::timeout()));
    assert_eq!(error.signature_data(), None);

    let other = Response::from_json(r#"{"foo":"bar"}"#).unwrap();
    assert!(matches!(other, Response::Other(_)));
}

#[test]
fn test_sign_request_json() {
    let request = U2fSignRequest {
        app_id: "https://example.com".to_string(),
        challenge: "AAAA".to_string(),
        registered_keys: vec![RegisteredKey::new("Ko4uKio".to_string())],
        timeout_seconds: 20,
    };

    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(value["appId"], "https://example.com");
    assert_eq!(value["registeredKeys"][0]["keyHandle"], "Ko4uKio");
    assert_eq!(value["timeoutSeconds"], 20);
}

#[test]
fn test_registration_response_is_not_a_signature() {
    let registration = Response::from_json(r#"{"version":"U2F_V2","registrationData":"BQQ","clientData":"e30"}"#).unwrap();
    assert!(matches!(registration, Response::Other(_)));
    assert_eq!(registration.signature_data(), None);
}
