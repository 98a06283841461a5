pub const U2F_V2_VERSION_STR: &str = "U2F_V2";

// General constants

pub const U2F_MAX_KH_SIZE: usize = 255; // Key handle length is sent as a single byte
pub const U2F_CHAL_SIZE: usize = 32; // Size of challenge
pub const U2F_USER_PRESENCE_SIZE: usize = 1; // Size of the user presence flag
pub const U2F_CTR_SIZE: usize = 4; // Size of counter field
pub const U2F_SW_SIZE: usize = 2; // Size of the trailing status word

// Offset of the tunneled payload inside the signature data
pub const U2F_SIGNATURE_PAYLOAD_OFFSET: usize = U2F_USER_PRESENCE_SIZE + U2F_CTR_SIZE;
pub const U2F_SIGNATURE_DATA_MIN_SIZE: usize = U2F_SIGNATURE_PAYLOAD_OFFSET + U2F_SW_SIZE;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 20;

// Command status responses

pub const U2F_SW_NO_ERROR: u16 = 0x9000; // SW_NO_ERROR
pub const U2F_SW_CONDITIONS_NOT_SATISFIED: u16 = 0x6985; // SW_CONDITIONS_NOT_SATISFIED
