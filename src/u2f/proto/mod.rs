pub mod constants;
pub mod web_message;
