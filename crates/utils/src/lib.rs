pub mod date_key;
pub mod response;
