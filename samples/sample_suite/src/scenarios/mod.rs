pub mod codec;
pub mod requests;
