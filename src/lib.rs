pub mod codec;
pub mod mac;
pub mod token;

pub use codec::{CodecConfig, TokenCodec};
