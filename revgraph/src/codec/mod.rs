pub mod json_codec;
mod value;

pub use json_codec::JsonCodec;
pub use value::Value;
