pub mod error;
mod types;

pub use error::{Error, Result};
pub use types::{RSAPrivateKey, Version};
