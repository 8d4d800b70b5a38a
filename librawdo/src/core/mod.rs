pub mod g711;
pub mod types;

pub use g711::{alaw_decode, alaw_encode, ulaw_decode, ulaw_encode};
pub use types::*;
