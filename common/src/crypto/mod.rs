mod ed25519;
mod hash;
mod key;

pub use ed25519::*;
pub use hash::*;
pub use key::{Key, KeyList};
