//! Commonly used utilities like typed handles and hash helpers.

#[macro_use]
pub mod handle;
pub mod hash;
pub mod hash_value;

pub use self::handle::{Handle, HandleIndex, HandleLike};
pub use self::hash::{hash64, FastHashMap, FastHashSet};
pub use self::hash_value::HashValue;
