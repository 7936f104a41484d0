//! Data model types.

mod inference;
mod pattern;
mod region;
mod section;

pub use inference::*;
pub use pattern::*;
pub use region::*;
pub use section::*;
