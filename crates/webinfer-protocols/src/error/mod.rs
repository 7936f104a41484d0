//! Error types for the web inference protocol layer.

mod classification;
mod store;

pub use classification::*;
pub use store::*;
