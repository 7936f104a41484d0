//! # webinfer Extractor
//!
//! Turns a DOM snapshot into an ordered list of [`Section`]s with stable
//! identities and structural signatures.
//!
//! Snapshots come either from a browser driver (JSON, with geometry and
//! computed visibility) or from raw markup via [`DomSnapshot::from_html`].
//!
//! [`Section`]: webinfer_protocols::Section

mod dom;
mod extractor;
mod html;
pub mod identity;
mod rules;

pub use dom::{DomNode, DomSnapshot, Viewport};
pub use extractor::{Extraction, SectionExtractor};
