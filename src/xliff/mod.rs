pub mod document;

pub use document::{XliffDocument, XliffError};
