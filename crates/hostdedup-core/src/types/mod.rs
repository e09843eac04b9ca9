mod document;
mod host;
mod source;

pub use document::*;
pub use host::*;
pub use source::*;
