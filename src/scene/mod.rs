pub mod document;
pub mod parser;

pub use document::{PlaceholderObject, SceneDocument};
pub use parser::{DocumentParser, ParseError};
