pub mod document;
pub mod parser;
pub mod section;
pub mod serializer;

pub use document::{Block, InlineRun, ListItem, Marks};
pub use parser::parse;
pub use section::extract;
pub use serializer::serialize;
