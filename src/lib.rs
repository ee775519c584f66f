//! Filter a vault of markdown notes by their frontmatter.

pub mod cli;
pub mod frontmatter;
pub mod query;
pub mod types;
pub mod value;
pub mod values;
pub mod vault;

pub use frontmatter::Note;
pub use query::{parse, Evaluator, Expr, SyntaxError};
pub use value::{DynamicValue, FieldAccessor};
