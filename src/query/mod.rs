//! Query expressions over frontmatter fields.
//!
//! ```
//! use mdq::query;
//! use mdq::value::DynamicValue;
//! use std::collections::HashMap;
//!
//! let expr = query::parse(r#"status = "draft" AND priority > 3"#).unwrap();
//! let fields = HashMap::from([
//!     ("status".to_string(), DynamicValue::from("draft")),
//!     ("priority".to_string(), DynamicValue::Integer(5)),
//! ]);
//! assert!(expr.evaluate(&fields));
//! ```

pub mod ast;
pub mod coerce;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod range;

pub use ast::{CompareOp, Expr, Literal, LogicalOp, Operand};
pub use eval::Evaluator;
pub use functions::{evaluate_function, FunctionError, FunctionValue};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::{parse, parse_tokens, SyntaxError};
pub use range::DateRange;
