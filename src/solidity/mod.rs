//! Solidity source scanning: struct discovery and member sizing.

pub mod lexer;
pub mod parser;
pub mod types;

pub use self::parser::extract_records;
pub use self::types::{elementary_size, enum_byte_width, Field, FieldKind, Record};
