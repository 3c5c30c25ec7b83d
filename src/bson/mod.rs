//! BSON: this project's bespoke text configuration language (unrelated to
//! Binary JSON). A hand-written tokenizer, recursive-descent parser, tree
//! writer, and typed tree accessors (spec §4.1-§4.3).

pub mod parser;
pub mod token;
pub mod tree;
pub mod writer;

pub use parser::{parse, parse_str, ParseError};
pub use token::{tokenize, Token, TokenKind, TokenizeError};
pub use tree::{AccessError, Mat4, Object, ObjectKind, Property, Tree, Value, Vec2, Vec3, Vec4};
pub use writer::write;
