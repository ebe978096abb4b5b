//! goparse - Go source front-end
//!
//! Parses Go files with tree-sitter and lowers them into a small typed syntax
//! model for class extraction.

pub mod ast;
mod error;
mod parser;
mod source;

pub use ast::{
    ChanDir, Decl, FieldDecl, FuncDecl, FuncType, Import, InterfaceElem, Param, Receiver,
    SourceFile, TypeExpr, TypeParam, TypeSpec,
};
pub use error::{ParseError, Result};
pub use parser::GoParser;
pub use source::{go_files, is_go_source};
