//! The expression language of `$( … )` fragments

pub mod ast;
pub mod eval;
pub mod parser;

pub use ast::*;
pub use eval::*;
pub use parser::*;
