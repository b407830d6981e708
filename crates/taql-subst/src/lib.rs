//! taql-subst - Placeholder substitution for TaQL commands
//!
//! Rewrites a command template by replacing `$name` and `$(expression)`
//! placeholders with TaQL literals, so user code can write
//! `select from $t where COL > $value`.
//!
//! # Components
//!
//! - **Serializer**: values to TaQL literals (`T`/`F`, `[1,2,3]`, `"ab"'"'"cd"`)
//! - **Scope**: explicit name resolution (locals, enclosing frames, globals)
//! - **Object rules**: host objects become numbered placeholders (`$1`, `$t2`)
//! - **Scanner**: the quote- and parenthesis-aware driver
//!
//! # Examples
//!
//! ```
//! use taql_subst::{substitute, Scope};
//!
//! let scope = Scope::new().with("value", 5.1).with("names", vec!["a", "b"]);
//! let cmd = substitute("select from t where COL > $value && NAME in $names", &mut [], &scope);
//! assert_eq!(cmd, "select from t where COL > 5.1 && NAME in [\"a\",\"b\"]");
//! ```

pub mod config;
pub mod error;
pub mod expr;
pub mod registry;
pub mod scanner;
pub mod scope;
pub mod serialize;
pub mod value;

#[cfg(feature = "uniffi")]
pub mod ffi;

pub use config::*;
pub use error::*;
pub use expr::{
    evaluate_expression, parse_expression, Evaluator, Expr, MAX_NESTING, MAX_SEQUENCE_LEN,
};
pub use registry::*;
pub use scanner::*;
pub use scope::*;
pub use serialize::*;
pub use value::*;

// Setup UniFFI when the feature is enabled
#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();
