//! taql-command: TaQL query and image-expression preparation.
//!
//! Builds the command text handed to the native query engine from a user
//! template, substituting tables and images in scope as `$n` references.
//!
//! # Examples
//!
//! ```
//! use taql_command::prepare_query;
//! use taql_subst::Scope;
//!
//! let scope = Scope::new().with("value", 5.1);
//! let cmd = prepare_query("select from my.ms where COL > $value", &[], None, &scope)?;
//! assert_eq!(cmd.text, "using style python select from my.ms where COL > 5.1");
//!
//! let cmd = prepare_query("select from my.ms", &[], Some("glish"), &scope)?;
//! assert_eq!(cmd.text, "using style glish select from my.ms");
//! # Ok::<(), taql_command::CommandError>(())
//! ```

pub mod error;
pub mod executor;
pub mod prepare;
pub mod style;

pub use error::*;
pub use executor::*;
pub use prepare::*;
pub use style::*;
