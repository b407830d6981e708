//! Seam to the native query engine and image library.

use taql_subst::{ObjectRef, Scope, Value};

use crate::error::CommandResult;
use crate::prepare::{prepare_image_expression, prepare_query, PreparedCommand};

/// Result of running a query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// A selection, sort, or other command producing a table
    Table(ObjectRef),
    /// Values computed by a `calc` command
    Values(Vec<Value>),
}

impl QueryOutcome {
    pub fn table(&self) -> Option<&ObjectRef> {
        match self {
            QueryOutcome::Table(t) => Some(t),
            QueryOutcome::Values(_) => None,
        }
    }

    pub fn values(&self) -> Option<&[Value]> {
        match self {
            QueryOutcome::Values(v) => Some(v),
            QueryOutcome::Table(_) => None,
        }
    }
}

/// Executes prepared TaQL commands
pub trait QueryExecutor {
    fn execute(&self, command: &PreparedCommand) -> CommandResult<QueryOutcome>;
}

/// Opens images from prepared expressions
pub trait ImageOpener {
    fn open(&self, expression: &PreparedCommand) -> CommandResult<ObjectRef>;
}

/// Prepare and execute a query
pub fn run_query<E: QueryExecutor + ?Sized>(
    executor: &E,
    command: &str,
    tables: &[ObjectRef],
    style: Option<&str>,
    scope: &Scope,
) -> CommandResult<QueryOutcome> {
    let prepared = prepare_query(command, tables, style, scope)?;
    executor.execute(&prepared)
}

/// Prepare an image expression and open it
pub fn open_image_expression<O: ImageOpener + ?Sized>(
    opener: &O,
    expression: &str,
    images: &[ObjectRef],
    scope: &Scope,
) -> CommandResult<ObjectRef> {
    let prepared = prepare_image_expression(expression, images, scope)?;
    opener.open(&prepared)
}
