//! Turning user templates into command text for the native executor.
//!
//! Tables (or images) named in the template are substituted as `$1`, `$2`,
//! ... and appended after any the caller passed explicitly, so hand-written
//! `$n` references keep pointing at the caller's own list.

use taql_subst::{substitute, ObjectRef, ObjectRule, Scope};
use tracing::debug;

use crate::error::CommandResult;
use crate::style::QueryStyle;

/// Object kind of table handles
pub const TABLE_KIND: &str = "table";

/// Object kind of image handles
pub const IMAGE_KIND: &str = "image";

/// Command text plus the objects its `$n` placeholders refer to
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCommand {
    /// Final command text
    pub text: String,
    /// Objects bound to `$1`, `$2`, ... in order
    pub objects: Vec<ObjectRef>,
}

impl PreparedCommand {
    /// Object bound to a 1-based placeholder number
    pub fn object(&self, placeholder: usize) -> Option<&ObjectRef> {
        placeholder.checked_sub(1).and_then(|i| self.objects.get(i))
    }
}

/// Substitute with one unprefixed rule for `kind`, seeded with `objects`
fn prepare(
    template: &str,
    kind: &str,
    objects: &[ObjectRef],
    scope: &Scope,
) -> CommandResult<PreparedCommand> {
    let mut rules = [ObjectRule::with_objects(kind, "", objects.to_vec())?];
    let text = substitute(template, &mut rules, scope);
    let [rule] = rules;

    Ok(PreparedCommand {
        text,
        objects: rule.into_objects(),
    })
}

/// Prepare a TaQL query.
///
/// `tables` are the tables the caller already refers to as `$1`, `$2`, ...;
/// tables found in the scope are numbered after them. The style becomes a
/// leading `using style` clause; `None` means `python`, and a blank style
/// leaves the clause out.
pub fn prepare_query(
    command: &str,
    tables: &[ObjectRef],
    style: Option<&str>,
    scope: &Scope,
) -> CommandResult<PreparedCommand> {
    let style = match style {
        None => Some(QueryStyle::python()),
        Some(style) if style.trim().is_empty() => None,
        Some(style) => Some(QueryStyle::parse(style)?),
    };
    let mut prepared = prepare(command, TABLE_KIND, tables, scope)?;

    if let Some(style) = style {
        prepared.text = format!("{} {}", style.clause(), prepared.text);
    }

    debug!(
        "Prepared query with {} table(s): {}",
        prepared.objects.len(),
        prepared.text
    );
    Ok(prepared)
}

/// Prepare a LEL image expression; images in scope become `$n`
pub fn prepare_image_expression(
    expression: &str,
    images: &[ObjectRef],
    scope: &Scope,
) -> CommandResult<PreparedCommand> {
    let prepared = prepare(expression, IMAGE_KIND, images, scope)?;
    debug!(
        "Prepared image expression with {} image(s): {}",
        prepared.objects.len(),
        prepared.text
    );
    Ok(prepared)
}
