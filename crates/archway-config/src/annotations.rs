//! Turns struct doc comments into TOML comments for generated config files.

use std::any::type_name;

use documented::{Documented, DocumentedFields};
use toml_edit::{ArrayOfTables, Decor, Item, RawString, Table};
use tracing::warn;

use crate::error::{ConfigError, Result};

/// Renders `docs` as `#` comment lines.
fn comment_block(docs: &str) -> String {
    docs.lines()
        .map(|line| {
            if line.is_empty() {
                "#\n".to_string()
            } else {
                format!("# {line}\n")
            }
        })
        .collect()
}

/// Appends `docs` as comments to the prefix of `decor`, separated from any
/// existing comment by an empty comment line.
pub fn append_comment(decor: &mut Decor, docs: &str) {
    let comments = comment_block(docs);
    let existing = decor
        .prefix()
        .and_then(RawString::as_str)
        .unwrap_or_default()
        .to_string();

    let prefix = if existing.is_empty() || existing.ends_with("\n\n") || !existing.contains('#') {
        format!("{existing}{comments}")
    } else {
        format!("{existing}#\n{comments}")
    };
    decor.set_prefix(prefix);
}

/// Comments every key of `table` with the field docs of `T`. Nested tables
/// also get `T`'s own docs unless `is_root`.
pub fn annotate_table<T>(table: &mut Table, is_root: bool) -> Result<()>
where
    T: Documented + DocumentedFields,
{
    if !is_root {
        append_comment(table.decor_mut(), T::DOCS);
    }

    for (mut key, item) in table.iter_mut() {
        let name = key.get().to_string();
        let Ok(docs) = T::get_field_docs(&name) else {
            warn!(
                "Field '{}' has no documentation on '{}'",
                name,
                type_name::<T>()
            );
            continue;
        };

        match item {
            Item::None => return Err(ConfigError::UnexpectedTomlItem(name)),
            Item::Value(_) => append_comment(key.leaf_decor_mut(), docs),
            Item::Table(sub_table) => append_comment(sub_table.decor_mut(), docs),
            Item::ArrayOfTables(array) => {
                if let Some(first) = array.iter_mut().next() {
                    append_comment(first.decor_mut(), docs);
                }
            }
        }
    }

    Ok(())
}

/// Annotates the first entry of an array of tables; the rest share its shape.
pub fn annotate_first_table<T>(array: &mut ArrayOfTables) -> Result<()>
where
    T: Documented + DocumentedFields,
{
    match array.iter_mut().next() {
        Some(first) => annotate_table::<T>(first, true),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use toml_edit::Decor;

    use super::*;
    use crate::config::Config;

    fn prefix(decor: &Decor) -> String {
        decor.prefix().and_then(|p| p.as_str()).unwrap().to_string()
    }

    #[test]
    fn test_append_comment() {
        let mut decor = Decor::new("", "");
        append_comment(&mut decor, "Request timeout\n\nIn seconds");
        assert_eq!(prefix(&decor), "# Request timeout\n#\n# In seconds\n");
    }

    #[test]
    fn test_append_comment_separates_existing() {
        let mut decor = Decor::new("# First\n", "");
        append_comment(&mut decor, "Second");
        assert_eq!(prefix(&decor), "# First\n#\n# Second\n");
    }

    #[test]
    fn test_annotated_document_has_field_docs() {
        let doc = Config::default_config().to_annotated_document().unwrap();
        let text = doc.to_string();
        assert!(text.contains("# Name of the backend used"));
        assert!(text.contains("# Kind of system"));
    }
}
