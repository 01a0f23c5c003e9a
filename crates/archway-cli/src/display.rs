//! Terminal rendering of records: pretty JSON, or a compact indented tree.

use std::fmt::Write as _;

use archway_core::{Children, Record};
use nu_ansi_term::Color::{Blue, Cyan, DarkGray, Green, Yellow};
use serde::Serialize;

use crate::{error::CliResult, utils::Colored};

pub struct Output {
    pub json: bool,
}

impl Output {
    /// Prints `value` as JSON, or `text` rendered from it.
    pub fn value<T: Serialize + ?Sized>(
        &self,
        value: &T,
        text: impl FnOnce(&T) -> String,
    ) -> CliResult<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            print!("{}", text(value));
        }
        Ok(())
    }

    pub fn record(&self, record: &Record) -> CliResult<()> {
        self.value(record, render_tree)
    }

    pub fn records(&self, records: &[Record]) -> CliResult<()> {
        self.value(records, |records| records.iter().map(render_tree).collect())
    }

    pub fn lines(&self, values: &[String]) -> CliResult<()> {
        self.value(values, |values| {
            values.iter().map(|value| format!("{value}\n")).collect()
        })
    }
}

/// One line per record, children indented under their parent.
pub fn render_tree(record: &Record) -> String {
    let mut out = String::new();
    render_node(record, 0, &mut out);
    out
}

fn render_node(record: &Record, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let _ = write!(out, "{indent}{}", Colored(Blue, &record.title));
    if !record.identifier.is_empty() {
        let _ = write!(out, " [{}]", Colored(Cyan, &record.identifier));
    }
    if !record.level_of_description.is_empty() {
        let _ = write!(out, " ({})", Colored(Green, &record.level_of_description));
    }
    if !record.dates.is_empty() {
        let _ = write!(out, " {}", Colored(Yellow, &record.dates));
    }
    let _ = writeln!(out, " {}", Colored(DarkGray, &record.id));

    for note in &record.notes {
        let _ = writeln!(
            out,
            "{indent}  {}: {}",
            Colored(DarkGray, &note.note_type),
            note.content
        );
    }

    match &record.children {
        Children::None => {}
        Children::Withheld => {
            let _ = writeln!(out, "{indent}  {}", Colored(DarkGray, "..."));
        }
        Children::Fetched(children) => {
            for child in children {
                render_node(child, depth + 1, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use archway_core::{Note, RecordType};

    use super::*;
    use crate::utils::disable_color;

    fn component(id: &str, title: &str) -> Record {
        let mut record = Record::new(id, RecordType::ResourceComponent);
        record.title = title.to_string();
        record
    }

    #[test]
    fn test_render_tree() {
        disable_color();
        let mut child = component("23", "Child A");
        child.level_of_description = "subseries".into();
        child.children = Children::Withheld;

        let mut root = Record::new("31", RecordType::Resource);
        root.title = "Parent".into();
        root.identifier = "PR01".into();
        root.dates = "1880 to 1889".into();
        root.notes.push(Note::new("odd", "This is a note"));
        root.children = Children::Fetched(vec![child, component("26", "Child B")]);

        assert_eq!(
            render_tree(&root),
            "Parent [PR01] 1880 to 1889 31\n  odd: This is a note\n  Child A (subseries) 23\n    ...\n  Child B 26\n"
        );
    }
}
