use archway_core::{CollectionQuery, FindByIdField, FindByIdType, Note, SortOrder};
use clap::{ArgAction, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    /// Backend to use instead of the configured default
    #[arg(short, long, global = true)]
    pub backend: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

/// Collection filters shared by the search commands.
#[derive(clap::Args, Debug, Default)]
pub struct QueryArgs {
    /// Match titles (and, on the Toolkit, identifiers) containing this text
    #[arg(required = false, short, long)]
    pub search: Option<String>,

    /// Exact identifier, or a prefix when it ends in '*'
    #[arg(required = false, short, long)]
    pub identifier: Option<String>,

    /// Title order: asc or desc
    #[arg(required = false, long, default_value = "asc")]
    pub sort: SortOrder,
}

impl QueryArgs {
    pub fn query(&self) -> CollectionQuery {
        CollectionQuery {
            search_pattern: self.search.clone(),
            identifier: self.identifier.clone(),
            sort: self.sort,
        }
    }
}

/// Date fields shared by the commands that write records.
#[derive(clap::Args, Debug, Default)]
pub struct DateArgs {
    /// Start date (a year on the Toolkit)
    #[arg(required = false, long)]
    pub start_date: Option<String>,

    /// End date (a year on the Toolkit)
    #[arg(required = false, long)]
    pub end_date: Option<String>,

    /// Free-text date expression
    #[arg(required = false, long)]
    pub date_expression: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a record and its descendants
    #[command(arg_required_else_help = true)]
    Tree {
        /// Record id (URI, row id or slug)
        id: String,

        /// Levels to materialize; 1 returns only the record itself
        #[arg(required = false, short, long)]
        depth: Option<u32>,

        /// Order siblings by title: asc or desc
        #[arg(required = false, long)]
        sort: Option<SortOrder>,

        /// Only include children matching this text (Toolkit)
        #[arg(required = false, long)]
        search: Option<String>,
    },

    /// Show a single record
    #[command(arg_required_else_help = true)]
    Get {
        /// Record id
        id: String,
    },

    /// List the ids of every descendant of a record
    #[command(arg_required_else_help = true)]
    List {
        /// Record id
        id: String,
    },

    /// Search collections, one page at a time
    Find {
        #[command(flatten)]
        query: QueryArgs,

        /// Page number, starting at 1
        #[arg(required = false, short, long, default_value_t = 1)]
        page: u32,

        /// Collections per page
        #[arg(required = false, long, default_value_t = 30)]
        page_size: u32,
    },

    /// List the ids of every matching collection
    Ids {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Count matching collections
    Count {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Look up records by ref_id or component_id (ArchivesSpace)
    #[command(arg_required_else_help = true)]
    FindById {
        /// Value to look up
        value: String,

        /// Record kind: archival_objects or digital_object_components
        #[arg(required = false, long, default_value = "archival_objects")]
        kind: FindByIdType,

        /// Field to match: ref_id or component_id
        #[arg(required = false, long, default_value = "ref_id")]
        field: FindByIdField,
    },

    /// List the levels of description the backend knows
    Levels,

    /// Show the immediate parent of a component
    #[command(arg_required_else_help = true)]
    Parent {
        /// Component id
        id: String,
    },

    /// Show the collection a component belongs to
    #[command(arg_required_else_help = true)]
    Resource {
        /// Component id
        id: String,
    },

    /// Change fields of a record
    #[command(arg_required_else_help = true)]
    Edit {
        /// Record id
        id: String,

        /// New title
        #[arg(required = false, short, long)]
        title: Option<String>,

        /// New level of description
        #[arg(required = false, short, long)]
        level: Option<String>,

        #[command(flatten)]
        dates: DateArgs,

        /// Replacement note as TYPE:CONTENT; repeat for several notes
        #[arg(required = false, short, long, value_parser = parse_note)]
        note: Vec<Note>,

        /// Remove every note from the record
        #[arg(required = false, long, conflicts_with = "note")]
        clear_notes: bool,
    },

    /// Create a child record
    #[command(arg_required_else_help = true)]
    AddChild {
        /// Parent record id
        parent: String,

        /// Title of the new record
        #[arg(required = true, short, long)]
        title: String,

        /// Level of description of the new record
        #[arg(required = true, short, long)]
        level: String,

        #[command(flatten)]
        dates: DateArgs,

        /// Note as TYPE:CONTENT; an empty TYPE takes the backend default
        #[arg(required = false, short, long, value_parser = parse_note)]
        note: Vec<Note>,
    },

    /// Attach a digital object to a record
    #[command(arg_required_else_help = true)]
    AddDigitalObject {
        /// Parent record id
        parent: String,

        /// Identifier of the digital object
        #[arg(required = true, short, long)]
        identifier: String,

        /// Title; defaults to the parent's title or the file name
        #[arg(required = false, short, long)]
        title: Option<String>,

        /// Location of the file
        #[arg(required = false, short, long)]
        uri: Option<String>,

        /// Size of the file in bytes
        #[arg(required = false, long)]
        size: Option<u64>,

        /// Mark the object as restricted
        #[arg(required = false, long)]
        restricted: bool,

        /// Access conditions note
        #[arg(required = false, long)]
        access_conditions: Option<String>,

        /// Use conditions note
        #[arg(required = false, long)]
        use_conditions: Option<String>,

        /// Copy the parent's dates
        #[arg(required = false, long)]
        inherit_dates: bool,

        /// Copy the parent's notes (ArchivesSpace)
        #[arg(required = false, long)]
        inherit_notes: bool,
    },

    /// Attach a component to a digital object (ArchivesSpace)
    #[command(arg_required_else_help = true)]
    AddDigitalObjectComponent {
        /// Digital object id
        parent: String,

        /// Parent component id, for nested components
        #[arg(required = false, long)]
        parent_component: Option<String>,

        /// Component label
        #[arg(required = false, short, long)]
        label: Option<String>,

        /// Component title
        #[arg(required = false, short, long)]
        title: Option<String>,
    },

    /// Delete a record
    #[command(arg_required_else_help = true)]
    Delete {
        /// Record id
        id: String,
    },

    /// Write the default configuration file
    DefaultConfig,
}

/// Parses `TYPE:CONTENT`. The content may itself contain colons.
pub fn parse_note(value: &str) -> Result<Note, String> {
    let (note_type, content) = value
        .split_once(':')
        .ok_or_else(|| format!("Notes are written as TYPE:CONTENT, got '{value}'"))?;
    Ok(Note::new(note_type.trim(), content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note() {
        assert_eq!(
            parse_note("odd:Some: text").unwrap(),
            Note::new("odd", "Some: text")
        );
        assert_eq!(parse_note(":untyped").unwrap(), Note::new("", "untyped"));
        assert!(parse_note("no type").is_err());
    }

    #[test]
    fn test_tree_arguments() {
        let args = Args::try_parse_from([
            "archway",
            "-b",
            "atom",
            "tree",
            "test-fonds",
            "--depth",
            "2",
            "--sort",
            "desc",
        ])
        .unwrap();
        assert_eq!(args.backend.as_deref(), Some("atom"));
        match args.command {
            Commands::Tree { id, depth, sort, .. } => {
                assert_eq!(id, "test-fonds");
                assert_eq!(depth, Some(2));
                assert_eq!(sort, Some(SortOrder::Desc));
            }
            _ => panic!("expected the tree command"),
        }
    }

    #[test]
    fn test_query_arguments() {
        let args = Args::try_parse_from(["archway", "find", "-i", "F*", "--page", "2", "--json"])
            .unwrap();
        assert!(args.json);
        match args.command {
            Commands::Find { query, page, page_size } => {
                let query = query.query();
                assert_eq!(query.identifier(), Some("F*"));
                assert_eq!(query.search_pattern(), None);
                assert_eq!(query.sort, SortOrder::Asc);
                assert_eq!(page, 2);
                assert_eq!(page_size, 30);
            }
            _ => panic!("expected the find command"),
        }
    }

    #[test]
    fn test_edit_notes_conflict_with_clearing() {
        assert!(Args::try_parse_from([
            "archway",
            "edit",
            "31",
            "--note",
            "odd:text",
            "--clear-notes",
        ])
        .is_err());
        assert!(Args::try_parse_from(["archway", "tree", "31", "--sort", "sideways"]).is_err());
    }
}
