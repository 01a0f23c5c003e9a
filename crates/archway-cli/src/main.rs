use std::path::PathBuf;

use archway_clients::connect;
use archway_config::{default_config_path, generate_default_config, Config};
use archway_core::{
    ArchiveClient, DigitalObject, DigitalObjectComponent, NewChild, PageRequest, RecordEdit,
    TreeOptions,
};
use clap::Parser;
use cli::{Args, Commands, DateArgs};
use display::Output;
use error::CliResult;
use logging::setup_logging;
use nu_ansi_term::Color::{Cyan, Green};
use tracing::{debug, info, warn};
use utils::Colored;

mod cli;
mod display;
mod error;
mod logging;
mod utils;

fn record_edit(
    id: String,
    title: Option<String>,
    level: Option<String>,
    dates: DateArgs,
    notes: Option<Vec<archway_core::Note>>,
) -> RecordEdit {
    RecordEdit {
        id,
        title,
        level,
        notes,
        start_date: dates.start_date,
        end_date: dates.end_date,
        date_expression: dates.date_expression,
    }
}

fn run_command(client: &mut dyn ArchiveClient, command: Commands, output: &Output) -> CliResult<()> {
    match command {
        Commands::Tree {
            id,
            depth,
            sort,
            search,
        } => {
            let options = TreeOptions {
                max_depth: depth,
                sort,
                search_pattern: search,
            };
            let record = client.get_resource_component_and_children(&id, &options)?;
            output.record(&record)?;
        }
        Commands::Get {
            id,
        } => {
            let record = client.get_record(&id)?;
            output.record(&record)?;
        }
        Commands::List {
            id,
        } => {
            let ids = client.collection_list(&id)?;
            output.lines(&ids)?;
        }
        Commands::Find {
            query,
            page,
            page_size,
        } => {
            let records =
                client.find_collections(&query.query(), PageRequest::new(page, page_size))?;
            if records.is_empty() {
                info!("No collections found");
            }
            output.records(&records)?;
        }
        Commands::Ids {
            query,
        } => {
            let ids = client.find_collection_ids(&query.query())?;
            output.lines(&ids)?;
        }
        Commands::Count {
            query,
        } => {
            let count = client.count_collections(&query.query())?;
            output.value(&count, |count| format!("{count}\n"))?;
        }
        Commands::FindById {
            value,
            kind,
            field,
        } => {
            let found = client.find_by_id(kind, field, &value)?;
            output.value(&found, |found| {
                found
                    .iter()
                    .map(|hit| {
                        format!(
                            "{} [{}] {}\n",
                            Colored(Cyan, &hit.title),
                            hit.identifier,
                            hit.id
                        )
                    })
                    .collect()
            })?;
        }
        Commands::Levels => {
            let levels = client.get_levels_of_description()?;
            output.lines(&levels)?;
        }
        Commands::Parent {
            id,
        } => {
            let parent = client.find_parent_id_for_component(&id)?;
            output.value(&parent, |parent| {
                format!("{} {}\n", parent.record_type, parent.id)
            })?;
        }
        Commands::Resource {
            id,
        } => {
            let resource = client.find_resource_id_for_component(&id)?;
            output.value(&resource, |resource| format!("{resource}\n"))?;
        }
        Commands::Edit {
            id,
            title,
            level,
            dates,
            note,
            clear_notes,
        } => {
            let notes = if clear_notes {
                Some(Vec::new())
            } else if note.is_empty() {
                None
            } else {
                Some(note)
            };
            let edit = record_edit(id, title, level, dates, notes);
            client.edit_record(&edit)?;
            info!("Updated {}", Colored(Green, &edit.id));
        }
        Commands::AddChild {
            parent,
            title,
            level,
            dates,
            note,
        } => {
            let child = NewChild {
                title,
                level,
                start_date: dates.start_date,
                end_date: dates.end_date,
                date_expression: dates.date_expression,
                notes: note,
            };
            let id = client.add_child(&parent, &child)?;
            output.value(&id, |id| format!("{id}\n"))?;
        }
        Commands::AddDigitalObject {
            parent,
            identifier,
            title,
            uri,
            size,
            restricted,
            access_conditions,
            use_conditions,
            inherit_dates,
            inherit_notes,
        } => {
            let object = DigitalObject {
                title,
                uri,
                size,
                access_conditions,
                use_conditions,
                ..DigitalObject::new(identifier)
            }
            .restricted(restricted)
            .inherit_dates(inherit_dates)
            .inherit_notes(inherit_notes);
            let created = client.add_digital_object(&parent, &object)?;
            output.value(&created, |created| format!("{}\n", created.id))?;
        }
        Commands::AddDigitalObjectComponent {
            parent,
            parent_component,
            label,
            title,
        } => {
            let component = DigitalObjectComponent {
                label,
                title,
            };
            let created = client.add_digital_object_component(
                &parent,
                parent_component.as_deref(),
                &component,
            )?;
            output.value(&created, |created| format!("{}\n", created.id))?;
        }
        Commands::Delete {
            id,
        } => {
            let outcome = client.delete_record(&id)?;
            output.value(&outcome, |outcome| format!("{} {id}\n", outcome.status))?;
        }
        // Written before a backend is selected.
        Commands::DefaultConfig => {}
    }
    Ok(())
}

fn handle_cli() -> CliResult<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        utils::disable_color();
    }

    let config_path = args
        .config
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    if matches!(args.command, Commands::DefaultConfig) {
        generate_default_config(&config_path)?;
        info!(
            "Default configuration written to {}",
            Colored(Green, config_path.display())
        );
        return Ok(());
    }

    let config = Config::load(&config_path)?;
    let backend = config.backend(args.backend.as_deref())?;
    debug!(backend = %backend.name, "using backend");

    let mut client = connect(backend, config.timeout())?;
    let output = Output {
        json: args.json,
    };
    let result = run_command(client.as_mut(), args.command, &output);

    if let Err(err) = client.close() {
        warn!("Failed to close the {} session: {err}", client.backend().name());
    }
    result
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli() {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
