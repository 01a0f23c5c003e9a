//! Canonical archival record model shared by every archway backend.

pub mod client;
pub mod error;
pub mod query;
pub mod record;
pub mod walker;

pub use client::{
    ArchiveClient, BackendKind, CreatedObject, DeleteOutcome, DigitalObject,
    DigitalObjectComponent, FindByIdField, FindByIdType, FoundRecord, NewChild, ParentRef,
    RecordEdit,
};
pub use error::{ArchiveError, Result};
pub use query::{escape_query, CollectionQuery, EscapeLevel, PageRequest, SortOrder};
pub use record::{retain_content, Children, DateRange, Note, Record, RecordType};
pub use walker::{descendant_ids, walk, TreeOptions, TreeSource};
