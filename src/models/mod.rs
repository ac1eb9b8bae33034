//! Data models for the metadata system.
//!
//! This module contains the value types the metadata documents are made of:
//! - [`PluginMetadata`]: everything a list knows about one plugin
//! - [`MetadataList`]: a parsed metadata document (plugins, globals, tags, groups)
//! - [`Masterlist`]: a metadata list with repository provenance
//! - [`FileRef`], [`Message`], [`Tag`], [`CleaningData`], [`Location`],
//!   [`Priority`], [`Group`]: the leaf value types
//!
//! All document-facing types serialise to the fixed YAML schema; unknown
//! keys are rejected on load.

pub mod cleaning_data;
pub mod file;
pub mod group;
pub mod location;
pub mod masterlist;
pub mod message;
pub mod metadata_list;
pub mod plugin_metadata;
pub mod priority;
pub mod tag;

pub use cleaning_data::CleaningData;
pub use file::FileRef;
pub use group::Group;
pub use location::Location;
pub use masterlist::{Masterlist, MasterlistInfo};
pub use message::{Message, MessageContent, MessageType, DEFAULT_LANGUAGE};
pub use metadata_list::MetadataList;
pub use plugin_metadata::PluginMetadata;
pub use priority::{Priority, PriorityState};
pub use tag::Tag;
