// plugsort - load order optimisation for Bethesda-style game plugins
//
// This is the library crate containing the metadata model, the condition
// language, and the sorting engine. Binary plugin parsing, the on-disk
// load order, and masterlist version control are supplied by the host
// through the collaborator traits in `game`.

pub mod error;
pub mod game;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod version;

// Re-export commonly used types for convenience
pub use error::{CycleEdge, Error, Result};
pub use game::{Game, GameCache, GameId, LoadOrderHandler, PluginInspector, PluginRecord,
    PluginView, VcsClient};
pub use models::{
    CleaningData, FileRef, Group, Location, Masterlist, MasterlistInfo, Message, MessageContent,
    MessageType, MetadataList, PluginMetadata, Priority, PriorityState, Tag,
};
pub use services::{Database, EdgeType};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
