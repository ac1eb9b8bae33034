//! Services module - the query and sorting logic layered over the models.
//!
//! The services are framework-agnostic and have no dependencies on any
//! host-application layer, making them testable in isolation.
//!
//! # Components
//!
//! - [`condition`]: the condition language. A hand-rolled lexer and
//!   recursive-descent parser produce an AST that
//!   [`ConditionEvaluator`](condition::ConditionEvaluator) resolves against
//!   the installed game, memoising results per cache epoch.
//!
//! - [`sorting`]: builds the plugin graph (partition rules, header
//!   masters, metadata relationships, soft group edges, priority
//!   tie-breaks), detects cycles, and emits a deterministic topological
//!   order.
//!
//! - [`database`]: the [`Database`](database::Database) query surface over
//!   the merged masterlist + userlist metadata.
//!
//! The evaluator is the only service that touches the filesystem during a
//! query; the sorter and database operate purely on in-memory state.

pub mod condition;
pub mod database;
pub mod sorting;

pub use condition::ConditionEvaluator;
pub use database::Database;
pub use sorting::EdgeType;
