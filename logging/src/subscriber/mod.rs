// Bridges the `tracing` ecosystem into an AsyncLogger.

mod layer;
mod visitor;

pub use layer::{init_global_subscriber, level_for, BatchLogLayer};
