// Quarry - typed queries and scroll streaming for OpenSearch
//
// This library bundles the search layer with the logging macros it reports
// through, so applications depend on a single crate.

// Re-export the search layer
pub use quarry_search::*;

// Re-export logging
pub use quarry_log as log;

/// Prelude for common imports.
pub mod prelude {
    pub use quarry_log::{debug, error, info, warn};
    pub use quarry_search::prelude::*;
}
