pub mod generator;
pub mod models;
pub mod parser;
pub mod settings;
pub mod sync;
pub mod utils;

// Re-export the node model for easier access
pub use models::{NodeRecord, ProxyType};

// Re-export the reconciliation entry points
pub use settings::Settings;
pub use sync::{CommandGateway, Gateway, Reconciler, SyncOutcome};
