// Adapters layer: concrete implementations of the domain ports for external systems.

pub mod rest_store;
pub mod watcher;

pub use rest_store::RestStore;
pub use watcher::PollingWatcher;
