pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{PollingWatcher, RestStore};
pub use app::{render_page, watch_page, Page, PageOptions};
pub use config::AdminConfig;
pub use domain::ports::{ChangeSource, DataStore};
pub use utils::error::{AdminError, Result};
