// Application layer: page loaders, text rendering, form actions and the refresh loop.

pub mod actions;
#[cfg(feature = "cli")]
pub mod commands;
pub mod pages;
pub mod render;
pub mod watch;

pub use pages::{render_page, Page, PageOptions};
pub use watch::watch_page;
