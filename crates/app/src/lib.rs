//! `pocketshop-app`
//!
//! **Responsibility:** the presentation layer around the product store.
//!
//! - [`manager::ProductManager`]: headless view model (intents in, views out)
//! - [`view`]: formatted render snapshots
//! - [`terminal`]: a line-oriented front end over any `BufRead`/`Write`
//! - [`config`]: environment-driven settings

pub mod config;
pub mod manager;
pub mod terminal;
pub mod view;

pub use config::{AppConfig, ConfigError};
pub use manager::{Feedback, Intent, ProductManager};
pub use view::ManagerView;
