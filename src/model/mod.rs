pub mod action;
pub mod config;
pub mod project;
pub mod query;

pub use action::*;
pub use config::*;
pub use project::*;
pub use query::*;
