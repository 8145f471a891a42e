pub mod changelog;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod forge;
pub mod history;
pub mod manifest;
pub mod notify;
pub mod pipeline;
pub mod version;

pub use error::{ReleaseError, Result};
