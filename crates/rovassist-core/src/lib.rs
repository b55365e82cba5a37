pub mod config;
pub mod error;
pub mod lexicon;
pub mod types;

pub use config::RovConfig;
pub use error::{Result, RovError};
pub use lexicon::{ModelAliasConfig, RouterFile, RuleConfig};
pub use types::*;
