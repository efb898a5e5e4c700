pub mod types;
pub mod error;
pub mod config;
pub mod selector;

pub use error::{Error, Result};
pub use types::{Classification, ClassificationBatch, SelectionResult};
pub use config::{SelectorConfig, ConfigError};
pub use selector::{TopKSelector, select_top_k};
