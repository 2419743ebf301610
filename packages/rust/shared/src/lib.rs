//! Shared types, error model, and configuration for postsmith.
//!
//! This crate is the foundation depended on by all other postsmith crates.
//! It provides:
//! - [`PostsmithError`] — the unified error type
//! - Domain types ([`GeneratedArticle`], [`PublishResult`], [`RunSummary`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CmsConfig, ContentConfig, GenAiConfig, RunConfig, SearchConfig, StorageConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from, validate_api_keys,
};
pub use error::{PostsmithError, Result};
pub use types::{GeneratedArticle, PublishResult, RunSummary};
