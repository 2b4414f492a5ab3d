pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{http::ApolloClient, storage::LocalStorage};
pub use config::{RunConfig, Settings, API_KEY_ENV};
pub use core::engine::{build_service, RunStage, RunSummary, UploadEngine};
pub use core::retry::{RetryPolicy, RetryingService};
pub use utils::error::{Result, UploadError};
pub use tokio_util::sync::CancellationToken;
pub use utils::shutdown::install_signal_handler;
