pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::store::LocalDocumentStore;
pub use config::EngineConfig;
pub use core::catalog::{AgreementKey, IndexEntry};
pub use core::engine::{EngineOptions, PreparedProgram, ProgressEngine};
pub use core::observer::{NoopObserver, TracingObserver};
pub use domain::model::{CourseEntry, GroupResult, ProgressReport, StudentCourse};
pub use utils::error::{ProgressError, Result};
