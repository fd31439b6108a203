pub mod articulation;
pub mod catalog;
pub mod document;
pub mod engine;
pub mod evaluator;
pub mod groups;
pub mod observer;
pub mod progress;
pub mod scope;
pub mod source;
pub mod subject;

pub use crate::domain::model::{ProgressReport, StudentCourse};
pub use crate::domain::ports::{DocumentStore, EvaluationObserver};
pub use crate::utils::error::Result;
