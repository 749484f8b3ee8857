//! HRMS REST client and import pipeline controller.
//!
//! Wraps the backend's import endpoints with [`reqwest`], and drives the
//! [`hrms_core::import_pipeline::ImportSession`] state machine through them,
//! polling progress on a cancellable background task while an import runs.

pub mod api;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod poller;

pub use api::{HrmsApi, ImportApi};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use pipeline::ImportPipeline;
pub use poller::ProgressPoller;
