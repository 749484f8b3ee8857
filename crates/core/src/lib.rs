//! Pure domain logic for the HRMS client data pipeline.
//!
//! Nothing in this crate performs I/O or awaits. Pages (and the
//! `hrms-client` crate) compose these pieces over collections that were
//! already fetched from the server.

pub mod access;
pub mod collate;
pub mod error;
pub mod filter_builder;
pub mod filter_eval;
pub mod group_by;
pub mod import_pipeline;
pub mod pagination;
pub mod record;
pub mod sortable;
pub mod types;
