//! PostgreSQL storage integration
//!
//! Mirrors version chains into the `version_chains` and
//! `patient_document_versions` tables.

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
pub use models::{PostgreSQLChainRow, PostgreSQLVersionRow};
