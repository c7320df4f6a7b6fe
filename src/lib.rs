// dhp-vault - Versioned patient document store
// Copyright (c) 2025 dhp-vault Contributors
// Licensed under the MIT License

//! # dhp-vault - Bounded-history store for patient documents
//!
//! dhp-vault keeps the recent history of two documents per patient, the
//! digital health profile (DHP) and the plan status, so that any of the last
//! N updates can be rolled back.
//!
//! ## Overview
//!
//! This library provides:
//! - **Version chains** with a fixed retention window and FIFO eviction
//! - **Rollback** of one or more recent updates
//! - **Per-chain locking** so concurrent pushes never corrupt a chain
//! - **Durable mirroring** of every chain to PostgreSQL, with rehydration on restart
//! - **JSON export** of the current version of a document
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Version chains, the patient registry, export and the store facade
//! - [`adapters`] - Storage backends (PostgreSQL, in-memory)
//! - [`domain`] - Identifiers, payloads and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dhp_vault::config::load_config;
//! use dhp_vault::core::VaultStore;
//! use dhp_vault::domain::{DocumentKind, DocumentPayload, PatientId};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("dhp-vault.toml")?;
//!     let store = VaultStore::open(&config).await?;
//!
//!     let patient = PatientId::new("P1")?;
//!     let plan = DocumentPayload::try_from(json!({"stage": "post-op", "day": 2}))?;
//!     let entry = store.push(DocumentKind::PlanStatus, &patient, plan).await?;
//!     println!("Stored version {}", entry.sequence_no);
//!
//!     store.export(DocumentKind::PlanStatus, &patient, "out/plan.json").await?;
//!     store.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`domain::Result`], carrying a [`domain::VaultError`].
//! Nothing is retried internally, and a failed commit leaves both the database
//! and the in-memory chain as they were.
//!
//! ## Logging
//!
//! The crate logs with `tracing`; mutations carry `patient_id`, `kind` and
//! `sequence_no` fields. Install a subscriber with [`logging::init_logging`].

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
