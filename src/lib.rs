//! # Labbook: Uniform Access to Experiment Records
//!
//! **Version**: 0.1.0
//!
//! Labbook reads machine-learning experiment runs from wherever they were
//! stored: a document database with blob storage, a run directory on disk,
//! or a zip archive. Every backend yields the same decoded record and the
//! same lazy artifact interface.
//!
//! ## Pipeline
//!
//! ```text
//! Identifier ──> Resolver ──> Backend + raw Document
//!                                  │
//!                            codec::decode
//!                                  │
//!                           ExperimentRecord ──> artifacts, summaries, dump
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use labbook::{ExperimentRecord, Resolver, StoreConfig};
//!
//! // Database and storage folder come from EXPERIMENT_* variables
//! let resolver = Resolver::new(StoreConfig::from_env());
//! let run = ExperimentRecord::open(&resolver, std::path::Path::new("runs/42.zip"))?;
//!
//! for name in run.artifacts() {
//!     println!("artifact: {name}");
//! }
//! # Ok::<(), labbook::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod experiment;
pub mod resolver;
pub mod store;
pub mod summary;

pub use config::{DatabaseConfig, StoreConfig};
pub use error::{Error, Result};
pub use experiment::{ExperimentRecord, Record, ScalarSeries, Weights};
pub use resolver::{Identifier, Resolver};
