//! Experiment records
//!
//! The facade over a resolved run: the decoded record, lazy artifact access,
//! scalar summaries, weights lookup, and database-only export and update.
//!
//! ## Layout
//!
//! ```text
//! ExperimentRecord
//!   ├── Backend        (database | directory | zip)
//!   ├── Document       raw extended JSON
//!   ├── Record         decoded values
//!   └── EventLogReader get_summary → ScalarSeries
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use labbook::experiment::ExperimentRecord;
//! use labbook::store::MemoryDatabase;
//! use labbook::{DatabaseConfig, Resolver, StoreConfig};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let db = MemoryDatabase::new();
//! db.insert_run(json!({
//!     "_id": 1,
//!     "config": {"seed": 7},
//!     "info": {},
//!     "captured_out": "",
//!     "artifacts": []
//! }))?;
//!
//! let config = StoreConfig::new()
//!     .with_database(DatabaseConfig::new("localhost", "u", "p", "runs"));
//! let resolver = Resolver::new(config).with_connector(Arc::new(db));
//!
//! let mut run = ExperimentRecord::open(&resolver, 1_u64)?;
//! run.update_record([("status", "done")].into_iter().collect())?;
//! assert_eq!(run.get_record().get("status").and_then(|v| v.as_str()), Some("done"));
//! # Ok::<(), labbook::Error>(())
//! ```

mod experiment_record;
mod export;
mod record;
mod scalar_series;

pub use experiment_record::{ExperimentRecord, Weights, EVENTS_MARKER, WEIGHTS_MARKER};
pub use export::{descriptor_entries, zip_path, ArchiveExport};
pub use record::Record;
pub use scalar_series::{ScalarPoint, ScalarSeries};
