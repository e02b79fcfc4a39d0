//! Scalar summaries from event logs
//!
//! An event log is an append-only file of length-prefixed records, each an
//! event with a step number and a list of tagged scalar measurements. The
//! [`EventLogReader`] trait is the seam to the log format; [`TfEventReader`]
//! reads TensorFlow `tfevents` files.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use labbook::summary::{scalar_triples, TfEventReader};
//! use std::path::Path;
//!
//! let reader = TfEventReader::new();
//! for triple in scalar_triples(&reader, Path::new("events.out.tfevents.1"))? {
//!     let triple = triple?;
//!     println!("{} {} {}", triple.step, triple.tag, triple.value);
//! }
//! # Ok::<(), labbook::Error>(())
//! ```

mod proto;
mod tfrecord;

pub use tfrecord::{masked_crc, write_record, RecordReader};

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use prost::Message;

use crate::{Error, Result};
use proto::{EventProto, SummaryProto, SummaryValueProto};

/// One tagged scalar inside an event.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Tag name, e.g. `loss`.
    pub tag: String,
    /// Measured value.
    pub value: f64,
}

impl Measurement {
    /// Create a measurement.
    #[must_use]
    pub fn new(tag: impl Into<String>, value: f64) -> Self {
        Self {
            tag: tag.into(),
            value,
        }
    }
}

/// One decoded event-log record.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Global step.
    pub step: i64,
    /// Wall clock time in seconds.
    pub wall_time: f64,
    /// Scalar measurements, in record order.
    pub measurements: Vec<Measurement>,
}

impl Event {
    /// Create an event.
    #[must_use]
    pub const fn new(step: i64, wall_time: f64, measurements: Vec<Measurement>) -> Self {
        Self {
            step,
            wall_time,
            measurements,
        }
    }
}

/// `(step, tag, value)` triple produced from an event log.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarTriple {
    /// Step of the originating event.
    pub step: i64,
    /// Measurement tag.
    pub tag: String,
    /// Measurement value.
    pub value: f64,
}

/// Lazy sequence of events read from a log.
pub type EventIter = Box<dyn Iterator<Item = Result<Event>>>;

/// Reads events out of a local event-log file.
pub trait EventLogReader: Send + Sync {
    /// Open `path` and yield its events lazily, in file order.
    fn read_events(&self, path: &Path) -> Result<EventIter>;
}

/// Reader for TensorFlow `tfevents` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfEventReader;

impl TfEventReader {
    /// Create a reader.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EventLogReader for TfEventReader {
    fn read_events(&self, path: &Path) -> Result<EventIter> {
        let file = File::open(path)?;
        let records = RecordReader::new(BufReader::new(file));
        Ok(Box::new(records.map(|record| decode_event(&record?))))
    }
}

fn decode_event(payload: &[u8]) -> Result<Event> {
    let proto = EventProto::decode(payload)
        .map_err(|err| Error::DecodeError(format!("malformed event record: {err}")))?;
    let measurements = proto
        .summary
        .map(|summary| {
            summary
                .value
                .into_iter()
                .filter_map(|v| v.scalar().map(|value| Measurement::new(v.tag, value)))
                .collect()
        })
        .unwrap_or_default();
    Ok(Event::new(proto.step, proto.wall_time, measurements))
}

/// Flatten an event log into `(step, tag, value)` triples.
///
/// Filtering by tag is left to the caller.
///
/// # Errors
///
/// Returns an error if the log cannot be opened; decode failures surface as
/// `Err` items from the iterator.
pub fn scalar_triples(
    reader: &dyn EventLogReader,
    path: &Path,
) -> Result<impl Iterator<Item = Result<ScalarTriple>>> {
    let events = reader.read_events(path)?;
    Ok(events.flat_map(|event| -> Vec<Result<ScalarTriple>> {
        match event {
            Ok(event) => event
                .measurements
                .into_iter()
                .map(|m| {
                    Ok(ScalarTriple {
                        step: event.step,
                        tag: m.tag,
                        value: m.value,
                    })
                })
                .collect(),
            Err(err) => vec![Err(err)],
        }
    }))
}

/// Write events in `tfevents` format.
///
/// # Errors
///
/// Propagates write failures.
#[allow(clippy::cast_possible_truncation)]
pub fn write_events<W: Write>(mut writer: W, events: &[Event]) -> Result<()> {
    for event in events {
        let proto = EventProto {
            wall_time: event.wall_time,
            step: event.step,
            summary: Some(SummaryProto {
                value: event
                    .measurements
                    .iter()
                    .map(|m| SummaryValueProto {
                        tag: m.tag.clone(),
                        simple_value: Some(m.value as f32),
                        tensor: None,
                    })
                    .collect(),
            }),
        };
        write_record(&mut writer, &proto.encode_to_vec())?;
    }
    writer.flush()?;
    Ok(())
}
