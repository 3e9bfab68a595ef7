//! # mgdwatch-types
//!
//! Core types for republishing mgd server status as metrics. Adapters turn a
//! polled status document into [`MetricEmission`]s and hand them to an
//! [`Accumulator`]; sinks render them as line protocol or JSON.
//!
//! ## Features
//!
//! - `serde`: JSON serialization of emissions and field values
//!
//! ## Example
//!
//! ```rust
//! use mgdwatch_types::{Accumulator, FieldValue, MetricBuffer, MetricEmission};
//!
//! let emission = MetricEmission::builder("upstream")
//!     .tag("server", "localhost:50000")
//!     .tag("name", "orders")
//!     .field("jobs", 3.0)
//!     .field("one-minute", 12_i64)
//!     .build();
//!
//! let mut buffer = MetricBuffer::new();
//! buffer.add_fields(&emission.measurement, emission.fields.clone(), emission.tags.clone());
//!
//! assert_eq!(buffer.len(), 1);
//! assert_eq!(buffer.iter().next().unwrap().fields["one-minute"], FieldValue::Int(12));
//! ```

mod accumulator;
mod emission;
mod value;

pub use accumulator::*;
pub use emission::*;
pub use value::*;
