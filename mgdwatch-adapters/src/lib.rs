//! # mgdwatch-adapters
//!
//! Adapters that collect metrics from mgd servers and convert them to
//! mgdwatch emissions.
//!
//! ## Supported Systems
//!
//! - **mgd** (`mgd` feature, on by default) - Polls the HTTP status endpoint and
//!   flattens inverse/up/down/front stream sections into metrics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mgdwatch_adapters::mgd::MgdAdapter;
//! use mgdwatch_adapters::MetricBuffer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = MgdAdapter::builder()
//!         .server("localhost:50000")
//!         .build()?;
//!
//!     let mut buffer = MetricBuffer::new();
//!     adapter.gather(&mut buffer).await?;
//!
//!     println!("Collected {} emissions", buffer.len());
//!     Ok(())
//! }
//! ```

pub mod error;

#[cfg(feature = "mgd")]
pub mod mgd;

pub use error::{AdapterError, ErrorKind};

// Re-export types for convenience
pub use mgdwatch_types::{Accumulator, FieldValue, Fields, MetricBuffer, MetricEmission, Tags};
