//! # mgdwatch-sdk
//!
//! Polling loop and output sinks for publishing mgd metrics.
//!
//! A [`Poller`] runs gather passes with an [`MgdAdapter`] on an interval and
//! writes every pass's emissions to one or more [`Output`]s.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mgdwatch_sdk::{Format, MgdAdapter, Output, Poller};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = MgdAdapter::builder()
//!         .servers(["localhost:50000", "10.0.0.7"])
//!         .build()?;
//!
//!     let poller = Poller::builder(adapter)
//!         .output(Output::stdout())
//!         .output(Output::file("mgd.json").with_format(Format::Json))
//!         .interval(Duration::from_secs(10))
//!         .build();
//!
//!     // One pass right now
//!     let emitted = poller.run_once().await?;
//!     println!("emitted {} metrics", emitted);
//!
//!     // Or keep polling in the background
//!     let handle = poller.start();
//!     tokio::time::sleep(Duration::from_secs(30)).await;
//!     handle.stop();
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Outputs**: stdout, append-only file, TCP, or custom channel
//! - **Formats**: InfluxDB line protocol or JSON lines
//! - **Background polling**: fixed interval, failed passes are logged and skipped

mod output;
mod poller;

pub use output::{Format, Output};
pub use poller::{PassSummary, PollHandle, Poller, PollerBuilder, DEFAULT_INTERVAL};

// Re-export types for convenience
pub use mgdwatch_adapters::mgd::MgdAdapter;
pub use mgdwatch_adapters::{AdapterError, ErrorKind};
pub use mgdwatch_types::{FieldValue, Fields, MetricEmission, Tags};
