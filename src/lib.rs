//! # mgdwatch
//!
//! Polls mgd status endpoints and republishes their stream counters as
//! metrics.
//!
//! The workspace is split into four crates:
//!
//! ```text
//! ┌──────────────┐   ┌───────────────────┐   ┌──────────────┐
//! │   mgdwatch   │──▶│   mgdwatch-sdk    │──▶│   Output     │
//! │ (cli/config) │   │ (Poller, outputs) │   │ stdout/file/ │
//! └──────────────┘   └─────────┬─────────┘   │ tcp/channel  │
//!                              │             └──────────────┘
//!                              ▼
//!                    ┌───────────────────┐   ┌──────────────┐
//!                    │ mgdwatch-adapters │──▶│mgdwatch-types│
//!                    │ (fetch, decode,   │   │ (emissions,  │
//!                    │  StatusMapper)    │   │  Accumulator)│
//!                    └───────────────────┘   └──────────────┘
//! ```
//!
//! This crate holds the command-line surface: [`config`] loads layered
//! settings, [`duration`] parses interval strings.
//!
//! ## Usage
//!
//! ```bash
//! # Poll the local server once and print line protocol
//! mgdwatch --once
//!
//! # Poll two servers every 30 seconds, JSON lines into a file
//! mgdwatch --server mgd-1 --server 10.0.0.7:50001 --interval 30s \
//!     --format json --output mgd.json
//!
//! # Start from a config file
//! mgdwatch --sample-config > mgdwatch.toml
//! mgdwatch --config mgdwatch.toml
//! ```

pub mod config;
pub mod duration;

pub use self::config::{ConfigError, OutputSettings, Settings, SAMPLE_CONFIG};
pub use self::duration::{format_duration, parse_duration};
