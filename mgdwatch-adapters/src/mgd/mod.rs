//! mgd adapter using the server's HTTP status endpoint.
//!
//! This adapter polls `http://<host:port>/` on each configured mgd server,
//! decodes the JSON status document and maps it to metric emissions.
//!
//! ## Metrics Collected
//!
//! - **inversestream**: job counts and one/five/fifteen minute rates, plus `sw` rates
//! - **upstream**: per-connection counters, rates and latency percentiles
//! - **downsteram**: per-application counters, rates and latency percentiles
//! - **dsc** / **fbs**: per status-code and per fallback counters of downstream apps
//! - **frontstream**: job counts and rates
//!
//! Every emission is tagged with the polled `server` address.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mgdwatch_adapters::mgd::MgdAdapter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = MgdAdapter::builder()
//!         .server("localhost:50000")
//!         .server("10.0.0.7")
//!         .build()?;
//!
//!     for emission in adapter.collect().await? {
//!         println!("{}", emission.to_line_protocol(None));
//!     }
//!
//!     Ok(())
//! }
//! ```

mod fetch;
mod mapper;
mod status;

pub use fetch::{
    normalize_address, status_url, Fetcher, DEFAULT_ADDRESS, DEFAULT_PORT, FETCH_TIMEOUT,
};
pub use mapper::{map, PrefixRule, StatusMapper, PERCENTILES};
pub use status::{to_field_value, Section, SectionEntry, ServerStatus, StatusDocument};

use tracing::debug;

use mgdwatch_types::{Accumulator, MetricBuffer, MetricEmission, Tags};

use crate::AdapterError;

const DESCRIPTION: &str = "Read metrics from one or many mgd servers";

const SAMPLE_CONFIG: &str = r#"
  ## An array of address to gather stats about. Specify an ip on hostname
  ## with optional port. ie localhost, 10.0.0.1:50000, etc.
  servers = ["localhost:50000"]
"#;

/// mgd adapter for collecting stream metrics.
#[derive(Debug, Clone)]
pub struct MgdAdapter {
    fetcher: Fetcher,
    mapper: StatusMapper,
    servers: Vec<String>,
}

impl MgdAdapter {
    /// Create a new builder for configuring the adapter.
    pub fn builder() -> MgdAdapterBuilder {
        MgdAdapterBuilder::default()
    }

    /// One-line description of this adapter.
    pub fn description(&self) -> &'static str {
        DESCRIPTION
    }

    /// Sample configuration snippet for this adapter.
    pub fn sample_config(&self) -> &'static str {
        SAMPLE_CONFIG
    }

    /// Configured servers, as given.
    pub fn servers(&self) -> &[String] {
        &self.servers
    }

    /// Addresses polled by one pass, in order, with default ports applied.
    ///
    /// An empty server list polls [`DEFAULT_ADDRESS`] once.
    pub fn addresses(&self) -> Vec<String> {
        if self.servers.is_empty() {
            return vec![DEFAULT_ADDRESS.to_string()];
        }
        self.servers.iter().map(|s| normalize_address(s)).collect()
    }

    /// Run one pass over every server, feeding emissions to `acc`.
    ///
    /// Servers are polled sequentially in configuration order. The first
    /// failure stops the pass; emissions from servers already polled stay in
    /// the accumulator.
    pub async fn gather<A>(&self, acc: &mut A) -> Result<(), AdapterError>
    where
        A: Accumulator + ?Sized,
    {
        for address in self.addresses() {
            self.gather_server(&address, acc).await?;
        }
        Ok(())
    }

    /// Collect one pass into a fresh buffer.
    pub async fn collect(&self) -> Result<Vec<MetricEmission>, AdapterError> {
        let mut buffer = MetricBuffer::new();
        self.gather(&mut buffer).await?;
        Ok(buffer.into_inner())
    }

    /// Fetch, decode and map a single server (address already normalized).
    pub async fn gather_server<A>(&self, address: &str, acc: &mut A) -> Result<(), AdapterError>
    where
        A: Accumulator + ?Sized,
    {
        let body = self.fetcher.fetch(address).await?;
        let document = StatusDocument::from_slice(&body)?;

        if let Some(server) = &document.server {
            debug!(
                address,
                name = %server.name,
                start_at = server.start_at,
                "decoded mgd status"
            );
        }

        let mut tags = Tags::new();
        tags.insert("server".to_string(), address.to_string());

        let emissions = self.mapper.map(&document, &tags)?;
        debug!(address, emissions = emissions.len(), "mapped mgd status");

        for emission in emissions {
            acc.add_emission(emission);
        }
        Ok(())
    }
}

/// Builder for MgdAdapter.
#[derive(Debug, Default)]
pub struct MgdAdapterBuilder {
    servers: Vec<String>,
    mapper: Option<StatusMapper>,
}

impl MgdAdapterBuilder {
    /// Add a server address (`host` or `host:port`).
    pub fn server(mut self, address: impl Into<String>) -> Self {
        self.servers.push(address.into());
        self
    }

    /// Replace the server list.
    pub fn servers<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.servers = addresses.into_iter().map(Into::into).collect();
        self
    }

    /// Use a custom mapper (default: `code-` and `fbs-` rules).
    pub fn mapper(mut self, mapper: StatusMapper) -> Self {
        self.mapper = Some(mapper);
        self
    }

    /// Build the adapter.
    pub fn build(self) -> Result<MgdAdapter, AdapterError> {
        Ok(MgdAdapter {
            fetcher: Fetcher::new()?,
            mapper: self.mapper.unwrap_or_default(),
            servers: self.servers,
        })
    }
}
