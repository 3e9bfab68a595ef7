//! Output backends for emitting metric batches.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use mgdwatch_types::MetricEmission;

/// Wire format for text outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// InfluxDB line protocol, one line per emission.
    #[default]
    LineProtocol,
    /// One JSON object per line: measurement, tags, fields, timestamp.
    Json,
}

impl Format {
    /// Render a batch, one emission per line, newline-terminated.
    pub fn render(
        &self,
        batch: &[MetricEmission],
        timestamp_ns: u64,
    ) -> serde_json::Result<String> {
        let mut out = String::new();
        for emission in batch {
            match self {
                Format::LineProtocol => {
                    out.push_str(&emission.to_line_protocol(Some(timestamp_ns)));
                }
                Format::Json => {
                    let mut value = serde_json::to_value(emission)?;
                    if let Some(obj) = value.as_object_mut() {
                        obj.insert("timestamp".to_string(), timestamp_ns.into());
                    }
                    out.push_str(&serde_json::to_string(&value)?);
                }
            }
            out.push('\n');
        }
        Ok(out)
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" | "influx" | "line-protocol" => Ok(Format::LineProtocol),
            "json" => Ok(Format::Json),
            other => Err(format!("unknown output format '{}' (expected line or json)", other)),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::LineProtocol => f.write_str("line"),
            Format::Json => f.write_str("json"),
        }
    }
}

/// Output destination for metric batches.
///
/// Configure where the poller should emit each pass's emissions.
#[derive(Debug)]
pub enum Output {
    /// Write batches to standard output.
    Stdout(Format),

    /// Append batches to a file.
    File(PathBuf, Format),

    /// Send batches to a TCP server, one connection per batch.
    Tcp(String, Format),

    /// Send batches through a channel.
    ///
    /// Use `Output::channel()` to create this variant and get the receiver.
    Channel(tokio::sync::mpsc::Sender<Vec<MetricEmission>>),
}

impl Output {
    /// Create a stdout output using line protocol.
    pub fn stdout() -> Self {
        Output::Stdout(Format::LineProtocol)
    }

    /// Create a file output using line protocol.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mgdwatch_sdk::{Format, Output};
    ///
    /// let output = Output::file("metrics.out").with_format(Format::Json);
    /// ```
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Output::File(path.into(), Format::LineProtocol)
    }

    /// Create a TCP output using line protocol.
    pub fn tcp(addr: impl Into<String>) -> Self {
        Output::Tcp(addr.into(), Format::LineProtocol)
    }

    /// Create a channel output and return both the output and receiver.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mgdwatch_sdk::Output;
    ///
    /// let (output, mut rx) = Output::channel(16);
    ///
    /// // Later, receive batches
    /// // while let Some(batch) = rx.recv().await {
    /// //     println!("Got {} emissions", batch.len());
    /// // }
    /// ```
    pub fn channel(
        buffer: usize,
    ) -> (Self, tokio::sync::mpsc::Receiver<Vec<MetricEmission>>) {
        let (tx, rx) = tokio::sync::mpsc::channel(buffer);
        (Output::Channel(tx), rx)
    }

    /// Change the text format. Has no effect on channel outputs.
    pub fn with_format(self, format: Format) -> Self {
        match self {
            Output::Stdout(_) => Output::Stdout(format),
            Output::File(path, _) => Output::File(path, format),
            Output::Tcp(addr, _) => Output::Tcp(addr, format),
            channel @ Output::Channel(_) => channel,
        }
    }

    /// Emit a batch to this output.
    pub(crate) async fn emit(
        &self,
        batch: &[MetricEmission],
        timestamp_ns: u64,
    ) -> std::io::Result<()> {
        use tokio::io::AsyncWriteExt;

        match self {
            Output::Stdout(format) => {
                let text = format.render(batch, timestamp_ns)?;
                let mut stdout = tokio::io::stdout();
                stdout.write_all(text.as_bytes()).await?;
                stdout.flush().await?;
            }
            Output::File(path, format) => {
                let text = format.render(batch, timestamp_ns)?;
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?;
                file.write_all(text.as_bytes()).await?;
                file.flush().await?;
            }
            Output::Tcp(addr, format) => {
                use tokio::net::TcpStream;

                // Try to connect and send (best effort)
                if let Ok(mut stream) = TcpStream::connect(addr).await {
                    let text = format.render(batch, timestamp_ns)?;
                    let _ = stream.write_all(text.as_bytes()).await;
                }
            }
            Output::Channel(tx) => {
                // Best effort send (don't block if channel is full)
                let _ = tx.try_send(batch.to_vec());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> Vec<MetricEmission> {
        vec![
            MetricEmission::builder("dsc")
                .tag("server", "a:1")
                .tag("code", "200")
                .field("count", 3.0)
                .build(),
            MetricEmission::builder("downsteram")
                .tag("server", "a:1")
                .field("one-minute", 4_i64)
                .build(),
        ]
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("line".parse::<Format>().unwrap(), Format::LineProtocol);
        assert_eq!("JSON".parse::<Format>().unwrap(), Format::Json);
        assert!("xml".parse::<Format>().is_err());
        assert_eq!(Format::Json.to_string(), "json");
    }

    #[test]
    fn test_render_line_protocol() {
        let text = Format::LineProtocol.render(&batch(), 42).unwrap();
        assert_eq!(
            text,
            "dsc,code=200,server=a:1 count=3 42\ndownsteram,server=a:1 one-minute=4i 42\n"
        );
    }

    #[test]
    fn test_render_json() {
        let text = Format::Json.render(&batch(), 42).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["measurement"], "dsc");
        assert_eq!(lines[0]["tags"]["code"], "200");
        assert_eq!(lines[1]["fields"]["one-minute"], 4);
        assert_eq!(lines[1]["timestamp"], 42);
    }

    #[test]
    fn test_with_format() {
        match Output::file("x.out").with_format(Format::Json) {
            Output::File(path, format) => {
                assert_eq!(path, PathBuf::from("x.out"));
                assert_eq!(format, Format::Json);
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_file_output_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.out");
        let output = Output::file(&path);

        output.emit(&batch(), 1).await.unwrap();
        output.emit(&batch(), 2).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 4);
        assert!(content.lines().last().unwrap().ends_with(" 2"));
    }

    #[tokio::test]
    async fn test_channel_output() {
        let (output, mut rx) = Output::channel(4);
        output.emit(&batch(), 7).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received, batch());
    }

    #[tokio::test]
    async fn test_tcp_output_unreachable_is_silent() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let output = Output::tcp(addr.to_string());
        assert!(output.emit(&batch(), 1).await.is_ok());
    }
}
