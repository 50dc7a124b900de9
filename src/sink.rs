//! Result persistence.
//!
//! Successful devices get their collected output written under the output
//! directory, one file per device named after its address. Failed devices
//! get one line each in the failure log, carrying the address and the
//! protocol stage that failed.

use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::dispatcher::{DeviceReport, Outcome};

/// Characters that cannot appear in an output file name.
static UNSAFE_FILENAME: Lazy<Regex> = Lazy::new(|| match Regex::new(r"[^A-Za-z0-9._-]+") {
    Ok(re) => re,
    Err(err) => panic!("invalid UNSAFE_FILENAME regex: {err}"),
});

/// Persists per-device results for one run.
pub struct ResultSink {
    output_dir: PathBuf,
    failed: File,
}

impl ResultSink {
    /// Opens a sink writing output files under `output_dir` and failure
    /// lines to `failed_path`.
    ///
    /// The output directory is created if missing; the failure log is
    /// truncated, so each run starts with a clean record.
    pub async fn open(
        output_dir: impl Into<PathBuf>,
        failed_path: impl AsRef<Path>,
    ) -> io::Result<ResultSink> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).await?;
        let failed = File::create(failed_path.as_ref()).await?;

        Ok(ResultSink { output_dir, failed })
    }

    /// Persists one device report.
    pub async fn record(&mut self, report: &DeviceReport) -> io::Result<()> {
        match &report.outcome {
            Outcome::Output(bytes) => {
                let path = self.output_path(&report.address);
                fs::write(&path, bytes).await?;
                debug!("{} output written to {}", report.address, path.display());
            }
            Outcome::Failed { stage, reason } => {
                let line = format!("{}: {} failed: {}\n", report.address, stage.label(), reason);
                self.failed.write_all(line.as_bytes()).await?;
                self.failed.flush().await?;
            }
        }
        Ok(())
    }

    /// Output file path for a device address.
    pub fn output_path(&self, address: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.txt", sanitize_address(address)))
    }
}

/// Maps a device address to a file-name-safe form.
fn sanitize_address(address: &str) -> String {
    UNSAFE_FILENAME.replace_all(address, "_").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;

    fn success_report(address: &str, bytes: &[u8]) -> DeviceReport {
        DeviceReport {
            address: address.to_string(),
            device_type: "router".to_string(),
            outcome: Outcome::Output(bytes.to_vec()),
        }
    }

    fn failure_report(address: &str, stage: Stage, reason: &str) -> DeviceReport {
        DeviceReport {
            address: address.to_string(),
            device_type: "router".to_string(),
            outcome: Outcome::Failed {
                stage,
                reason: reason.to_string(),
            },
        }
    }

    #[test]
    fn addresses_sanitize_to_safe_file_names() {
        assert_eq!(sanitize_address("192.0.2.1:22"), "192.0.2.1_22");
        assert_eq!(sanitize_address("edge/sw-1:2022"), "edge_sw-1_2022");
        assert_eq!(sanitize_address("plain"), "plain");
    }

    #[tokio::test]
    async fn successful_output_lands_in_a_per_device_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let failed_path = dir.path().join("failed.txt");
        let mut sink = ResultSink::open(dir.path().join("result"), &failed_path)
            .await
            .expect("open sink");

        sink.record(&success_report("192.0.2.1:22", b"show version\nIOS 15.2\n> "))
            .await
            .expect("record success");

        let written = std::fs::read(dir.path().join("result/192.0.2.1_22.txt")).expect("file");
        assert_eq!(written, b"show version\nIOS 15.2\n> ");

        let failures = std::fs::read_to_string(&failed_path).expect("failure log");
        assert!(failures.is_empty());
    }

    #[tokio::test]
    async fn failures_append_one_labelled_line_each() {
        let dir = tempfile::tempdir().expect("tempdir");
        let failed_path = dir.path().join("failed.txt");
        let mut sink = ResultSink::open(dir.path().join("result"), &failed_path)
            .await
            .expect("open sink");

        sink.record(&failure_report(
            "192.0.2.9:22",
            Stage::Connect,
            "connect failed: connection refused",
        ))
        .await
        .expect("record failure");
        sink.record(&failure_report(
            "192.0.2.10:22",
            Stage::Command,
            "command 'show version' failed: timed out after 30s",
        ))
        .await
        .expect("record failure");

        let failures = std::fs::read_to_string(&failed_path).expect("failure log");
        let lines: Vec<&str> = failures.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("192.0.2.9:22: connect failed:"));
        assert!(lines[1].starts_with("192.0.2.10:22: command failed:"));
    }

    #[tokio::test]
    async fn reopening_truncates_the_failure_log() {
        let dir = tempfile::tempdir().expect("tempdir");
        let failed_path = dir.path().join("failed.txt");

        let mut sink = ResultSink::open(dir.path().join("result"), &failed_path)
            .await
            .expect("open sink");
        sink.record(&failure_report("192.0.2.9:22", Stage::Auth, "rejected"))
            .await
            .expect("record failure");
        drop(sink);

        let _sink = ResultSink::open(dir.path().join("result"), &failed_path)
            .await
            .expect("reopen sink");
        let failures = std::fs::read_to_string(&failed_path).expect("failure log");
        assert!(failures.is_empty());
    }
}
