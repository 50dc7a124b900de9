//! # rfleet - Concurrent SSH Command Runner for Network Device Fleets
//!
//! `rfleet` runs an ordered list of shell commands against a fleet of
//! network devices over SSH, collecting per-device output and recording
//! devices that fail. A fixed-size worker pool bounds the number of
//! concurrent sessions; each session drives one device through the
//! connect → authenticate → open channel → terminal setup → execute
//! sequence and classifies any failure by the stage it occurred in.
//!
//! ## Features
//!
//! - **Bounded Concurrency**: a pull-based worker pool caps concurrent
//!   sessions independently of fleet size
//! - **Stage-Classified Failures**: every failed device is attributed to
//!   one protocol stage (connect, auth, channel, terminal, command)
//! - **Pluggable Transport**: sessions drive a transport trait, so
//!   alternative backends substitute without touching the dispatcher
//! - **Cooperative Cancellation**: one signal stops new dispatch and
//!   unwinds in-flight sessions through their normal teardown
//! - **Maximum Compatibility**: selectable SSH algorithm profiles down to
//!   legacy-only gear
//! - **Async/Await**: built on Tokio
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rfleet::device::DeviceSpec;
//! use rfleet::dispatcher::{CancelToken, Dispatcher, Outcome};
//! use rfleet::session::SessionSettings;
//! use rfleet::transport::{SecurityLevel, SshTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let device = DeviceSpec::new(
//!         "192.168.1.1:22",
//!         "admin",
//!         "password",
//!         "cisco_ios",
//!         None,
//!         None,
//!         vec!["show version".to_string()],
//!     )?;
//!
//!     let transport = SshTransport::new(SecurityLevel::LegacyCompatible);
//!     let dispatcher = Dispatcher::new(transport, SessionSettings::default(), 4);
//!
//!     let mut reports = dispatcher.run(vec![device], CancelToken::new());
//!     while let Some(report) = reports.recv().await {
//!         match report.outcome {
//!             Outcome::Output(bytes) => {
//!                 println!("{}: {} bytes collected", report.address, bytes.len());
//!             }
//!             Outcome::Failed { stage, reason } => {
//!                 println!("{}: failed at {}: {}", report.address, stage.label(), reason);
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Main Components
//!
//! - [`dispatcher::Dispatcher`] - bounded worker pool over a device work source
//! - [`session`] - the per-device session protocol
//! - [`transport`] - transport capability traits and the russh backend
//! - [`inventory`] - device list file loading
//! - [`sink::ResultSink`] - output files and the failure log

pub mod config;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod inventory;
pub mod session;
pub mod sink;
pub mod transport;
