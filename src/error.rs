//! Error types for transport operations, session execution, and inventory loading.
//!
//! Every failure during a device session is classified by the protocol stage
//! it occurred in. The stage is what ends up in the failure log, so the
//! mapping from error to [`Stage`] is part of the crate's contract.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Protocol stage a session failure is attributed to.
///
/// Each stage corresponds to one state of the session state machine. A
/// device is reported with exactly one stage, the one whose operation
/// failed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// TCP/SSH transport establishment.
    Connect,
    /// Password authentication.
    Auth,
    /// Interactive channel creation.
    Channel,
    /// Terminal allocation and initial prompt detection.
    Terminal,
    /// Command write or response read during execution.
    Command,
}

impl Stage {
    /// Stable human-readable label used in the failure log.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Connect => "connect",
            Stage::Auth => "auth",
            Stage::Channel => "channel",
            Stage::Terminal => "terminal",
            Stage::Command => "command",
        }
    }
}

/// Errors reported by a transport implementation.
///
/// These are the raw failures a backend can produce. The session protocol
/// wraps them into [`SessionError`] variants to attribute them to a stage.
#[derive(Error, Debug)]
pub enum TransportError {
    /// An I/O error from the underlying socket.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// An error reported by the russh library.
    #[error("ssh error: {0}")]
    Ssh(#[from] russh::Error),

    /// The server rejected the presented credentials.
    #[error("credentials rejected by server")]
    CredentialsRejected,

    /// The operation did not complete within its time bound.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The peer closed the connection or channel.
    ///
    /// This typically happens when the remote device drops the session
    /// while a response read is still in progress.
    #[error("connection closed by peer")]
    Disconnected,

    /// The cancellation signal was raised before the operation completed.
    #[error("cancelled")]
    Cancelled,
}

/// A session failure, classified by protocol stage.
///
/// Exactly one is produced for a failed device; [`SessionError::stage`]
/// yields the [`Stage`] recorded in the failure log.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Transport establishment failed or timed out.
    #[error("connect failed: {0}")]
    Connect(TransportError),

    /// Authentication was rejected or errored.
    #[error("authentication failed: {0}")]
    Auth(TransportError),

    /// The interactive channel could not be created.
    #[error("channel open failed: {0}")]
    Channel(TransportError),

    /// Terminal allocation failed, or the initial prompt never appeared.
    #[error("terminal setup failed: {0}")]
    Terminal(TransportError),

    /// A command write or response read failed during execution.
    #[error("command '{command}' failed: {source}")]
    Command {
        /// The command whose write or read step failed.
        command: String,
        source: TransportError,
    },
}

impl SessionError {
    /// The protocol stage this failure is attributed to.
    pub fn stage(&self) -> Stage {
        match self {
            SessionError::Connect(_) => Stage::Connect,
            SessionError::Auth(_) => Stage::Auth,
            SessionError::Channel(_) => Stage::Channel,
            SessionError::Terminal(_) => Stage::Terminal,
            SessionError::Command { .. } => Stage::Command,
        }
    }
}

/// A device spec that violates a construction invariant.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SpecError {
    /// The address field is empty.
    #[error("device address is empty")]
    EmptyAddress,

    /// The command list is empty after splitting and trimming.
    ///
    /// A device with nothing to run is a configuration error, not a
    /// no-op success.
    #[error("command list is empty")]
    NoCommands,
}

/// Errors produced while loading a device list file.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// The device list file could not be read.
    #[error("cannot read device list {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A row does not carry the minimum number of fields.
    #[error("line {line}: expected at least {expected} fields, found {found}")]
    MissingFields {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A row parsed into an invalid device spec.
    #[error("line {line}: {source}")]
    InvalidSpec { line: usize, source: SpecError },
}
