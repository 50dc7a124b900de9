//! Transport capability seam for device sessions.
//!
//! The session protocol never talks to russh directly; it drives the three
//! traits below. Each trait method maps to exactly one protocol stage, so
//! the state machine can attribute a failure to the operation that caused
//! it. Alternative backends (key-based auth, a different remote-shell
//! protocol, the scripted transport used by the test suite) substitute here
//! without touching the dispatcher or the protocol.
//!
//! # Main Components
//!
//! - [`Transport`] - connection factory, one per backend
//! - [`Connection`] - an established transport connection
//! - [`ShellChannel`] - an interactive channel on a connection
//! - [`SshTransport`] - the production russh-backed implementation
//! - [`SecurityLevel`] - SSH algorithm profile selection

use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;

pub use security::SecurityLevel;
pub use ssh::{SshConnection, SshShell, SshTransport};

/// Factory for device connections.
///
/// One transport instance is shared by all dispatcher workers; each call to
/// [`connect`](Transport::connect) yields a connection owned exclusively by
/// a single session.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    type Conn: Connection;

    /// Establishes a transport connection to `address` (`host:port`).
    ///
    /// Must resolve within `timeout`; implementations return
    /// [`TransportError::Timeout`] instead of blocking past the bound.
    async fn connect(&self, address: &str, timeout: Duration) -> Result<Self::Conn, TransportError>;
}

/// An established, not yet authenticated connection.
#[async_trait]
pub trait Connection: Send {
    type Shell: ShellChannel;

    /// Authenticates with a user name and password.
    ///
    /// A clean rejection by the server maps to
    /// [`TransportError::CredentialsRejected`].
    async fn authenticate(&mut self, username: &str, password: &str)
    -> Result<(), TransportError>;

    /// Opens an interactive shell channel.
    async fn open_shell(&mut self) -> Result<Self::Shell, TransportError>;

    /// Closes the connection. Called on every session exit path; must not
    /// fail the session, so errors are swallowed by implementations.
    async fn close(&mut self);
}

/// An interactive channel carrying command input and response output.
#[async_trait]
pub trait ShellChannel: Send {
    /// Requests a terminal of the given geometry and starts the remote
    /// shell.
    async fn setup_terminal(&mut self, width: u32, height: u32) -> Result<(), TransportError>;

    /// Writes one command line, terminator included.
    async fn send_line(&mut self, line: &str) -> Result<(), TransportError>;

    /// Receives the next chunk of response bytes.
    ///
    /// Returns `None` once the peer has closed the channel. Callers bound
    /// this with their own timeout; the method itself may pend
    /// indefinitely.
    async fn recv(&mut self) -> Option<Vec<u8>>;

    /// Closes the channel. Same contract as [`Connection::close`].
    async fn close(&mut self);
}

mod security;
mod ssh;
