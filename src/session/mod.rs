//! Per-device session protocol.
//!
//! One session runs the full connect → authenticate → open channel →
//! terminal setup → execute → teardown sequence for a single device. The
//! session exclusively owns its connection and channel and closes both on
//! every exit path. All device interaction goes through the
//! [`transport`](crate::transport) traits, so the protocol itself never
//! depends on a concrete backend.
//!
//! # Main Components
//!
//! - [`run_device`] - drives the state machine for one device spec
//! - [`SessionSettings`] - run-wide tunables (prompt marker, timeouts,
//!   terminal geometry)

use std::future::Future;
use std::time::Duration;

use log::{debug, trace};

use crate::device::DeviceSpec;
use crate::dispatcher::CancelToken;
use crate::error::{SessionError, TransportError};
use crate::transport::{Connection, ShellChannel, Transport};

pub use protocol::run_device;

/// Tunables shared by every session in a run.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Byte sequence that terminates each command response.
    pub prompt_marker: Vec<u8>,

    /// Bound for transport establishment.
    pub connect_timeout: Duration,

    /// Requested terminal width in columns.
    pub term_width: u32,

    /// Requested terminal height in rows.
    pub term_height: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            prompt_marker: b"> ".to_vec(),
            connect_timeout: Duration::from_secs(10),
            term_width: 80,
            term_height: 24,
        }
    }
}

mod protocol;
