//! Device descriptors for fleet runs.
//!
//! A [`DeviceSpec`] is the immutable description of one target device:
//! where to connect, how to authenticate, and which commands to run. Specs
//! are produced by the inventory loader (or constructed directly by library
//! users) and consumed by the dispatcher.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SpecError;

/// Immutable descriptor of one target device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSpec {
    /// `host:port` the transport connects to.
    pub address: String,

    /// Login user name.
    pub username: String,

    /// Login password.
    pub password: String,

    /// Informational device tag (vendor/platform). Not interpreted by the
    /// protocol; it only appears in logs.
    pub device_type: String,

    /// Optional elevation credential. Carried for inventory fidelity but
    /// unused by the minimal protocol.
    pub secret: Option<String>,

    /// Time bound for each response read.
    pub read_timeout: Duration,

    /// Commands executed in order. Never empty.
    pub commands: Vec<String>,
}

impl DeviceSpec {
    /// Read timeout applied when the inventory row leaves it unset or
    /// carries an invalid value.
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a validated device spec.
    ///
    /// `read_timeout` of `None` falls back to
    /// [`DEFAULT_READ_TIMEOUT`](Self::DEFAULT_READ_TIMEOUT). An empty
    /// `commands` list is rejected: a device with nothing to run is a
    /// configuration error.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        device_type: impl Into<String>,
        secret: Option<String>,
        read_timeout: Option<Duration>,
        commands: Vec<String>,
    ) -> Result<DeviceSpec, SpecError> {
        let address = address.into();
        if address.trim().is_empty() {
            return Err(SpecError::EmptyAddress);
        }
        if commands.is_empty() {
            return Err(SpecError::NoCommands);
        }

        Ok(DeviceSpec {
            address,
            username: username.into(),
            password: password.into(),
            device_type: device_type.into(),
            secret,
            read_timeout: read_timeout.unwrap_or(Self::DEFAULT_READ_TIMEOUT),
            commands,
        })
    }
}
