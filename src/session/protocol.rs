use super::*;

/// Runs the full session protocol for one device.
///
/// On success, returns the ordered concatenation of every per-command
/// prompt-delimited read. On failure, returns the [`SessionError`] for the
/// first stage that failed; any partially accumulated output is discarded
/// so a failed device is never mistaken for a complete capture.
///
/// The connection and channel are closed on every exit path, including
/// cancellation.
pub async fn run_device<T: Transport>(
    transport: &T,
    spec: &DeviceSpec,
    settings: &SessionSettings,
    cancel: &CancelToken,
) -> Result<Vec<u8>, SessionError> {
    let mut conn = checked(
        cancel,
        transport.connect(&spec.address, settings.connect_timeout),
    )
    .await
    .map_err(SessionError::Connect)?;

    let result = run_on_connection(&mut conn, spec, settings, cancel).await;
    conn.close().await;
    result
}

async fn run_on_connection<C: Connection>(
    conn: &mut C,
    spec: &DeviceSpec,
    settings: &SessionSettings,
    cancel: &CancelToken,
) -> Result<Vec<u8>, SessionError> {
    checked(cancel, conn.authenticate(&spec.username, &spec.password))
        .await
        .map_err(SessionError::Auth)?;

    let mut shell = checked(cancel, conn.open_shell())
        .await
        .map_err(SessionError::Channel)?;

    let result = run_on_shell(&mut shell, spec, settings, cancel).await;
    shell.close().await;
    result
}

async fn run_on_shell<S: ShellChannel>(
    shell: &mut S,
    spec: &DeviceSpec,
    settings: &SessionSettings,
    cancel: &CancelToken,
) -> Result<Vec<u8>, SessionError> {
    checked(
        cancel,
        shell.setup_terminal(settings.term_width, settings.term_height),
    )
    .await
    .map_err(SessionError::Terminal)?;

    // Drain the login banner up to the first prompt. Without this, the
    // first command's read would stop at the login prompt and every later
    // read would be one response behind. Banner bytes are not device
    // output.
    let mut banner = Vec::new();
    checked(
        cancel,
        read_until_marker(shell, &settings.prompt_marker, spec.read_timeout, &mut banner),
    )
    .await
    .map_err(SessionError::Terminal)?;
    trace!(
        "{} ready, banner: {:?}",
        spec.address,
        String::from_utf8_lossy(&banner)
    );

    let mut output = Vec::new();
    for command in &spec.commands {
        checked(cancel, shell.send_line(command))
            .await
            .map_err(|source| SessionError::Command {
                command: command.clone(),
                source,
            })?;

        checked(
            cancel,
            read_until_marker(shell, &settings.prompt_marker, spec.read_timeout, &mut output),
        )
        .await
        .map_err(|source| SessionError::Command {
            command: command.clone(),
            source,
        })?;

        debug!("{} command '{}' completed", spec.address, command);
    }

    Ok(output)
}

/// Runs one protocol step unless the cancellation signal is raised first.
async fn checked<T>(
    cancel: &CancelToken,
    step: impl Future<Output = Result<T, TransportError>>,
) -> Result<T, TransportError> {
    if cancel.is_cancelled() {
        return Err(TransportError::Cancelled);
    }
    tokio::select! {
        _ = cancel.cancelled() => Err(TransportError::Cancelled),
        result = step => result,
    }
}

/// Reads channel data into `output` until the prompt marker appears.
///
/// The marker may arrive split across read chunks, so each new chunk is
/// scanned together with the tail of the previous one. A read that ends by
/// timeout or channel close without the marker is an error; the caller
/// decides which stage it belongs to.
async fn read_until_marker<S: ShellChannel>(
    shell: &mut S,
    marker: &[u8],
    timeout: Duration,
    output: &mut Vec<u8>,
) -> Result<(), TransportError> {
    let start = output.len();
    let read = async {
        loop {
            let Some(chunk) = shell.recv().await else {
                return Err(TransportError::Disconnected);
            };
            let scan_from = output
                .len()
                .saturating_sub(marker.len().saturating_sub(1))
                .max(start);
            output.extend_from_slice(&chunk);
            if contains_marker(&output[scan_from..], marker) {
                return Ok(());
            }
        }
    };

    match tokio::time::timeout(timeout, read).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(timeout)),
    }
}

fn contains_marker(haystack: &[u8], marker: &[u8]) -> bool {
    !marker.is_empty()
        && haystack.len() >= marker.len()
        && haystack.windows(marker.len()).any(|window| window == marker)
}
