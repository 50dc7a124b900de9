//! Device list loading.
//!
//! The inventory is a UTF-8 text file with one device per row, fields
//! comma-separated in order: address, username, password, device type,
//! secret, commands (separated by `;` within the field), and an optional
//! read timeout in seconds. Blank lines, `#` comments, and a leading header
//! row are skipped.
//!
//! Loading is a configuration-time operation: any unreadable file or
//! malformed row fails the whole load. Per-device runtime failures are
//! never reported here.

use std::path::Path;
use std::time::Duration;

use log::debug;

use crate::device::DeviceSpec;
use crate::error::InventoryError;

/// Minimum number of fields a device row must carry.
///
/// The trailing read-timeout field is optional.
const MIN_FIELDS: usize = 6;

/// Loads and parses a device list file.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<DeviceSpec>, InventoryError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| InventoryError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let devices = parse(&text)?;
    debug!("loaded {} device(s) from {}", devices.len(), path.display());
    Ok(devices)
}

/// Parses device rows from inventory text.
pub fn parse(text: &str) -> Result<Vec<DeviceSpec>, InventoryError> {
    let mut devices = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if devices.is_empty() && is_header_row(trimmed) {
            continue;
        }
        devices.push(parse_row(trimmed, line_no)?);
    }

    Ok(devices)
}

/// Recognizes a leading header row exported by spreadsheet tools.
fn is_header_row(line: &str) -> bool {
    let first = line.split(',').next().unwrap_or("").trim();
    first.eq_ignore_ascii_case("address") || first.eq_ignore_ascii_case("host")
}

fn parse_row(line: &str, line_no: usize) -> Result<DeviceSpec, InventoryError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < MIN_FIELDS {
        return Err(InventoryError::MissingFields {
            line: line_no,
            expected: MIN_FIELDS,
            found: fields.len(),
        });
    }

    let secret = match fields[4] {
        "" => None,
        value => Some(value.to_string()),
    };

    let commands: Vec<String> = fields[5]
        .split(';')
        .map(str::trim)
        .filter(|cmd| !cmd.is_empty())
        .map(str::to_string)
        .collect();

    let read_timeout = fields.get(6).and_then(|field| parse_read_timeout(field));

    DeviceSpec::new(
        fields[0],
        fields[1],
        fields[2],
        fields[3],
        secret,
        read_timeout,
        commands,
    )
    .map_err(|source| InventoryError::InvalidSpec {
        line: line_no,
        source,
    })
}

/// Parses the optional read-timeout field.
///
/// Non-numeric values and zero are invalid and fall back to the default.
fn parse_read_timeout(field: &str) -> Option<Duration> {
    match field.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpecError;

    #[test]
    fn row_parses_all_fields_in_order() {
        let devices = parse(
            "192.0.2.1:22,admin,secret,cisco_ios,enable-pw,show version;show clock,15\n",
        )
        .expect("valid row");

        assert_eq!(devices.len(), 1);
        let spec = &devices[0];
        assert_eq!(spec.address, "192.0.2.1:22");
        assert_eq!(spec.username, "admin");
        assert_eq!(spec.password, "secret");
        assert_eq!(spec.device_type, "cisco_ios");
        assert_eq!(spec.secret.as_deref(), Some("enable-pw"));
        assert_eq!(spec.read_timeout, Duration::from_secs(15));
        assert_eq!(
            spec.commands,
            vec!["show version".to_string(), "show clock".to_string()]
        );
    }

    #[test]
    fn missing_timeout_field_uses_default() {
        let devices =
            parse("192.0.2.1:22,admin,secret,cisco_ios,,show version\n").expect("valid row");
        assert_eq!(devices[0].read_timeout, DeviceSpec::DEFAULT_READ_TIMEOUT);
    }

    #[test]
    fn invalid_timeout_field_uses_default() {
        for invalid in ["abc", "-5", "0", "3.5"] {
            let text = format!("192.0.2.1:22,admin,secret,cisco_ios,,show version,{invalid}\n");
            let devices = parse(&text).expect("valid row");
            assert_eq!(
                devices[0].read_timeout,
                DeviceSpec::DEFAULT_READ_TIMEOUT,
                "timeout field {invalid:?} should fall back to the default"
            );
        }
    }

    #[test]
    fn empty_secret_field_maps_to_none() {
        let devices =
            parse("192.0.2.1:22,admin,secret,cisco_ios,,show version\n").expect("valid row");
        assert!(devices[0].secret.is_none());
    }

    #[test]
    fn blank_lines_comments_and_header_are_skipped() {
        let text = "\
address,username,password,device_type,secret,commands,read_timeout

# campus switches
192.0.2.1:22,admin,secret,cisco_ios,,show version
192.0.2.2:22,admin,secret,cisco_ios,,show version
";
        let devices = parse(text).expect("valid inventory");
        assert_eq!(devices.len(), 2);
    }

    #[test]
    fn row_with_too_few_fields_fails_with_line_number() {
        let err = parse("192.0.2.1:22,admin,secret\n").expect_err("short row");
        match err {
            InventoryError::MissingFields { line, found, .. } => {
                assert_eq!(line, 1);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn row_with_empty_command_field_fails() {
        let err = parse("192.0.2.1:22,admin,secret,cisco_ios,, ; ;\n").expect_err("no commands");
        match err {
            InventoryError::InvalidSpec { line, source } => {
                assert_eq!(line, 1);
                assert_eq!(source, SpecError::NoCommands);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load("/nonexistent/devices.csv").expect_err("missing file");
        assert!(matches!(err, InventoryError::Read { .. }));
    }
}
