//! Device inventory: connection descriptors for the managed fleet.
//!
//! The inventory is an immutable value built once at process start and
//! passed by reference into the fleet runner. The environment-variable
//! loader keeps the legacy `ROUTER{n}_*` naming.

use secrecy::SecretString;

use crate::catalog::PlatformKind;
use crate::error::{InventoryError, Result};

/// Connection descriptor for one managed device.
///
/// Immutable once constructed; the secret is wrapped so `Debug` output
/// never leaks it.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    /// Hostname or IP address.
    pub address: String,

    /// SSH port (default: 22).
    pub port: u16,

    /// Command dialect the device speaks.
    pub platform: PlatformKind,

    /// Username for authentication.
    pub username: String,

    /// Password for authentication.
    pub secret: SecretString,
}

impl DeviceDescriptor {
    /// Create a descriptor with the default SSH port.
    pub fn new(
        address: impl Into<String>,
        platform: PlatformKind,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            port: 22,
            platform,
            username: username.into(),
            secret: SecretString::from(secret.into()),
        }
    }

    /// Override the SSH port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// Ordered, immutable collection of device descriptors.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    devices: Vec<DeviceDescriptor>,
}

impl Inventory {
    /// Wrap an explicit descriptor list.
    pub fn new(devices: Vec<DeviceDescriptor>) -> Self {
        Self { devices }
    }

    /// Load the inventory from process environment variables.
    ///
    /// Reads `ROUTER{n}_IP`, `ROUTER{n}_MODEL`, `ROUTER{n}_USER` and
    /// `ROUTER{n}_PASS` for n = 1.. until the first missing `_IP`.
    /// `ROUTER{n}_PORT` is optional.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the inventory through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |variable: String| {
            lookup(&variable).ok_or(InventoryError::MissingVariable { variable })
        };

        let mut devices = Vec::new();
        for n in 1.. {
            let Some(address) = lookup(&format!("ROUTER{n}_IP")) else {
                break;
            };

            let token = require(format!("ROUTER{n}_MODEL"))?;
            let platform =
                token
                    .parse::<PlatformKind>()
                    .map_err(|_| InventoryError::UnknownPlatform {
                        token: token.clone(),
                        address: address.clone(),
                    })?;
            let username = require(format!("ROUTER{n}_USER"))?;
            let secret = require(format!("ROUTER{n}_PASS"))?;

            let mut device = DeviceDescriptor::new(address, platform, username, secret);
            if let Some(port) = lookup(&format!("ROUTER{n}_PORT")) {
                let parsed = port.parse().map_err(|_| InventoryError::InvalidValue {
                    variable: format!("ROUTER{n}_PORT"),
                    value: port.clone(),
                })?;
                device = device.with_port(parsed);
            }
            devices.push(device);
        }

        Ok(Self::new(devices))
    }

    /// The descriptors, in declaration order.
    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    /// Number of devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Check whether the inventory is empty.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;
    use crate::error::Error;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_lookup_reads_indexed_devices() {
        let env = vars(&[
            ("ROUTER1_IP", "10.0.0.1"),
            ("ROUTER1_MODEL", "cisco_ios"),
            ("ROUTER1_USER", "admin"),
            ("ROUTER1_PASS", "hunter2"),
            ("ROUTER2_IP", "10.0.0.2"),
            ("ROUTER2_MODEL", "mikrotik_routeros"),
            ("ROUTER2_USER", "admin"),
            ("ROUTER2_PASS", "hunter2"),
            ("ROUTER2_PORT", "2222"),
        ]);

        let inventory = Inventory::from_lookup(|name| env.get(name).cloned()).unwrap();
        assert_eq!(inventory.len(), 2);

        let first = &inventory.devices()[0];
        assert_eq!(first.address, "10.0.0.1");
        assert_eq!(first.platform, PlatformKind::CiscoIos);
        assert_eq!(first.port, 22);
        assert_eq!(first.secret.expose_secret(), "hunter2");

        let second = &inventory.devices()[1];
        assert_eq!(second.platform, PlatformKind::MikrotikRouterOs);
        assert_eq!(second.port, 2222);
    }

    #[test]
    fn test_from_lookup_stops_at_first_gap() {
        // ROUTER3 exists but ROUTER2 does not; the sweep stops at the gap.
        let env = vars(&[
            ("ROUTER1_IP", "10.0.0.1"),
            ("ROUTER1_MODEL", "linux"),
            ("ROUTER1_USER", "ops"),
            ("ROUTER1_PASS", "pw"),
            ("ROUTER3_IP", "10.0.0.3"),
        ]);

        let inventory = Inventory::from_lookup(|name| env.get(name).cloned()).unwrap();
        assert_eq!(inventory.len(), 1);
    }

    #[test]
    fn test_missing_credential_is_an_error() {
        let env = vars(&[("ROUTER1_IP", "10.0.0.1"), ("ROUTER1_MODEL", "linux")]);
        let err = Inventory::from_lookup(|name| env.get(name).cloned()).unwrap_err();
        assert!(matches!(
            err,
            Error::Inventory(InventoryError::MissingVariable { ref variable })
                if variable == "ROUTER1_USER"
        ));
    }

    #[test]
    fn test_unknown_platform_token_is_an_error() {
        let env = vars(&[
            ("ROUTER1_IP", "10.0.0.1"),
            ("ROUTER1_MODEL", "cisco_nxos"),
            ("ROUTER1_USER", "admin"),
            ("ROUTER1_PASS", "pw"),
        ]);
        let err = Inventory::from_lookup(|name| env.get(name).cloned()).unwrap_err();
        assert!(matches!(
            err,
            Error::Inventory(InventoryError::UnknownPlatform { ref token, .. })
                if token == "cisco_nxos"
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let device = DeviceDescriptor::new("10.0.0.1", PlatformKind::Linux, "ops", "hunter2");
        let rendered = format!("{device:?}");
        assert!(!rendered.contains("hunter2"));
    }
}
