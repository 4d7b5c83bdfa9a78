//! SSH connection and session tuning.

use std::time::Duration;

use regex::bytes::Regex;
use secrecy::SecretString;

use crate::inventory::DeviceDescriptor;

/// Prompt pattern covering the built-in dialects: IOS `#`/`>`, Junos
/// `>`/`%`, RouterOS `] > `, Linux `$`/`#`.
pub const DEFAULT_PROMPT_PATTERN: &str = r"[>#$%]\s*$";

/// Fleet-wide session tuning, shared by every device in a run.
///
/// Dialect knowledge stays in the command catalog; these options only
/// cover the transport: how long to wait, what a prompt looks like, and
/// which output fragments mean a configuration command was rejected.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Timeout for TCP connect + SSH handshake + banner.
    pub connect_timeout: Duration,

    /// Timeout for a single command to produce its next prompt.
    pub command_timeout: Duration,

    /// Pattern that matches an interactive prompt at the end of output.
    pub prompt_pattern: Regex,

    /// Output fragments that mark a rejected configuration command.
    pub failure_markers: Vec<String>,

    /// How many bytes from the buffer tail to search for the prompt.
    pub search_depth: usize,

    /// Offer diffie-hellman-group1-sha1 for old device firmware.
    pub legacy_kex: bool,

    /// Verify host keys against known_hosts. Off by default: lab fleets
    /// are typically provisioned before their keys are recorded.
    pub verify_host_key: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            command_timeout: Duration::from_secs(30),
            prompt_pattern: Regex::new(DEFAULT_PROMPT_PATTERN).unwrap(),
            failure_markers: [
                "Invalid input",
                "syntax error",
                "bad command",
                "unknown command",
                "command not found",
                "Permission denied",
            ]
            .map(String::from)
            .to_vec(),
            search_depth: 1000,
            legacy_kex: false,
            verify_host_key: false,
        }
    }
}

impl SessionOptions {
    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-command timeout.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Override the prompt pattern.
    pub fn with_prompt_pattern(mut self, pattern: Regex) -> Self {
        self.prompt_pattern = pattern;
        self
    }

    /// Add a failure marker.
    pub fn with_failure_marker(mut self, marker: impl Into<String>) -> Self {
        self.failure_markers.push(marker.into());
        self
    }

    /// Enable legacy key exchange.
    pub fn with_legacy_kex(mut self, enabled: bool) -> Self {
        self.legacy_kex = enabled;
        self
    }

    /// Enable strict host key verification against known_hosts.
    pub fn with_host_key_verification(mut self, enabled: bool) -> Self {
        self.verify_host_key = enabled;
        self
    }
}

/// Per-device SSH connection parameters.
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port.
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Password for authentication.
    pub password: SecretString,

    /// Timeout for connect + handshake.
    pub connect_timeout: Duration,

    /// Offer diffie-hellman-group1-sha1.
    pub legacy_kex: bool,

    /// Verify host keys against known_hosts.
    pub verify_host_key: bool,
}

impl SshConfig {
    /// Build the connection parameters for one device.
    pub fn for_device(device: &DeviceDescriptor, options: &SessionOptions) -> Self {
        Self {
            host: device.address.clone(),
            port: device.port,
            username: device.username.clone(),
            password: device.secret.clone(),
            connect_timeout: options.connect_timeout,
            legacy_kex: options.legacy_kex,
            verify_host_key: options.verify_host_key,
        }
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PlatformKind;

    #[test]
    fn test_default_prompt_matches_builtin_dialects() {
        let options = SessionOptions::default();
        let pattern = &options.prompt_pattern;
        assert!(pattern.is_match(b"Router#"));
        assert!(pattern.is_match(b"Router(config)#"));
        assert!(pattern.is_match(b"user@mx960> "));
        assert!(pattern.is_match(b"[admin@MikroTik] > "));
        assert!(pattern.is_match(b"ops@host:~$ "));
        assert!(pattern.is_match(b"% "));
        assert!(!pattern.is_match(b"loading configuration..."));
    }

    #[test]
    fn test_for_device_carries_descriptor_fields() {
        let device = DeviceDescriptor::new("10.0.0.1", PlatformKind::CiscoIos, "admin", "pw")
            .with_port(2022);
        let config = SshConfig::for_device(&device, &SessionOptions::default());
        assert_eq!(config.socket_addr(), "10.0.0.1:2022");
        assert_eq!(config.username, "admin");
        assert!(!config.legacy_kex);
    }
}
