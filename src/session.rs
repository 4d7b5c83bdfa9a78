//! Device sessions: one authenticated administrative channel per device.
//!
//! The session layer is dialect-agnostic. It runs whatever commands it
//! is handed, in order; everything platform-specific (check syntax,
//! config-mode framing, commit steps) arrives as data from the command
//! catalog.

use std::future::Future;

use log::{debug, warn};

use crate::error::{Result, SessionError};
use crate::inventory::DeviceDescriptor;
use crate::transport::config::{SessionOptions, SshConfig};
use crate::transport::SshTransport;

/// One live authenticated connection to a device.
pub trait Session: Send {
    /// Execute one read-only command and return its normalized output.
    fn run_command(&mut self, command: &str) -> impl Future<Output = Result<String>> + Send;

    /// Apply a batch of configuration commands in order, stopping at the
    /// first command the device rejects.
    fn apply_config(&mut self, commands: &[String]) -> impl Future<Output = Result<()>> + Send;

    /// Close the session. Idempotent and infallible: always safe to call,
    /// even after a prior failure.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Opens sessions for device descriptors.
///
/// The seam the device controller is generic over; production code uses
/// [`SshSessionFactory`], tests substitute recording mocks.
pub trait SessionFactory: Send + Sync {
    type Session: Session;

    /// Open an authenticated session to the described device.
    fn open(
        &self,
        device: &DeviceDescriptor,
    ) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// SSH-backed session over an interactive shell channel.
pub struct SshSession {
    transport: Option<SshTransport>,
    options: SessionOptions,
    peer: String,
}

impl SshSession {
    async fn exec(&mut self, command: &str) -> Result<String> {
        let transport = self
            .transport
            .as_mut()
            .ok_or(SessionError::NotConnected)?;

        transport.send_line(command).await?;
        let data = transport
            .read_until(&self.options.prompt_pattern, self.options.command_timeout)
            .await?;

        let raw = String::from_utf8_lossy(&data);
        Ok(normalize_output(&raw, command))
    }
}

impl Session for SshSession {
    async fn run_command(&mut self, command: &str) -> Result<String> {
        debug!("{}: running '{command}'", self.peer);
        self.exec(command).await
    }

    async fn apply_config(&mut self, commands: &[String]) -> Result<()> {
        for command in commands {
            debug!("{}: applying '{command}'", self.peer);
            let output = self.exec(command).await?;

            if let Some(marker) = self
                .options
                .failure_markers
                .iter()
                .find(|marker| output.contains(marker.as_str()))
            {
                return Err(SessionError::CommandFailed {
                    command: command.clone(),
                    message: marker.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(transport) = self.transport.take() {
            if let Err(e) = transport.close().await {
                warn!("{}: error closing session: {e}", self.peer);
            } else {
                debug!("{}: session closed", self.peer);
            }
        }
    }
}

/// Production session factory connecting over SSH.
#[derive(Debug, Clone, Default)]
pub struct SshSessionFactory {
    options: SessionOptions,
}

impl SshSessionFactory {
    /// Create a factory with the given fleet-wide options.
    pub fn new(options: SessionOptions) -> Self {
        Self { options }
    }
}

impl SessionFactory for SshSessionFactory {
    type Session = SshSession;

    async fn open(&self, device: &DeviceDescriptor) -> Result<SshSession> {
        let config = SshConfig::for_device(device, &self.options);
        let mut transport = SshTransport::connect(&config, self.options.search_depth).await?;

        // Swallow the login banner and motd up to the first prompt. A
        // device that never prints a prompt failed to establish, not
        // mid-session.
        match transport
            .read_until(&self.options.prompt_pattern, self.options.command_timeout)
            .await
        {
            Ok(_) => {}
            Err(e) => {
                let _ = transport.close().await;
                return Err(match e {
                    crate::error::Error::Session(SessionError::PromptTimeout(d)) => {
                        crate::error::TransportError::Timeout(d).into()
                    }
                    e => e,
                });
            }
        }

        Ok(SshSession {
            transport: Some(transport),
            options: self.options.clone(),
            peer: config.socket_addr(),
        })
    }
}

/// Strip the command echo from the front and the trailing prompt line
/// from the back of raw shell output.
pub(crate) fn normalize_output(raw: &str, command: &str) -> String {
    let output = raw
        .strip_prefix(command)
        .unwrap_or(raw)
        .trim_start_matches(['\r', '\n']);

    match output.rfind('\n') {
        Some(pos) => output[..pos].trim_end().to_string(),
        None => String::new(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_echo_and_prompt() {
        let raw = "show running-config | include snmp-server\r\nsnmp-server community public RO\r\nRouter#";
        assert_eq!(
            normalize_output(raw, "show running-config | include snmp-server"),
            "snmp-server community public RO"
        );
    }

    #[test]
    fn test_normalize_empty_output() {
        let raw = "show running-config | include snmp-server\r\nRouter#";
        assert_eq!(
            normalize_output(raw, "show running-config | include snmp-server"),
            ""
        );
    }

    #[test]
    fn test_normalize_without_echo() {
        let raw = "enabled: yes\n[admin@MikroTik] > ";
        assert_eq!(normalize_output(raw, "/snmp print"), "enabled: yes");
    }

    #[test]
    fn test_normalize_multiline_output() {
        let raw = "ps aux | grep snmpd\r\nsnmp  812  snmpd -f\r\nops  991  grep snmpd\r\nops@host:~$ ";
        assert_eq!(
            normalize_output(raw, "ps aux | grep snmpd"),
            "snmp  812  snmpd -f\r\nops  991  grep snmpd"
        );
    }
}
