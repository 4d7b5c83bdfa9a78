//! SSH transport implementation using russh.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::debug;
use regex::bytes::Regex;
use russh::client::{self, Handle, Msg};
use russh::keys::PublicKey;
use russh::{Channel, ChannelMsg, Disconnect, Preferred};
use secrecy::ExposeSecret;

use super::config::SshConfig;
use crate::error::{Result, SessionError, TransportError};

/// PTY dimensions requested for the shell channel. Wide enough that
/// device CLIs do not wrap or page the check output.
const TERMINAL_WIDTH: u32 = 511;
const TERMINAL_HEIGHT: u32 = 24;

/// Buffer accumulating channel output, searched tail-first for prompts.
///
/// Only the last `search_depth` bytes are scanned, so large check
/// outputs (full running configs) stay cheap to poll.
#[derive(Debug)]
pub struct PromptBuffer {
    buffer: Vec<u8>,
    search_depth: usize,
}

impl PromptBuffer {
    /// Create a buffer that searches the last `search_depth` bytes.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            search_depth,
        }
    }

    /// Append channel data.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Check whether the pattern matches within the buffer tail.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        pattern.is_match(&self.buffer[start..])
    }

    /// Take ownership of the contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for PromptBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// SSH transport wrapping russh: one authenticated connection with one
/// interactive shell channel.
pub struct SshTransport {
    session: Handle<ClientHandler>,
    channel: Channel<Msg>,
    buffer: PromptBuffer,
}

impl SshTransport {
    /// Connect, authenticate by password, and open a PTY shell channel.
    pub async fn connect(config: &SshConfig, search_depth: usize) -> Result<Self> {
        let mut preferred = Preferred::default();
        if config.legacy_kex {
            let mut kex = preferred.kex.to_vec();
            kex.push(russh::kex::DH_G1_SHA1);
            preferred.kex = kex.into();
        }

        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: Some(config.connect_timeout),
            preferred,
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = ClientHandler {
            host: config.host.clone(),
            port: config.port,
            verify_host_key: config.verify_host_key,
            host_key_error: host_key_error.clone(),
        };

        let mut session = tokio::time::timeout(
            config.connect_timeout,
            client::connect(ssh_config, (config.host.as_str(), config.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.connect_timeout))?
        .map_err(|e| {
            // If check_server_key stored a detailed error, surface that
            // instead of the generic russh::Error::UnknownKey.
            if let Some(hk_err) = host_key_error.lock().unwrap().take() {
                return hk_err;
            }
            match e {
                russh::Error::IO(source) => TransportError::ConnectionFailed {
                    host: config.host.clone(),
                    port: config.port,
                    source,
                },
                e => TransportError::Ssh(e),
            }
        })?;

        Self::authenticate(&mut session, config).await?;
        debug!("authenticated to {}", config.socket_addr());

        let channel = session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;
        channel
            .request_pty(true, "xterm", TERMINAL_WIDTH, TERMINAL_HEIGHT, 0, 0, &[])
            .await
            .map_err(TransportError::Ssh)?;
        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        Ok(Self {
            session,
            channel,
            buffer: PromptBuffer::new(search_depth),
        })
    }

    async fn authenticate(session: &mut Handle<ClientHandler>, config: &SshConfig) -> Result<()> {
        let success = session
            .authenticate_password(&config.username, config.password.expose_secret())
            .await
            .map_err(TransportError::Ssh)?
            .success();

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            }
            .into());
        }

        Ok(())
    }

    /// Send one line to the shell.
    pub async fn send_line(&self, line: &str) -> Result<()> {
        let data = format!("{line}\n");
        self.channel
            .data(data.as_bytes())
            .await
            .map_err(SessionError::Ssh)?;
        Ok(())
    }

    /// Read channel output until `pattern` matches the buffer tail,
    /// then drain and return everything accumulated.
    pub async fn read_until(&mut self, pattern: &Regex, timeout: Duration) -> Result<Vec<u8>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.buffer.tail_contains(pattern) {
                return Ok(self.buffer.take());
            }

            let msg = tokio::time::timeout_at(deadline, self.channel.wait())
                .await
                .map_err(|_| SessionError::PromptTimeout(timeout))?;

            match msg {
                Some(ChannelMsg::Data { data }) => self.buffer.extend(&data),
                Some(ChannelMsg::ExtendedData { data, .. }) => self.buffer.extend(&data),
                Some(ChannelMsg::Eof | ChannelMsg::Close) | None => {
                    return Err(SessionError::Closed.into());
                }
                Some(_) => {}
            }
        }
    }

    /// Close the connection.
    pub async fn close(self) -> Result<()> {
        self.session
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// SSH client handler for russh.
struct ClientHandler {
    host: String,
    port: u16,
    verify_host_key: bool,
    /// Stores a detailed host-key error so connect() can surface it.
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        if !self.verify_host_key {
            return Ok(true);
        }

        match russh::keys::check_known_hosts(&self.host, self.port, server_public_key) {
            Ok(true) => Ok(true),
            // Unknown or changed key: reject with a usable error.
            Ok(false) | Err(_) => {
                *self.host_key_error.lock().unwrap() = Some(TransportError::HostKeyRejected {
                    host: self.host.clone(),
                    port: self.port,
                });
                Ok(false)
            }
        }
    }
}
