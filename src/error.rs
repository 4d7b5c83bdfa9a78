//! Error types for snmpsweep.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for snmpsweep operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors (session establishment)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Mid-session command errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Inventory loading errors
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),
}

/// Transport layer errors (SSH connection, authentication).
///
/// These can only occur while a session is being established; the
/// device controller folds them into per-device outcomes.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Host key was rejected by known_hosts verification
    #[error("Host key for {host}:{port} rejected")]
    HostKeyRejected { host: String, port: u16 },

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors on an already-established session (command execution).
#[derive(Error, Debug)]
pub enum SessionError {
    /// Session is not open
    #[error("Session not open")]
    NotConnected,

    /// Channel closed while waiting for output
    #[error("Channel closed")]
    Closed,

    /// Prompt not seen within the command timeout
    #[error("Prompt not found within {0:?}")]
    PromptTimeout(Duration),

    /// A configuration command produced an error on the device
    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),

    /// Invalid prompt pattern
    #[error("Invalid prompt pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Errors while building the device inventory.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// Device declares a platform token the catalog vocabulary does not know
    #[error("Unknown platform kind '{token}' for device {address}")]
    UnknownPlatform { token: String, address: String },

    /// A required environment variable is missing
    #[error("Missing variable {variable}")]
    MissingVariable { variable: String },

    /// A variable is present but unparseable
    #[error("Invalid value '{value}' for {variable}")]
    InvalidValue { variable: String, value: String },
}

/// Result type alias using snmpsweep's Error.
pub type Result<T> = std::result::Result<T, Error>;
