//! SSH transport layer wrapping russh.
//!
//! This module provides the low-level SSH connection management:
//! connection setup, authentication, the PTY shell channel, and
//! prompt-driven reads.

pub mod config;
mod ssh;

pub use config::{SessionOptions, SshConfig};
pub use ssh::{PromptBuffer, SshTransport};
