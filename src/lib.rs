//! # snmpsweep
//!
//! Async SSH-based SNMP audit and remediation for small, heterogeneous
//! network device fleets (routers, switches, Linux hosts).
//!
//! For every device in an inventory, snmpsweep opens an authenticated
//! SSH session, runs the platform's SNMP check command, and applies the
//! platform's enable sequence if SNMP is not already active. Dialects
//! are data: the [`catalog::CommandCatalog`] carries the check command,
//! the enable sequence (including config-mode framing), and the
//! is-enabled probe per [`catalog::PlatformKind`]. Sessions stay
//! dialect-agnostic; the controller never branches on vendor.
//!
//! Devices are processed strictly sequentially, and one device's
//! failure never stops the sweep: every establishment or command error
//! is folded into a per-device [`controller::Outcome`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snmpsweep::{
//!     CommandCatalog, DeviceDescriptor, FleetRunner, LogReporter, PlatformKind,
//!     SessionOptions,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let inventory = vec![
//!         DeviceDescriptor::new("10.0.0.1", PlatformKind::CiscoIos, "admin", "secret"),
//!         DeviceDescriptor::new("10.0.0.2", PlatformKind::MikrotikRouterOs, "admin", "secret"),
//!     ];
//!
//!     let runner = FleetRunner::new(
//!         CommandCatalog::builtin("public"),
//!         SessionOptions::default(),
//!     );
//!     let report = runner.run(&inventory, &mut LogReporter).await;
//!     std::process::exit(report.exit_code().into());
//! }
//! ```

pub mod catalog;
pub mod controller;
pub mod error;
pub mod inventory;
pub mod runner;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use catalog::{CatalogEntry, CommandCatalog, EnabledProbe, PlatformKind};
pub use controller::{DeviceController, Outcome};
pub use error::{Error, InventoryError, Result, SessionError, TransportError};
pub use inventory::{DeviceDescriptor, Inventory};
pub use runner::{DeviceReport, FleetReport, FleetRunner, LogReporter, Reporter};
pub use session::{Session, SessionFactory, SshSession, SshSessionFactory};
pub use transport::{SessionOptions, SshConfig, SshTransport};
