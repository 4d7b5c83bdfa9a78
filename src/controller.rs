//! Per-device orchestration: open, verify, remediate, close.

use std::fmt;

use log::{debug, info, warn};

use crate::catalog::CommandCatalog;
use crate::error::{Error, TransportError};
use crate::inventory::DeviceDescriptor;
use crate::session::{Session, SessionFactory};

/// Result of auditing one device. Every establishment or mid-session
/// error is folded into a variant here; processing a device never
/// returns an `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// SNMP was already active; nothing applied.
    AlreadyEnabled,

    /// SNMP was inactive and the enable sequence was applied.
    Enabled,

    /// The platform kind has no catalog entry.
    Unsupported,

    /// The device rejected the credentials.
    AuthFailed,

    /// The device was unreachable or the transport failed.
    ConnectFailed,

    /// A command failed mid-session.
    Failed(String),
}

impl Outcome {
    /// True for the two outcomes that leave SNMP enabled.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::AlreadyEnabled | Self::Enabled)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyEnabled => f.write_str("SNMP already enabled"),
            Self::Enabled => f.write_str("SNMP enabled"),
            Self::Unsupported => f.write_str("platform not supported by the command catalog"),
            Self::AuthFailed => f.write_str("authentication failed"),
            Self::ConnectFailed => f.write_str("connection failed"),
            Self::Failed(detail) => write!(f, "error: {detail}"),
        }
    }
}

/// Orchestrates one device's lifecycle: open session, verify SNMP,
/// remediate if needed, close.
pub struct DeviceController<F> {
    catalog: CommandCatalog,
    sessions: F,
}

impl<F: SessionFactory> DeviceController<F> {
    /// Create a controller over a catalog and a session factory.
    pub fn new(catalog: CommandCatalog, sessions: F) -> Self {
        Self { catalog, sessions }
    }

    /// The catalog this controller dispatches on.
    pub fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }

    /// Audit one device and remediate if SNMP is inactive.
    ///
    /// When a session was opened it is closed exactly once, on every
    /// path, including command failures.
    pub async fn process(&self, device: &DeviceDescriptor) -> Outcome {
        debug!("connecting to {} ({})", device.address, device.platform);

        let mut session = match self.sessions.open(device).await {
            Ok(session) => session,
            Err(Error::Transport(TransportError::AuthenticationFailed { .. })) => {
                warn!("{}: authentication failed", device.address);
                return Outcome::AuthFailed;
            }
            Err(Error::Transport(e)) => {
                warn!("{}: {e}", device.address);
                return Outcome::ConnectFailed;
            }
            Err(e) => {
                warn!("{}: {e}", device.address);
                return Outcome::Failed(e.to_string());
            }
        };

        let outcome = self.audit(&mut session, device).await;
        session.close().await;
        outcome
    }

    async fn audit(&self, session: &mut F::Session, device: &DeviceDescriptor) -> Outcome {
        let Some(entry) = self.catalog.lookup(device.platform) else {
            warn!(
                "{}: no catalog entry for platform {}",
                device.address, device.platform
            );
            return Outcome::Unsupported;
        };

        let output = match session.run_command(&entry.check_command).await {
            Ok(output) => output,
            Err(e) => return Outcome::Failed(e.to_string()),
        };

        if entry.enabled_probe.matches(&output) {
            debug!("{}: SNMP already active", device.address);
            return Outcome::AlreadyEnabled;
        }

        // Check and enable entries are registered together, but an entry
        // with no enable sequence must still resolve, not panic.
        let Some(commands) = self.catalog.lookup_enable(device.platform) else {
            warn!(
                "{}: no enable sequence for platform {}",
                device.address, device.platform
            );
            return Outcome::Unsupported;
        };

        info!("{}: SNMP inactive, applying enable sequence", device.address);
        match session.apply_config(commands).await {
            Ok(()) => Outcome::Enabled,
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PlatformKind;
    use crate::session::mock::{Event, MockFactory, Plan};

    fn ios_device(address: &str) -> DeviceDescriptor {
        DeviceDescriptor::new(address, PlatformKind::CiscoIos, "admin", "secret")
    }

    fn controller(factory: MockFactory) -> DeviceController<MockFactory> {
        DeviceController::new(CommandCatalog::builtin("public"), factory)
    }

    #[tokio::test]
    async fn test_community_in_output_means_already_enabled() {
        let factory = MockFactory::new().with_plan(
            "10.0.0.1",
            Plan::Respond {
                check_output: "snmp-server community public RO".to_string(),
            },
        );
        let controller = controller(factory);

        let outcome = controller.process(&ios_device("10.0.0.1")).await;
        assert_eq!(outcome, Outcome::AlreadyEnabled);

        // Check ran, nothing was applied, and the session closed once.
        let events = controller.sessions.events();
        assert_eq!(
            events,
            vec![
                Event::Open("10.0.0.1".to_string()),
                Event::RunCommand(
                    "10.0.0.1".to_string(),
                    "show running-config | include snmp-server".to_string()
                ),
                Event::Close("10.0.0.1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_check_output_triggers_remediation() {
        let factory = MockFactory::new().with_plan(
            "10.0.0.1",
            Plan::Respond {
                check_output: String::new(),
            },
        );
        let controller = controller(factory);

        let outcome = controller.process(&ios_device("10.0.0.1")).await;
        assert_eq!(outcome, Outcome::Enabled);

        let events = controller.sessions.events();
        assert_eq!(
            events[2],
            Event::ApplyConfig(
                "10.0.0.1".to_string(),
                vec![
                    "conf t".to_string(),
                    "snmp-server community public RO".to_string(),
                    "end".to_string(),
                ]
            )
        );
        assert_eq!(controller.sessions.close_count("10.0.0.1"), 1);
    }

    #[tokio::test]
    async fn test_routeros_probe_checks_enabled_state() {
        let device =
            DeviceDescriptor::new("10.0.0.9", PlatformKind::MikrotikRouterOs, "admin", "pw");
        let factory = MockFactory::new().with_plan(
            "10.0.0.9",
            Plan::Respond {
                check_output: "      enabled: no\n    contact: noc".to_string(),
            },
        );
        let controller = controller(factory);

        assert_eq!(controller.process(&device).await, Outcome::Enabled);

        let events = controller.sessions.events();
        assert_eq!(
            events[2],
            Event::ApplyConfig(
                "10.0.0.9".to_string(),
                vec![
                    "/snmp set enabled=yes".to_string(),
                    "/snmp community set 0 name=public".to_string(),
                ]
            )
        );
    }

    #[tokio::test]
    async fn test_unregistered_platform_is_unsupported() {
        let device = DeviceDescriptor::new("10.0.0.2", PlatformKind::Windows, "admin", "pw");
        let controller = controller(MockFactory::new());

        assert_eq!(controller.process(&device).await, Outcome::Unsupported);

        // Open and close only, no commands.
        let events = controller.sessions.events();
        assert_eq!(
            events,
            vec![
                Event::Open("10.0.0.2".to_string()),
                Event::Close("10.0.0.2".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_auth_failure_maps_to_outcome() {
        let factory = MockFactory::new().with_plan("10.0.0.3", Plan::AuthFail);
        let controller = controller(factory);

        assert_eq!(
            controller.process(&ios_device("10.0.0.3")).await,
            Outcome::AuthFailed
        );
        // No session was opened, so there is nothing to close.
        assert!(controller.sessions.events().is_empty());
    }

    #[tokio::test]
    async fn test_connect_failure_maps_to_outcome() {
        let factory = MockFactory::new().with_plan("10.0.0.4", Plan::ConnectFail);
        let controller = controller(factory);

        assert_eq!(
            controller.process(&ios_device("10.0.0.4")).await,
            Outcome::ConnectFailed
        );
    }

    #[tokio::test]
    async fn test_check_failure_still_closes_session() {
        let factory = MockFactory::new().with_plan("10.0.0.5", Plan::FailCheck);
        let controller = controller(factory);

        let outcome = controller.process(&ios_device("10.0.0.5")).await;
        assert!(matches!(outcome, Outcome::Failed(_)));
        assert_eq!(controller.sessions.close_count("10.0.0.5"), 1);
    }

    #[tokio::test]
    async fn test_rejected_config_still_closes_session() {
        let factory = MockFactory::new().with_plan(
            "10.0.0.6",
            Plan::RejectConfig {
                check_output: String::new(),
            },
        );
        let controller = controller(factory);

        let outcome = controller.process(&ios_device("10.0.0.6")).await;
        assert!(matches!(outcome, Outcome::Failed(_)));
        assert_eq!(controller.sessions.close_count("10.0.0.6"), 1);
    }

    #[test]
    fn test_outcome_success_partition() {
        assert!(Outcome::AlreadyEnabled.is_success());
        assert!(Outcome::Enabled.is_success());
        assert!(!Outcome::Unsupported.is_success());
        assert!(!Outcome::AuthFailed.is_success());
        assert!(!Outcome::ConnectFailed.is_success());
        assert!(!Outcome::Failed("boom".to_string()).is_success());
    }
}
