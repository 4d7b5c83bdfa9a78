//! Fleet sweep: sequential processing of the whole inventory.

use log::{debug, info, warn};

use crate::catalog::CommandCatalog;
use crate::controller::{DeviceController, Outcome};
use crate::inventory::DeviceDescriptor;
use crate::session::{SessionFactory, SshSessionFactory};
use crate::transport::SessionOptions;

/// Per-device result, in inventory order.
#[derive(Debug, Clone)]
pub struct DeviceReport {
    /// The descriptor this outcome belongs to.
    pub device: DeviceDescriptor,

    /// What happened.
    pub outcome: Outcome,
}

/// Aggregated results of one full sweep. One entry per input
/// descriptor, in order.
#[derive(Debug, Clone, Default)]
pub struct FleetReport {
    reports: Vec<DeviceReport>,
}

impl FleetReport {
    /// The per-device reports, in inventory order.
    pub fn reports(&self) -> &[DeviceReport] {
        &self.reports
    }

    /// Number of devices processed.
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// Check whether anything was processed.
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// True when every device ended up with SNMP enabled.
    pub fn is_clean(&self) -> bool {
        self.reports.iter().all(|r| r.outcome.is_success())
    }

    /// Aggregate process exit code: 0 when clean, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        u8::from(!self.is_clean())
    }
}

/// Receives per-device events during a sweep.
///
/// Decouples control flow from presentation: the runner emits events,
/// a reporter renders them (log lines, console output, anything else).
pub trait Reporter {
    /// A device is about to be processed.
    fn device_started(&mut self, _device: &DeviceDescriptor) {}

    /// A device finished with the given outcome.
    fn device_finished(&mut self, _device: &DeviceDescriptor, _outcome: &Outcome) {}
}

/// Reporter that renders outcomes through the `log` macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn device_started(&mut self, device: &DeviceDescriptor) {
        info!("connecting to {} ({})", device.address, device.platform);
    }

    fn device_finished(&mut self, device: &DeviceDescriptor, outcome: &Outcome) {
        if outcome.is_success() {
            info!("{}: {outcome}", device.address);
        } else {
            warn!("{}: {outcome}", device.address);
        }
    }
}

/// Sweeps an inventory through the device controller, one device at a
/// time. A failure on one device never stops the run.
pub struct FleetRunner<F> {
    controller: DeviceController<F>,
}

impl FleetRunner<SshSessionFactory> {
    /// Runner over real SSH sessions.
    pub fn new(catalog: CommandCatalog, options: SessionOptions) -> Self {
        Self::with_factory(catalog, SshSessionFactory::new(options))
    }
}

impl<F: SessionFactory> FleetRunner<F> {
    /// Runner over an arbitrary session factory.
    pub fn with_factory(catalog: CommandCatalog, factory: F) -> Self {
        Self {
            controller: DeviceController::new(catalog, factory),
        }
    }

    /// Process every descriptor in order and aggregate the outcomes.
    pub async fn run(
        &self,
        inventory: &[DeviceDescriptor],
        reporter: &mut dyn Reporter,
    ) -> FleetReport {
        debug!("sweeping {} device(s)", inventory.len());

        let mut reports = Vec::with_capacity(inventory.len());
        for device in inventory {
            reporter.device_started(device);
            let outcome = self.controller.process(device).await;
            reporter.device_finished(device, &outcome);
            reports.push(DeviceReport {
                device: device.clone(),
                outcome,
            });
        }

        debug!("sweep finished");
        FleetReport { reports }
    }
}
