//! Fleet sweep CLI.
//!
//! Reads the device inventory from `ROUTER{n}_IP`, `ROUTER{n}_MODEL`,
//! `ROUTER{n}_USER` and `ROUTER{n}_PASS` environment variables (plus
//! optional `ROUTER{n}_PORT`), audits SNMP on every device, and exits
//! nonzero if any device did not end up with SNMP enabled.
//!
//! `SNMP_COMMUNITY` selects the community string (default: `public`);
//! `SNMPSWEEP_LEGACY_KEX=1` offers diffie-hellman-group1-sha1 for old
//! device firmware.

use std::process::ExitCode;

use snmpsweep::{
    CommandCatalog, DeviceDescriptor, FleetRunner, Inventory, Outcome, Reporter, SessionOptions,
};

/// Reporter printing one status line per device.
struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn device_started(&mut self, device: &DeviceDescriptor) {
        println!("connecting to {} ({})...", device.address, device.platform);
    }

    fn device_finished(&mut self, device: &DeviceDescriptor, outcome: &Outcome) {
        println!("{}: {outcome}", device.address);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let inventory = match Inventory::from_env() {
        Ok(inventory) => inventory,
        Err(e) => {
            eprintln!("inventory error: {e}");
            return ExitCode::from(2);
        }
    };
    if inventory.is_empty() {
        eprintln!("no devices configured (set ROUTER1_IP, ROUTER1_MODEL, ROUTER1_USER, ROUTER1_PASS)");
        return ExitCode::from(2);
    }

    let community = std::env::var("SNMP_COMMUNITY").unwrap_or_else(|_| "public".to_string());
    let legacy_kex = std::env::var("SNMPSWEEP_LEGACY_KEX").is_ok_and(|v| v == "1");

    let runner = FleetRunner::new(
        CommandCatalog::builtin(&community),
        SessionOptions::default().with_legacy_kex(legacy_kex),
    );

    let report = runner.run(inventory.devices(), &mut ConsoleReporter).await;
    ExitCode::from(report.exit_code())
}
