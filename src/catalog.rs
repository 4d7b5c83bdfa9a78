//! Per-platform command catalog.
//!
//! The catalog is data, not behavior: everything dialect-specific about
//! checking and enabling SNMP lives here, including the config-mode
//! framing commands (`conf t` / `configure` / `commit and-quit`) and the
//! predicate that decides whether the check output means "enabled".
//! Supporting a new platform means inserting an entry, never adding a
//! branch to the controller or the session.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Vendor/OS dialect spoken by a managed device.
///
/// The string forms match the legacy inventory tokens (`cisco_ios`,
/// `juniper`, `mikrotik_routeros`, `linux`, `windows`). `Windows` has no
/// built-in catalog entry; descriptors carrying it resolve to the
/// unsupported outcome rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformKind {
    #[serde(rename = "cisco_ios")]
    CiscoIos,
    #[serde(rename = "juniper")]
    JuniperJunos,
    #[serde(rename = "mikrotik_routeros")]
    MikrotikRouterOs,
    #[serde(rename = "linux")]
    Linux,
    #[serde(rename = "windows")]
    Windows,
}

impl PlatformKind {
    /// The canonical inventory token for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CiscoIos => "cisco_ios",
            Self::JuniperJunos => "juniper",
            Self::MikrotikRouterOs => "mikrotik_routeros",
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a platform token is not recognized.
#[derive(Error, Debug)]
#[error("unknown platform kind '{0}'")]
pub struct InvalidPlatformKind(pub String);

impl FromStr for PlatformKind {
    type Err = InvalidPlatformKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cisco_ios" => Ok(Self::CiscoIos),
            "juniper" | "juniper_junos" => Ok(Self::JuniperJunos),
            "mikrotik_routeros" => Ok(Self::MikrotikRouterOs),
            "linux" => Ok(Self::Linux),
            "windows" => Ok(Self::Windows),
            other => Err(InvalidPlatformKind(other.to_string())),
        }
    }
}

/// Predicate deciding whether check-command output means SNMP is active.
///
/// Part of the catalog entry rather than controller logic: the check
/// syntax and the positive-result pattern are both platform properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnabledProbe {
    /// SNMP counts as enabled when the output contains this substring.
    OutputContains(String),
}

impl EnabledProbe {
    /// Evaluate the probe against check-command output.
    pub fn matches(&self, output: &str) -> bool {
        match self {
            Self::OutputContains(needle) => output.contains(needle),
        }
    }
}

/// Commands and probe for one platform dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Read-only command that reveals SNMP state.
    pub check_command: String,

    /// Ordered command sequence that enables SNMP, including any
    /// config-mode entry/exit and commit framing the platform needs.
    pub enable_commands: Vec<String>,

    /// Predicate applied to the check command's output.
    pub enabled_probe: EnabledProbe,
}

impl CatalogEntry {
    /// Create an entry with a check command and probe but no enable
    /// sequence yet.
    pub fn new(check_command: impl Into<String>, enabled_probe: EnabledProbe) -> Self {
        Self {
            check_command: check_command.into(),
            enable_commands: vec![],
            enabled_probe,
        }
    }

    /// Append one enable command.
    pub fn with_enable_command(mut self, command: impl Into<String>) -> Self {
        self.enable_commands.push(command.into());
        self
    }

    /// Append several enable commands in order.
    pub fn with_enable_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enable_commands.extend(commands.into_iter().map(Into::into));
        self
    }
}

/// Read-only lookup of check/enable commands per platform kind.
///
/// Built once at startup and never mutated afterwards; safe to share
/// across concurrent readers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandCatalog {
    entries: IndexMap<PlatformKind, CatalogEntry>,
}

impl CommandCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog covering the four built-in dialects, parameterized by the
    /// SNMP community string being audited/configured.
    ///
    /// RouterOS reports state explicitly (`enabled: yes`); the other
    /// platforms are probed by looking for the community string in their
    /// configuration or process table.
    pub fn builtin(community: &str) -> Self {
        Self::new()
            .with_entry(
                PlatformKind::CiscoIos,
                CatalogEntry::new(
                    "show running-config | include snmp-server",
                    EnabledProbe::OutputContains(community.to_string()),
                )
                .with_enable_commands([
                    "conf t".to_string(),
                    format!("snmp-server community {community} RO"),
                    "end".to_string(),
                ]),
            )
            .with_entry(
                PlatformKind::JuniperJunos,
                CatalogEntry::new(
                    "show configuration | match snmp",
                    EnabledProbe::OutputContains(community.to_string()),
                )
                .with_enable_commands([
                    "configure".to_string(),
                    format!("set snmp community {community} authorization read-only"),
                    "commit and-quit".to_string(),
                ]),
            )
            .with_entry(
                PlatformKind::MikrotikRouterOs,
                CatalogEntry::new(
                    "/snmp print",
                    EnabledProbe::OutputContains("enabled: yes".to_string()),
                )
                .with_enable_commands([
                    "/snmp set enabled=yes".to_string(),
                    format!("/snmp community set 0 name={community}"),
                ]),
            )
            .with_entry(
                PlatformKind::Linux,
                CatalogEntry::new(
                    "ps aux | grep snmpd",
                    EnabledProbe::OutputContains(community.to_string()),
                )
                .with_enable_commands([
                    "sudo systemctl start snmpd".to_string(),
                    format!(
                        "sudo sed -i 's/^com2sec.*/com2sec readonly default {community}/' /etc/snmp/snmpd.conf"
                    ),
                    "sudo systemctl restart snmpd".to_string(),
                ]),
            )
    }

    /// Add an entry, builder style.
    pub fn with_entry(mut self, kind: PlatformKind, entry: CatalogEntry) -> Self {
        self.entries.insert(kind, entry);
        self
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, kind: PlatformKind, entry: CatalogEntry) {
        self.entries.insert(kind, entry);
    }

    /// Look up the full entry for a kind. Absence means "unsupported",
    /// never an error.
    pub fn lookup(&self, kind: PlatformKind) -> Option<&CatalogEntry> {
        self.entries.get(&kind)
    }

    /// Look up the check command for a kind.
    pub fn lookup_check(&self, kind: PlatformKind) -> Option<&str> {
        self.entries.get(&kind).map(|e| e.check_command.as_str())
    }

    /// Look up the enable sequence for a kind.
    ///
    /// An entry with an empty sequence counts as absent: there is
    /// nothing to apply, so remediation is unsupported.
    pub fn lookup_enable(&self, kind: PlatformKind) -> Option<&[String]> {
        self.entries
            .get(&kind)
            .map(|e| e.enable_commands.as_slice())
            .filter(|cmds| !cmds.is_empty())
    }

    /// Check whether a kind has an entry.
    pub fn contains(&self, kind: PlatformKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Iterate over the registered kinds in insertion order.
    pub fn kinds(&self) -> impl Iterator<Item = PlatformKind> + '_ {
        self.entries.keys().copied()
    }
}
