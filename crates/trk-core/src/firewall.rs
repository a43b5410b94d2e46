//! Intent firewall rules: block tracker components without uninstalling the app.
//!
//! The platform reads one XML file per package from its `ifw` directory:
//!
//! ```xml
//! <rules>
//!   <activity block="true" log="false">
//!     <component-filter name="com.example/com.ads.AdActivity" />
//!   </activity>
//!   <service block="true" log="false">...</service>
//!   <broadcast block="true" log="false">...</broadcast>
//! </rules>
//! ```
//!
//! A kind may appear in several sections. Sections with `block="false"` only
//! log matching intents and are left alone by [`IntentFirewall::block`].

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::FirewallError;
use crate::record::TrackerRecord;

/// Which rules section a component belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Activity,
    Service,
    Broadcast,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 3] = [Self::Activity, Self::Service, Self::Broadcast];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activity => "activity",
            Self::Service => "service",
            Self::Broadcast => "broadcast",
        }
    }

    /// Kinds a record is tagged with. Receivers map to `broadcast`.
    pub fn of(record: &TrackerRecord) -> Vec<ComponentKind> {
        let mut kinds = Vec::new();
        if record.is_activity() {
            kinds.push(Self::Activity);
        }
        if record.is_service() {
            kinds.push(Self::Service);
        }
        if record.is_receiver() {
            kinds.push(Self::Broadcast);
        }
        kinds
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ComponentFilter {
    #[serde(rename = "@name")]
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct FilterSection {
    #[serde(rename = "@block", default = "default_block")]
    block: bool,
    #[serde(rename = "@log", default)]
    log: bool,
    #[serde(rename = "component-filter", default)]
    filters: Vec<ComponentFilter>,
}

fn default_block() -> bool {
    true
}

impl FilterSection {
    fn new(log: bool) -> Self {
        Self {
            block: true,
            log,
            filters: Vec::new(),
        }
    }
}

/// Parsed contents of one package's rules file.
///
/// Sections without filters match nothing and are not kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "rules")]
pub struct IntentFirewall {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    activity: Vec<FilterSection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    service: Vec<FilterSection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    broadcast: Vec<FilterSection>,
}

/// `package/component`, the form the platform matches against.
pub fn filter_name(package: &str, component: &str) -> String {
    format!("{package}/{component}")
}

/// Accepts both `pkg/pkg.Cls` and the short `pkg/.Cls` spelling.
fn filter_matches(filter: &str, package: &str, component: &str) -> bool {
    let Some((pkg, cls)) = filter.split_once('/') else {
        return false;
    };
    if pkg != package {
        return false;
    }
    if cls == component {
        return true;
    }
    match component.strip_prefix(package) {
        Some(rest) if rest.starts_with('.') => cls == rest,
        _ => false,
    }
}

/// `<dir>/<package>.xml`
pub fn rules_path(dir: &Path, package: &str) -> PathBuf {
    dir.join(format!("{package}.xml"))
}

impl IntentFirewall {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a rules document. Blank input yields empty rules.
    pub fn parse(xml: &str) -> Result<Self, FirewallError> {
        if xml.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut rules: Self = quick_xml::de::from_str(xml)?;
        rules.drop_empty_sections();
        Ok(rules)
    }

    fn drop_empty_sections(&mut self) {
        for kind in ComponentKind::ALL {
            self.sections_mut(kind).retain(|s| !s.filters.is_empty());
        }
    }

    pub fn to_xml(&self) -> Result<String, FirewallError> {
        Ok(quick_xml::se::to_string(self)?)
    }

    /// Read rules from disk. A missing file is the same as no rules.
    pub fn load(path: &Path) -> Result<Self, FirewallError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                debug!("Loaded firewall rules from {}", path.display());
                Self::parse(&content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No firewall rules at {}", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(FirewallError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), FirewallError> {
        let io_err = |source| FirewallError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, self.to_xml()?).map_err(io_err)?;
        info!("Wrote firewall rules to {}", path.display());
        Ok(())
    }

    fn sections(&self, kind: ComponentKind) -> &[FilterSection] {
        match kind {
            ComponentKind::Activity => &self.activity,
            ComponentKind::Service => &self.service,
            ComponentKind::Broadcast => &self.broadcast,
        }
    }

    fn sections_mut(&mut self, kind: ComponentKind) -> &mut Vec<FilterSection> {
        match kind {
            ComponentKind::Activity => &mut self.activity,
            ComponentKind::Service => &mut self.service,
            ComponentKind::Broadcast => &mut self.broadcast,
        }
    }

    /// Filter names listed under every section of a kind, in file order.
    pub fn filters(&self, kind: ComponentKind) -> Vec<&str> {
        self.sections(kind)
            .iter()
            .flat_map(|s| s.filters.iter().map(|f| f.name.as_str()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        ComponentKind::ALL
            .iter()
            .all(|k| self.sections(*k).iter().all(|s| s.filters.is_empty()))
    }

    /// Whether `component` of `package` is blocked under the given kind.
    /// Sections with `block="false"` only log, so they never block.
    pub fn blocks(&self, kind: ComponentKind, package: &str, component: &str) -> bool {
        self.sections(kind).iter().any(|s| {
            s.block
                && s.filters
                    .iter()
                    .any(|f| filter_matches(&f.name, package, component))
        })
    }

    /// True when any of the record's kinds has a blocking rule for it.
    pub fn is_blocked(&self, record: &TrackerRecord, package: &str) -> bool {
        let Some(component) = record.component_name() else {
            return false;
        };
        ComponentKind::of(record)
            .into_iter()
            .any(|kind| self.blocks(kind, package, component))
    }

    /// Set every record's blocked flag from these rules.
    pub fn mark_blocked(&self, records: &mut [TrackerRecord], package: &str) {
        for record in records.iter_mut() {
            let blocked = self.is_blocked(record, package);
            record.set_blocked(blocked);
        }
    }

    /// Add blocking rules for the records. Returns the number of filters added.
    ///
    /// Filters go into the first blocking section of each kind. When a kind has
    /// none, a section is appended with `block="true"` and the given `log` value.
    pub fn block(&mut self, records: &mut [TrackerRecord], package: &str, log: bool) -> usize {
        let mut added = 0;
        for record in records.iter_mut() {
            let Some(component) = record.component_name().map(str::to_owned) else {
                debug!("Skipping tracker without component name: {record}");
                continue;
            };
            let kinds = ComponentKind::of(record);
            if kinds.is_empty() {
                debug!("Skipping {component}: not tagged as activity, service or receiver");
                continue;
            }
            for kind in kinds {
                if self.blocks(kind, package, &component) {
                    continue;
                }
                let sections = self.sections_mut(kind);
                let index = match sections.iter().position(|s| s.block) {
                    Some(i) => i,
                    None => {
                        sections.push(FilterSection::new(log));
                        sections.len() - 1
                    }
                };
                sections[index].filters.push(ComponentFilter {
                    name: filter_name(package, &component),
                });
                added += 1;
            }
            record.set_blocked(self.is_blocked(record, package));
        }
        added
    }

    /// Remove blocking rules for the records. Returns the number of filters removed.
    ///
    /// Only blocking sections are touched. Sections left without filters are dropped.
    pub fn unblock(&mut self, records: &mut [TrackerRecord], package: &str) -> usize {
        let mut removed = 0;
        for record in records.iter_mut() {
            let Some(component) = record.component_name().map(str::to_owned) else {
                debug!("Skipping tracker without component name: {record}");
                continue;
            };
            for kind in ComponentKind::of(record) {
                let sections = self.sections_mut(kind);
                for section in sections.iter_mut().filter(|s| s.block) {
                    let before = section.filters.len();
                    section
                        .filters
                        .retain(|f| !filter_matches(&f.name, package, &component));
                    removed += before - section.filters.len();
                }
                sections.retain(|s| !s.filters.is_empty());
            }
            record.set_blocked(self.is_blocked(record, package));
        }
        removed
    }
}
