//! Manifest component declarations as reported by package-manager introspection.
//!
//! A [`TrackerRecord`](crate::record::TrackerRecord) only carries these around;
//! nothing in this crate interprets their contents beyond the component name.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ParcelError;
use crate::parcel::{Parcel, Parcelable};

/// Fields shared by every declared component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInfo {
    /// Fully qualified class name, e.g. `com.google.android.gms.ads.AdActivity`.
    pub name: String,
    pub package_name: String,
    #[serde(default)]
    pub process_name: Option<String>,
    #[serde(default)]
    pub permission: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub exported: bool,
}

fn default_true() -> bool {
    true
}

impl ComponentInfo {
    pub fn new(package_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package_name: package_name.into(),
            process_name: None,
            permission: None,
            enabled: true,
            exported: false,
        }
    }

    fn write(&self, dest: &mut Parcel) {
        dest.write_string(Some(&self.name));
        dest.write_string(Some(&self.package_name));
        dest.write_string(self.process_name.as_deref());
        dest.write_string(self.permission.as_deref());
        dest.write_bool(self.enabled);
        dest.write_bool(self.exported);
    }

    fn read(src: &mut Parcel) -> Result<Self, ParcelError> {
        Ok(Self {
            name: src.read_string()?.unwrap_or_default(),
            package_name: src.read_string()?.unwrap_or_default(),
            process_name: src.read_string()?,
            permission: src.read_string()?,
            enabled: src.read_bool()?,
            exported: src.read_bool()?,
        })
    }
}

/// An `<activity>` or `<receiver>` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityInfo {
    #[serde(flatten)]
    pub component: ComponentInfo,
    #[serde(default)]
    pub task_affinity: Option<String>,
    #[serde(default)]
    pub launch_mode: i32,
    /// `-1` is "unspecified".
    #[serde(default = "unspecified_orientation")]
    pub screen_orientation: i32,
    #[serde(default)]
    pub flags: i32,
}

fn unspecified_orientation() -> i32 {
    -1
}

impl ActivityInfo {
    pub fn new(component: ComponentInfo) -> Self {
        Self {
            component,
            task_affinity: None,
            launch_mode: 0,
            screen_orientation: unspecified_orientation(),
            flags: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.component.name
    }
}

impl Parcelable for ActivityInfo {
    const TYPE_NAME: &'static str = "ActivityInfo";

    fn write_to_parcel(&self, dest: &mut Parcel, _flags: u32) {
        self.component.write(dest);
        dest.write_string(self.task_affinity.as_deref());
        dest.write_i32(self.launch_mode);
        dest.write_i32(self.screen_orientation);
        dest.write_i32(self.flags);
    }

    fn read_from_parcel(src: &mut Parcel) -> Result<Self, ParcelError> {
        Ok(Self {
            component: ComponentInfo::read(src)?,
            task_affinity: src.read_string()?,
            launch_mode: src.read_i32()?,
            screen_orientation: src.read_i32()?,
            flags: src.read_i32()?,
        })
    }
}

impl fmt::Display for ActivityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActivityInfo{{{}}}", self.component.name)
    }
}

/// A `<service>` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    #[serde(flatten)]
    pub component: ComponentInfo,
    #[serde(default)]
    pub flags: i32,
    #[serde(default)]
    pub foreground_service_type: i32,
}

impl ServiceInfo {
    pub fn new(component: ComponentInfo) -> Self {
        Self {
            component,
            flags: 0,
            foreground_service_type: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.component.name
    }
}

impl Parcelable for ServiceInfo {
    const TYPE_NAME: &'static str = "ServiceInfo";

    fn write_to_parcel(&self, dest: &mut Parcel, _flags: u32) {
        self.component.write(dest);
        dest.write_i32(self.flags);
        dest.write_i32(self.foreground_service_type);
    }

    fn read_from_parcel(src: &mut Parcel) -> Result<Self, ParcelError> {
        Ok(Self {
            component: ComponentInfo::read(src)?,
            flags: src.read_i32()?,
            foreground_service_type: src.read_i32()?,
        })
    }
}

impl fmt::Display for ServiceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceInfo{{{}}}", self.component.name)
    }
}
