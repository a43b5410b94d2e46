//! Tracker records detected in Android apps, their parcel encoding, and the
//! intent firewall rules used to block them.

pub mod component;
pub mod config;
pub mod envelope;
pub mod error;
pub mod firewall;
pub mod parcel;
pub mod record;

pub use component::{ActivityInfo, ComponentInfo, ServiceInfo};
pub use error::{FirewallError, ParcelError};
pub use firewall::{ComponentKind, IntentFirewall};
pub use parcel::{Parcel, Parcelable};
pub use record::TrackerRecord;
