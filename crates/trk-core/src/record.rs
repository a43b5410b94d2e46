use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::{ActivityInfo, ServiceInfo};
use crate::error::ParcelError;
use crate::parcel::{Parcel, Parcelable};

/// One tracker signature matched against a component of a scanned app.
///
/// The component flags are independent: a record may be tagged as several
/// kinds at once or as none. No field is validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerRecord {
    name: Option<String>,
    tracker_id: Option<String>,
    is_activity: bool,
    is_service: bool,
    is_receiver: bool,
    is_blocked: bool,
    is_enabled: bool,
    activity_info: Option<ActivityInfo>,
    service_info: Option<ServiceInfo>,
    is_logged: bool,
}

impl Default for TrackerRecord {
    fn default() -> Self {
        Self {
            name: None,
            tracker_id: None,
            is_activity: false,
            is_service: false,
            is_receiver: false,
            is_blocked: false,
            is_enabled: true,
            activity_info: None,
            service_info: None,
            is_logged: false,
        }
    }
}

impl TrackerRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from all ten values, stored as given.
    #[allow(clippy::too_many_arguments)]
    pub fn with_values(
        name: Option<String>,
        tracker_id: Option<String>,
        is_activity: bool,
        is_service: bool,
        is_receiver: bool,
        is_blocked: bool,
        is_enabled: bool,
        activity_info: Option<ActivityInfo>,
        service_info: Option<ServiceInfo>,
        is_logged: bool,
    ) -> Self {
        Self {
            name,
            tracker_id,
            is_activity,
            is_service,
            is_receiver,
            is_blocked,
            is_enabled,
            activity_info,
            service_info,
            is_logged,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn tracker_id(&self) -> Option<&str> {
        self.tracker_id.as_deref()
    }

    pub fn set_tracker_id(&mut self, tracker_id: Option<String>) {
        self.tracker_id = tracker_id;
    }

    pub fn is_activity(&self) -> bool {
        self.is_activity
    }

    pub fn set_activity(&mut self, activity: bool) {
        self.is_activity = activity;
    }

    pub fn is_service(&self) -> bool {
        self.is_service
    }

    pub fn set_service(&mut self, service: bool) {
        self.is_service = service;
    }

    pub fn is_receiver(&self) -> bool {
        self.is_receiver
    }

    pub fn set_receiver(&mut self, receiver: bool) {
        self.is_receiver = receiver;
    }

    pub fn is_blocked(&self) -> bool {
        self.is_blocked
    }

    pub fn set_blocked(&mut self, blocked: bool) {
        self.is_blocked = blocked;
    }

    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.is_enabled = enabled;
    }

    pub fn activity_info(&self) -> Option<&ActivityInfo> {
        self.activity_info.as_ref()
    }

    pub fn set_activity_info(&mut self, activity_info: Option<ActivityInfo>) {
        self.activity_info = activity_info;
    }

    pub fn service_info(&self) -> Option<&ServiceInfo> {
        self.service_info.as_ref()
    }

    pub fn set_service_info(&mut self, service_info: Option<ServiceInfo>) {
        self.service_info = service_info;
    }

    pub fn is_logged(&self) -> bool {
        self.is_logged
    }

    pub fn set_logged(&mut self, logged: bool) {
        self.is_logged = logged;
    }

    /// Class name of the matched component: activity metadata first, then
    /// service metadata, then the record's own name.
    pub fn component_name(&self) -> Option<&str> {
        self.activity_info
            .as_ref()
            .map(ActivityInfo::name)
            .or_else(|| self.service_info.as_ref().map(ServiceInfo::name))
            .or(self.name.as_deref())
    }
}

impl Parcelable for TrackerRecord {
    const TYPE_NAME: &'static str = "TrackerRecord";

    fn write_to_parcel(&self, dest: &mut Parcel, flags: u32) {
        dest.write_string(self.name.as_deref());
        dest.write_string(self.tracker_id.as_deref());
        dest.write_bool(self.is_activity);
        dest.write_bool(self.is_service);
        dest.write_bool(self.is_receiver);
        dest.write_bool(self.is_blocked);
        dest.write_bool(self.is_enabled);
        dest.write_parcelable(self.activity_info.as_ref(), flags);
        dest.write_parcelable(self.service_info.as_ref(), flags);
        dest.write_bool(self.is_logged);
    }

    fn read_from_parcel(src: &mut Parcel) -> Result<Self, ParcelError> {
        Ok(Self {
            name: src.read_string()?,
            tracker_id: src.read_string()?,
            is_activity: src.read_bool()?,
            is_service: src.read_bool()?,
            is_receiver: src.read_bool()?,
            is_blocked: src.read_bool()?,
            is_enabled: src.read_bool()?,
            activity_info: src.read_parcelable()?,
            service_info: src.read_parcelable()?,
            is_logged: src.read_bool()?,
        })
    }
}

struct Quoted<'a>(Option<&'a str>);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(s) => write!(f, "'{s}'"),
            None => f.write_str("null"),
        }
    }
}

struct OrNull<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for OrNull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => fmt::Display::fmt(v, f),
            None => f.write_str("null"),
        }
    }
}

impl fmt::Display for TrackerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrackerRecord{{name={}, tracker_id={}, is_activity={}, is_service={}, \
             is_receiver={}, is_blocked={}, is_enabled={}, activity_info={}, \
             service_info={}, is_logged={}}}",
            Quoted(self.name.as_deref()),
            Quoted(self.tracker_id.as_deref()),
            self.is_activity,
            self.is_service,
            self.is_receiver,
            self.is_blocked,
            self.is_enabled,
            OrNull(self.activity_info.as_ref()),
            OrNull(self.service_info.as_ref()),
            self.is_logged,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentInfo;

    fn admob() -> TrackerRecord {
        TrackerRecord::with_values(
            Some("AdMob".to_string()),
            Some("admob_1".to_string()),
            true,
            false,
            false,
            false,
            true,
            None,
            None,
            false,
        )
    }

    fn round_trip(record: &TrackerRecord) -> TrackerRecord {
        let mut p = Parcel::new();
        record.write_to_parcel(&mut p, 0);
        let mut r = Parcel::from_bytes(p.into_bytes());
        let decoded = TrackerRecord::read_from_parcel(&mut r).expect("decode record");
        assert_eq!(r.data_avail(), 0, "decoder left bytes unread");
        decoded
    }

    #[test]
    fn default_construction() {
        let r = TrackerRecord::new();
        assert!(r.is_enabled());
        assert!(!r.is_activity());
        assert!(!r.is_service());
        assert!(!r.is_receiver());
        assert!(!r.is_blocked());
        assert!(!r.is_logged());
        assert!(r.name().is_none());
        assert!(r.tracker_id().is_none());
        assert!(r.activity_info().is_none());
        assert!(r.service_info().is_none());
    }

    #[test]
    fn admob_example_round_trips() {
        let decoded = round_trip(&admob());
        assert_eq!(decoded.name(), Some("AdMob"));
        assert_eq!(decoded.tracker_id(), Some("admob_1"));
        assert!(decoded.is_activity());
        assert!(!decoded.is_service());
        assert!(!decoded.is_receiver());
        assert!(!decoded.is_blocked());
        assert!(decoded.is_enabled());
        assert!(decoded.activity_info().is_none());
        assert!(decoded.service_info().is_none());
        assert!(!decoded.is_logged());
    }

    #[test]
    fn default_record_round_trips() {
        let r = TrackerRecord::new();
        assert_eq!(round_trip(&r), r);
    }

    #[test]
    fn record_with_metadata_round_trips() {
        let mut r = admob();
        r.set_receiver(true);
        r.set_blocked(true);
        r.set_enabled(false);
        r.set_logged(true);
        r.set_activity_info(Some(ActivityInfo::new(ComponentInfo::new(
            "com.example",
            "com.google.android.gms.ads.AdActivity",
        ))));
        r.set_service_info(Some(ServiceInfo::new(ComponentInfo::new(
            "com.example",
            "com.google.android.gms.ads.AdService",
        ))));
        assert_eq!(round_trip(&r), r);
    }

    #[test]
    fn wire_layout_field_order() {
        let mut r = TrackerRecord::new();
        r.set_name(Some("A".to_string()));
        r.set_service(true);
        r.set_logged(true);

        let mut p = Parcel::new();
        r.write_to_parcel(&mut p, 0);

        let mut expected = Vec::new();
        expected.extend_from_slice(&1i32.to_le_bytes());
        expected.push(b'A');
        expected.extend_from_slice(&(-1i32).to_le_bytes());
        // activity, service, receiver, blocked, enabled
        expected.extend_from_slice(&[0, 1, 0, 0, 1]);
        expected.extend_from_slice(&(-1i32).to_le_bytes());
        expected.extend_from_slice(&(-1i32).to_le_bytes());
        expected.push(1);
        assert_eq!(p.as_bytes(), expected.as_slice());
    }

    #[test]
    fn every_truncation_errors() {
        let mut p = Parcel::new();
        admob().write_to_parcel(&mut p, 0);
        let bytes = p.into_bytes();
        for cut in 0..bytes.len() {
            let mut r = Parcel::from_bytes(bytes[..cut].to_vec());
            assert!(
                TrackerRecord::read_from_parcel(&mut r).is_err(),
                "decoding {cut} of {} bytes should fail",
                bytes.len()
            );
        }
    }

    #[test]
    fn describe_contents_is_zero() {
        assert_eq!(TrackerRecord::new().describe_contents(), 0);
        let mut r = admob();
        r.set_activity_info(Some(ActivityInfo::new(ComponentInfo::new("p", "p.A"))));
        assert_eq!(r.describe_contents(), 0);
    }

    #[test]
    fn display_lists_fields_in_order() {
        assert_eq!(
            admob().to_string(),
            "TrackerRecord{name='AdMob', tracker_id='admob_1', is_activity=true, \
             is_service=false, is_receiver=false, is_blocked=false, is_enabled=true, \
             activity_info=null, service_info=null, is_logged=false}"
        );
    }

    type Setter = Box<dyn Fn(&mut TrackerRecord)>;

    /// One case per setter: the field name used by `Display`, the mutation and
    /// the record it should produce from `admob()`.
    fn setter_cases() -> Vec<(&'static str, Setter, TrackerRecord)> {
        let base = admob();
        let activity = ActivityInfo::new(ComponentInfo::new("p", "p.A"));
        let service = ServiceInfo::new(ComponentInfo::new("p", "p.S"));
        vec![
            (
                "name",
                Box::new(|r: &mut TrackerRecord| r.set_name(None)) as Setter,
                TrackerRecord { name: None, ..base.clone() },
            ),
            (
                "tracker_id",
                Box::new(|r: &mut TrackerRecord| r.set_tracker_id(None)) as Setter,
                TrackerRecord { tracker_id: None, ..base.clone() },
            ),
            (
                "is_activity",
                Box::new(|r: &mut TrackerRecord| r.set_activity(false)) as Setter,
                TrackerRecord { is_activity: false, ..base.clone() },
            ),
            (
                "is_service",
                Box::new(|r: &mut TrackerRecord| r.set_service(true)) as Setter,
                TrackerRecord { is_service: true, ..base.clone() },
            ),
            (
                "is_receiver",
                Box::new(|r: &mut TrackerRecord| r.set_receiver(true)) as Setter,
                TrackerRecord { is_receiver: true, ..base.clone() },
            ),
            (
                "is_blocked",
                Box::new(|r: &mut TrackerRecord| r.set_blocked(true)) as Setter,
                TrackerRecord { is_blocked: true, ..base.clone() },
            ),
            (
                "is_enabled",
                Box::new(|r: &mut TrackerRecord| r.set_enabled(false)) as Setter,
                TrackerRecord { is_enabled: false, ..base.clone() },
            ),
            (
                "activity_info",
                {
                    let info = activity.clone();
                    Box::new(move |r: &mut TrackerRecord| r.set_activity_info(Some(info.clone()))) as Setter
                },
                TrackerRecord { activity_info: Some(activity), ..base.clone() },
            ),
            (
                "service_info",
                {
                    let info = service.clone();
                    Box::new(move |r: &mut TrackerRecord| r.set_service_info(Some(info.clone()))) as Setter
                },
                TrackerRecord { service_info: Some(service), ..base.clone() },
            ),
            (
                "is_logged",
                Box::new(|r: &mut TrackerRecord| r.set_logged(true)) as Setter,
                TrackerRecord { is_logged: true, ..base },
            ),
        ]
    }

    fn display_segments(record: &TrackerRecord) -> Vec<String> {
        let text = record.to_string();
        let inner = text
            .strip_prefix("TrackerRecord{")
            .and_then(|t| t.strip_suffix('}'))
            .expect("TrackerRecord{...}");
        inner.split(", ").map(str::to_owned).collect()
    }

    #[test]
    fn each_setter_changes_only_its_field() {
        let cases = setter_cases();
        assert_eq!(cases.len(), 10);
        for (field, set, expected) in cases {
            let mut r = admob();
            set(&mut r);
            assert_eq!(r, expected, "set {field}");
        }
    }

    #[test]
    fn each_setter_changes_only_its_display_segment() {
        let base = display_segments(&admob());
        assert_eq!(base.len(), 10);
        for (field, set, _) in setter_cases() {
            let mut r = admob();
            set(&mut r);
            let changed = display_segments(&r);
            assert_eq!(changed.len(), base.len(), "set {field}");
            let diffs: Vec<_> = base
                .iter()
                .zip(&changed)
                .filter(|(a, b)| a != b)
                .map(|(_, b)| b.as_str())
                .collect();
            assert_eq!(diffs.len(), 1, "set {field} changed {diffs:?}");
            assert!(diffs[0].starts_with(&format!("{field}=")), "set {field}: {}", diffs[0]);
        }
    }

    #[test]
    fn display_is_stable() {
        assert_eq!(admob().to_string(), admob().to_string());
    }

    #[test]
    fn display_null_name_is_unquoted() {
        let text = TrackerRecord::new().to_string();
        assert!(text.starts_with("TrackerRecord{name=null, tracker_id=null,"));
    }

    #[test]
    fn component_name_prefers_metadata() {
        let mut r = admob();
        assert_eq!(r.component_name(), Some("AdMob"));

        r.set_service_info(Some(ServiceInfo::new(ComponentInfo::new("p", "p.Svc"))));
        assert_eq!(r.component_name(), Some("p.Svc"));

        r.set_activity_info(Some(ActivityInfo::new(ComponentInfo::new("p", "p.Act"))));
        assert_eq!(r.component_name(), Some("p.Act"));

        assert_eq!(TrackerRecord::new().component_name(), None);
    }

    #[test]
    fn json_missing_fields_take_defaults() {
        let r: TrackerRecord =
            serde_json::from_str(r#"{"name": "Firebase", "is_service": true}"#)
                .expect("deserialize TrackerRecord");
        assert_eq!(r.name(), Some("Firebase"));
        assert!(r.is_service());
        assert!(r.is_enabled());
        assert!(!r.is_activity());
    }
}
