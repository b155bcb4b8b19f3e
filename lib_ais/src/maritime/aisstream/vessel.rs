use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::normalizer::StaticIdentity;
use crate::maritime::codes::flag_from_mmsi;
use crate::utils::parse_timestamp_millis;

/// Provenance tag stamped on every record.
pub const SOURCE_TAG: &str = "AISStream";

/// The canonical result of one successful resolution.
///
/// Optional fields are `null` when absent, never an empty string. Built once
/// per query and handed to the caller by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedVessel {
    /// Vessel name.
    pub vessel_name: Option<String>,
    /// The queried IMO, normalized.
    pub imo: Option<String>,
    /// MMSI learned in the identity phase.
    pub mmsi: Option<String>,
    /// Flag state from the MMSI prefix.
    pub flag: Option<String>,
    /// Coarse vessel type.
    pub general_type: Option<String>,
    /// Fine vessel type.
    pub detailed_type: Option<String>,
    /// Port calls aren't carried by AIS; always `null` from this source.
    pub departed_from: Option<String>,
    /// Reported destination.
    pub arrival_at: Option<String>,
    /// Navigational status label; `null` on a partial result.
    pub nav_status: Option<String>,
    /// Actual time of departure; not carried by AIS.
    pub atd: Option<String>,
    /// Actual time of arrival; not carried by AIS.
    pub ata: Option<String>,
    /// Reported ETA.
    pub reported_eta: Option<String>,
    /// Always [`SOURCE_TAG`].
    pub source: String,
    /// When the record was assembled, ISO-8601 UTC.
    pub fetched_at: String,
}

impl NormalizedVessel {
    /// Builds the record from the identity phase, the optional status phase
    /// result and the resolution timestamp. The flag comes from the MMSI.
    pub fn from_identity(identity: StaticIdentity, nav_status: Option<String>, fetched_at: String) -> Self {
        let flag = flag_from_mmsi(identity.mmsi.as_deref()).map(str::to_string);
        Self {
            vessel_name: identity.vessel_name,
            imo: identity.imo,
            mmsi: identity.mmsi,
            flag,
            general_type: identity.general_type,
            detailed_type: identity.detailed_type,
            departed_from: None,
            arrival_at: identity.arrival_at,
            nav_status: nav_status.filter(|s| !s.is_empty()),
            atd: None,
            ata: None,
            reported_eta: identity.reported_eta,
            source: SOURCE_TAG.to_string(),
            fetched_at,
        }
    }

    /// Key a result sink would persist this record under: the IMO, else the
    /// MMSI, else the name, else the fetch time.
    pub fn storage_key(&self) -> String {
        let id = self
            .imo
            .as_deref()
            .or(self.mmsi.as_deref())
            .or(self.vessel_name.as_deref())
            .unwrap_or(&self.fetched_at);
        format!("vessel:{}", id)
    }

    /// Field-wise equality that ignores `fetched_at`.
    pub fn same_vessel_state(&self, other: &Self) -> bool {
        let mut other = other.clone();
        other.fetched_at.clone_from(&self.fetched_at);
        *self == other
    }
}

/// Lineup ordering: most recently fetched first, then by name.
///
/// Missing or unparseable timestamps sort as the Unix epoch; missing names as
/// the empty string.
pub fn lineup_order(a: &NormalizedVessel, b: &NormalizedVessel) -> Ordering {
    let ts = |v: &NormalizedVessel| parse_timestamp_millis(&v.fetched_at).unwrap_or(0);
    ts(b).cmp(&ts(a)).then_with(|| {
        a.vessel_name
            .as_deref()
            .unwrap_or("")
            .cmp(b.vessel_name.as_deref().unwrap_or(""))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> StaticIdentity {
        StaticIdentity {
            imo: Some("9412634".into()),
            mmsi: Some("247123456".into()),
            vessel_name: Some("COSTA DIADEMA".into()),
            general_type: Some("Passenger".into()),
            detailed_type: Some("Passenger".into()),
            arrival_at: Some("SAVONA".into()),
            reported_eta: None,
        }
    }

    fn named(name: Option<&str>, fetched_at: &str) -> NormalizedVessel {
        let mut id = identity();
        id.vessel_name = name.map(str::to_string);
        NormalizedVessel::from_identity(id, None, fetched_at.to_string())
    }

    #[test]
    fn serializes_camel_case_with_nulls() {
        let v = NormalizedVessel::from_identity(identity(), Some("Moored".into()), "2024-01-01T00:00:00.000Z".into());
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["vesselName"], "COSTA DIADEMA");
        assert_eq!(json["flag"], "Italy");
        assert_eq!(json["navStatus"], "Moored");
        assert_eq!(json["source"], "AISStream");
        assert!(json["departedFrom"].is_null());
        assert!(json["reportedEta"].is_null());
        assert_eq!(json["fetchedAt"], "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn empty_status_stays_null() {
        let v = NormalizedVessel::from_identity(identity(), Some(String::new()), "t".into());
        assert_eq!(v.nav_status, None);
    }

    #[test]
    fn storage_key_fallbacks() {
        let mut v = named(Some("A"), "2024-01-01T00:00:00.000Z");
        assert_eq!(v.storage_key(), "vessel:9412634");
        v.imo = None;
        assert_eq!(v.storage_key(), "vessel:247123456");
        v.mmsi = None;
        assert_eq!(v.storage_key(), "vessel:A");
        v.vessel_name = None;
        assert_eq!(v.storage_key(), "vessel:2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn lineup_newest_first_then_name() {
        let mut list = vec![
            named(Some("B"), "2024-01-01T00:00:00.000Z"),
            named(Some("A"), "2024-01-01T00:00:00.000Z"),
            named(Some("Z"), "2024-06-01T00:00:00.000Z"),
            named(None, "garbage"),
        ];
        list.sort_by(lineup_order);
        let names: Vec<_> = list.iter().map(|v| v.vessel_name.clone()).collect();
        assert_eq!(
            names,
            vec![Some("Z".into()), Some("A".into()), Some("B".into()), None]
        );
    }

    #[test]
    fn same_state_ignores_fetch_time() {
        let a = named(Some("A"), "2024-01-01T00:00:00.000Z");
        let b = named(Some("A"), "2025-01-01T00:00:00.000Z");
        assert!(a.same_vessel_state(&b));
        assert_ne!(a, b);
    }
}
