//! Request payloads posted to the application API when seeding fixtures
//!
//! The constant coordinates and photometry values are the ones the scanning
//! page scenarios rely on; only ids, timestamps and group/filter membership
//! vary between calls.

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Right ascension used for every seeded object
pub const DEFAULT_RA: f64 = 234.22;

/// Declination used for every seeded object
pub const DEFAULT_DEC: f64 = -22.33;

/// Distance to the nearest catalogued neighbour
pub const DEFAULT_RA_DIS: f64 = 2.3;

/// Taxonomy version string posted with [`TaxonomyPayload::sample`]
pub const SAMPLE_TAXONOMY_VERSION: &str = "1.1.0";

/// `{status, data}` reply returned by every API endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub status: String,

    #[serde(default)]
    pub data: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Render a timestamp the way the server expects `passed_at`
pub fn format_passed_at(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Current UTC time as a `passed_at` value
pub fn passed_at_now() -> String {
    format_passed_at(Utc::now().naive_utc())
}

fn rrlyr_altdata() -> Value {
    json!({ "simbad": { "class": "RRLyr" } })
}

/// Candidate that passed one or more filters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidatePayload {
    pub id: String,
    pub ra: f64,
    pub dec: f64,
    pub redshift: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altdata: Option<Value>,
    pub transient: bool,
    pub ra_dis: f64,
    pub passed_at: String,
    pub filter_ids: Vec<i64>,
}

impl CandidatePayload {
    /// Candidate passing `filter_id` now, at redshift 3 with SIMBAD altdata
    pub fn new(id: impl Into<String>, filter_id: i64) -> Self {
        Self {
            id: id.into(),
            ra: DEFAULT_RA,
            dec: DEFAULT_DEC,
            redshift: 3.0,
            altdata: Some(rrlyr_altdata()),
            transient: false,
            ra_dis: DEFAULT_RA_DIS,
            passed_at: passed_at_now(),
            filter_ids: vec![filter_id],
        }
    }

    pub fn with_redshift(mut self, redshift: f64) -> Self {
        self.redshift = redshift;
        self
    }

    pub fn without_altdata(mut self) -> Self {
        self.altdata = None;
        self
    }
}

/// Object saved as a source to one or more groups
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourcePayload {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ra: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dec: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redshift: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altdata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transient: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ra_dis: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_ids: Option<Vec<i64>>,
}

impl SourcePayload {
    /// Save an already-posted object without touching its fields
    pub fn existing(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Full source record saved to the given groups
    pub fn new(id: impl Into<String>, group_ids: Vec<i64>) -> Self {
        Self {
            id: id.into(),
            ra: Some(DEFAULT_RA),
            dec: Some(DEFAULT_DEC),
            redshift: Some(3.0),
            altdata: Some(rrlyr_altdata()),
            transient: Some(false),
            ra_dis: Some(DEFAULT_RA_DIS),
            group_ids: Some(group_ids),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupPayload {
    pub name: String,
    pub group_admins: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhotometryPayload {
    pub obj_id: String,
    pub mjd: f64,
    pub instrument_id: i64,
    pub flux: f64,
    pub fluxerr: f64,
    pub zp: f64,
    pub magsys: String,
    pub filter: String,
    pub group_ids: Vec<i64>,
}

impl PhotometryPayload {
    /// Single ZTF r-band point at MJD 58000
    pub fn ztfr(obj_id: impl Into<String>, instrument_id: i64, group_ids: Vec<i64>) -> Self {
        Self {
            obj_id: obj_id.into(),
            mjd: 58000.0,
            instrument_id,
            flux: 12.24,
            fluxerr: 0.031,
            zp: 25.0,
            magsys: "ab".to_string(),
            filter: "ztfr".to_string(),
            group_ids,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnotationPayload {
    pub obj_id: String,
    pub origin: String,
    pub data: Value,
}

impl AnnotationPayload {
    /// Annotation carrying a single numeric field
    pub fn numeric(
        obj_id: impl Into<String>,
        origin: impl Into<String>,
        field: &str,
        value: f64,
    ) -> Self {
        let mut data = serde_json::Map::new();
        data.insert(field.to_string(), json!(value));
        Self {
            obj_id: obj_id.into(),
            origin: origin.into(),
            data: Value::Object(data),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaxonomyPayload {
    pub name: String,
    pub hierarchy: Value,
    pub group_ids: Vec<i64>,
    pub provenance: String,
    pub version: String,
    #[serde(rename = "isLatest")]
    pub is_latest: bool,
}

impl TaxonomyPayload {
    /// Small time-domain hierarchy containing the `Algol` and `AGN` classes
    pub fn sample(name: impl Into<String>, group_ids: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            hierarchy: sample_hierarchy(),
            group_ids,
            provenance: format!("tdtax_{}", SAMPLE_TAXONOMY_VERSION),
            version: SAMPLE_TAXONOMY_VERSION.to_string(),
            is_latest: true,
        }
    }
}

fn sample_hierarchy() -> Value {
    json!({
        "class": "Time-domain Source",
        "tags": [],
        "subclasses": [
            {
                "class": "Stellar variable",
                "tags": ["stellar"],
                "subclasses": [
                    {
                        "class": "Eclipsing",
                        "tags": ["eclipsing"],
                        "subclasses": [
                            { "class": "Algol", "tags": ["algol"] }
                        ]
                    }
                ]
            },
            {
                "class": "Galactic Nucleus",
                "tags": ["nuclear"],
                "subclasses": [
                    { "class": "AGN", "tags": ["agn"] }
                ]
            }
        ]
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationPayload {
    pub obj_id: String,
    pub classification: String,
    pub taxonomy_id: i64,
    pub probability: f64,
    pub group_ids: Vec<i64>,
}
