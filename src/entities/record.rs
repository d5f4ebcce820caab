use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::demographics::Sex;
use super::ids::{RecordId, SampleTypeId, ScopeId, ServiceId, TenantId};

/// A patient encounter (spec.md §3 "Record"). `patient_hash` is the
/// pseudonymized identifier produced by `text::hash_nh` or
/// `text::fallback_hash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub tenant: TenantId,
    pub date: NaiveDate,
    pub patient_hash: String,
    pub age: f64,
    pub sex: Sex,
    pub scope: ScopeId,
    pub service: ServiceId,
    pub sample_type: SampleTypeId,
}

/// Fields that must match exactly for two rows to describe the same Record
/// (spec.md §3 "Uniqueness rule"). Order-insensitive and cheap to compare, so
/// ingestion can use it both as a get-or-create key and as a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub tenant: TenantId,
    pub patient_hash: String,
    pub date: NaiveDate,
    /// Age is compared as milli-years so the key can derive `Eq`/`Hash`
    /// despite `f64` not implementing them; two ages within 0.001 years
    /// collapse to the same bucket, which matches how ages are parsed (at
    /// most a couple of decimal places, spec.md §4.1).
    pub age_milliyears: i64,
    pub sex: Sex,
    pub scope: ScopeId,
    pub service: ServiceId,
    pub sample_type: SampleTypeId,
}

impl Record {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            tenant: self.tenant,
            patient_hash: self.patient_hash.clone(),
            date: self.date,
            age_milliyears: (self.age * 1000.0).round() as i64,
            sex: self.sex,
            scope: self.scope,
            service: self.service,
            sample_type: self.sample_type,
        }
    }
}
