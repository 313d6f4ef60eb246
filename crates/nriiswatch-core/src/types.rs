//! Record and probe types moved across the seams.

use serde::{Deserialize, Serialize};

/// One pending proposal scraped from the list page. Transient: produced
/// per cycle, relayed, dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRecord {
    /// Proposal identifier (first grid column).
    pub id: String,
    pub title: String,
    /// Principal researcher, split out of the combined title cell.
    pub researcher: String,
    /// Faculty/department, split out of the combined title cell.
    pub department: String,
    pub budget: String,
    pub funding_source: String,
    pub funding_agency: String,
    pub status: String,
    /// Certification deadline.
    pub deadline: String,
}

/// Extractor output for one cycle.
///
/// `count > 0` with empty `rows` is a reportable parse inconsistency,
/// distinct from the legitimate `count == 0` case. The extractor never
/// decides that; callers do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSnapshot {
    pub count: u32,
    pub rows: Vec<ProposalRecord>,
}

/// Result of one session check against the list page.
#[derive(Debug, Clone, Default)]
pub struct AccessProbe {
    /// Authenticated: not bounced to the login page and at least one of
    /// the expected elements is present.
    pub ok: bool,
    pub login_page: bool,
    pub has_table: bool,
    pub has_count: bool,
    /// Final URL after redirects, or the transport error text.
    pub detail: String,
}

impl AccessProbe {
    /// Probe that never reached a document at all.
    pub fn unreachable(detail: impl Into<String>) -> Self {
        Self { ok: false, detail: detail.into(), ..Self::default() }
    }
}

/// Wire form of one relayed record. The single-letter keys are the
/// spreadsheet column mapping the Apps Script endpoint expects; `a` is
/// the Thai-locale timestamp of the relay call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetPayload {
    pub a: String,
    pub s: String,
    pub d: String,
    pub f: String,
    pub g: String,
    pub h: String,
    pub j: String,
    pub k: String,
    pub l: String,
    pub z: String,
}

impl SheetPayload {
    pub fn from_record(record: &ProposalRecord, timestamp: String) -> Self {
        Self {
            a: timestamp,
            s: record.id.clone(),
            d: record.title.clone(),
            f: record.researcher.clone(),
            g: record.department.clone(),
            h: record.budget.clone(),
            j: record.funding_source.clone(),
            k: record.funding_agency.clone(),
            l: record.status.clone(),
            z: record.deadline.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_keys_follow_the_sheet_mapping() {
        let record = ProposalRecord {
            id: "2569A001".into(),
            title: "โครงการทดสอบ".into(),
            researcher: "สมชาย ใจดี".into(),
            department: "วิศวกรรมศาสตร์".into(),
            budget: "1,000,000".into(),
            funding_source: "สกสว.".into(),
            funding_agency: "วช.".into(),
            status: "รอการรับรอง".into(),
            deadline: "30/9/2569".into(),
        };
        let payload = SheetPayload::from_record(&record, "30/8/2569 09:00:00".into());
        let json: serde_json::Value = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["a"], "30/8/2569 09:00:00");
        assert_eq!(json["s"], "2569A001");
        assert_eq!(json["d"], "โครงการทดสอบ");
        assert_eq!(json["l"], "รอการรับรอง");
        assert_eq!(json["z"], "30/9/2569");
        assert_eq!(json.as_object().unwrap().len(), 10);
    }

    #[test]
    fn unreachable_probe_is_not_ok() {
        let probe = AccessProbe::unreachable("connect timeout");
        assert!(!probe.ok);
        assert_eq!(probe.detail, "connect timeout");
    }
}
