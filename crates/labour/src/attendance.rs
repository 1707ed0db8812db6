use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use scrapyard_core::{DomainError, DomainResult, LabourId, Scope};
use scrapyard_parties::Labourer;

/// Attendance mark for one labourer on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Present" => Some(AttendanceStatus::Present),
            "Absent" => Some(AttendanceStatus::Absent),
            _ => None,
        }
    }
}

/// Stored attendance: at most one per `(labour_id, date)`; re-marking replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub scope: Scope,
    pub labour_id: LabourId,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub marked_at: DateTime<Utc>,
}

/// Command: mark a labourer present or absent for a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkAttendance {
    pub scope: Scope,
    pub labour_id: LabourId,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

impl MarkAttendance {
    /// Check the command against the labourer it names and build the record.
    pub fn into_record(
        self,
        labourer: &Labourer,
        marked_at: DateTime<Utc>,
    ) -> DomainResult<AttendanceRecord> {
        if labourer.id_typed() != self.labour_id {
            return Err(DomainError::invariant("labour_id mismatch"));
        }
        if labourer.scope() != self.scope {
            return Err(DomainError::not_found(format!("labour {}", self.labour_id)));
        }

        Ok(AttendanceRecord {
            scope: self.scope,
            labour_id: self.labour_id,
            date: self.date,
            status: self.status,
            marked_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use scrapyard_core::{CompanyId, GodownId, Money};

    fn scope() -> Scope {
        Scope::new(CompanyId::new(), GodownId::new())
    }

    fn labourer(scope: Scope) -> Labourer {
        Labourer::new(LabourId::new(), scope, "Suresh", Money::new(Decimal::from(500))).unwrap()
    }

    #[test]
    fn marks_today() {
        let scope = scope();
        let labourer = labourer(scope);
        let now = Utc::now();
        let record = MarkAttendance {
            scope,
            labour_id: labourer.id_typed(),
            date: now.date_naive(),
            status: AttendanceStatus::Present,
        }
        .into_record(&labourer, now)
        .unwrap();
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.date, now.date_naive());
    }

    #[test]
    fn labourer_of_another_godown_is_not_found() {
        let labourer = labourer(scope());
        let err = MarkAttendance {
            scope: scope(),
            labour_id: labourer.id_typed(),
            date: Utc::now().date_naive(),
            status: AttendanceStatus::Present,
        }
        .into_record(&labourer, Utc::now())
        .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn status_uses_capitalised_wire_names() {
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::Present).unwrap(),
            "\"Present\""
        );
        assert_eq!(AttendanceStatus::parse("Absent"), Some(AttendanceStatus::Absent));
    }
}
