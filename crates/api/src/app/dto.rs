//! Request/response bodies.
//!
//! Identifiers arrive as strings and are parsed in the handlers so a bad id
//! gets the same JSON error shape as every other failure. Quantities accept
//! either JSON numbers or decimal strings.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use scrapyard_core::{LabourId, Money};
use scrapyard_labour::AttendanceRecord;
use scrapyard_parties::Labourer;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ScrapLineRequest {
    pub scrap_type_id: Option<String>,
    pub weight: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct AddFeriwalaRequest {
    pub company_id: Option<String>,
    pub godown_id: Option<String>,
    pub vendor_id: Option<String>,
    pub account_id: Option<String>,
    pub scraps: Option<Vec<ScrapLineRequest>>,
}

#[derive(Debug, Deserialize)]
pub struct AddKabadiwalaRequest {
    pub company_id: Option<String>,
    pub godown_id: Option<String>,
    pub vendor_id: Option<String>,
    pub account_id: Option<String>,
    pub scraps: Option<Vec<ScrapLineRequest>>,
    pub payment_amount: Option<Decimal>,
    pub payment_mode: Option<String>,
    pub note: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Scope and optional date filter shared by the list endpoints.
#[derive(Debug, Deserialize)]
pub struct ScopeQuery {
    pub company_id: Option<String>,
    pub godown_id: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct AddSaleRequest {
    pub company_id: Option<String>,
    pub godown_id: Option<String>,
    pub firm_name: Option<String>,
    pub bill_to: Option<String>,
    pub date: Option<NaiveDate>,
    pub weight: Option<Decimal>,
    pub rate: Option<Decimal>,
    pub gst: Option<Decimal>,
    pub freight: Option<Decimal>,
    pub vehicle_no: Option<String>,
    pub payment_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddSalePaymentRequest {
    pub company_id: Option<String>,
    pub godown_id: Option<String>,
    pub firm_name: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct MarkAttendanceRequest {
    pub company_id: Option<String>,
    pub godown_id: Option<String>,
    pub labour_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddExpenseRequest {
    pub company_id: Option<String>,
    pub godown_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub paid_to: Option<String>,
    pub payment_mode: Option<String>,
    pub amount: Option<Decimal>,
    pub account_id: Option<String>,
    pub created_by_name: Option<String>,
}

/// Scope plus an inclusive date range; either bound may be left out.
#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub company_id: Option<String>,
    pub godown_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LabourerDto {
    pub id: LabourId,
    pub name: String,
    pub daily_wage: Money,
}

impl From<&Labourer> for LabourerDto {
    fn from(l: &Labourer) -> Self {
        Self {
            id: l.id_typed(),
            name: l.name().to_string(),
            daily_wage: l.daily_wage(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AttendanceDto {
    pub labour_id: LabourId,
    pub date: NaiveDate,
    pub status: &'static str,
}

impl From<&AttendanceRecord> for AttendanceDto {
    fn from(a: &AttendanceRecord) -> Self {
        Self {
            labour_id: a.labour_id,
            date: a.date,
            status: a.status.as_str(),
        }
    }
}
