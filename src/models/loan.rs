//! Loan record model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::book::BookShort;

/// Lifecycle state of a loan record.
///
/// Transitions only move forward: `Active` -> `ReturnedUnpaid` -> `ReturnedPaid`.
/// A returned record with a zero fine stays `ReturnedUnpaid` for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    ReturnedUnpaid,
    ReturnedPaid,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::ReturnedUnpaid => "returned_unpaid",
            LoanStatus::ReturnedPaid => "returned_paid",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Loan record from database. Never deleted: it is the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanRecord {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub borrowed_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    /// Fine fixed at return time
    #[schema(value_type = String)]
    pub fine: Decimal,
    pub fine_paid: bool,
}

impl LoanRecord {
    pub fn is_returned(&self) -> bool {
        self.returned_at.is_some()
    }

    pub fn status(&self) -> LoanStatus {
        match (self.returned_at, self.fine_paid) {
            (None, _) => LoanStatus::Active,
            (Some(_), false) => LoanStatus::ReturnedUnpaid,
            (Some(_), true) => LoanStatus::ReturnedPaid,
        }
    }

    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_returned() && now > self.due_at
    }
}

/// A loan that passed the availability check and is ready to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoanRecord {
    pub user_id: i32,
    pub book_id: i32,
    pub borrowed_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
}

/// Loan joined with the title and author of its book
#[derive(Debug, Clone, FromRow)]
pub struct LoanWithBookRow {
    #[sqlx(flatten)]
    pub loan: LoanRecord,
    pub title: String,
    pub author: String,
}

/// Loan with full details for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub user_id: i32,
    pub book: BookShort,
    pub borrowed_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    /// Stored fine (zero until the book is returned)
    #[schema(value_type = String)]
    pub fine: Decimal,
    /// Fine owed if the book were returned now; equals `fine` once returned
    #[schema(value_type = String)]
    pub projected_fine: Decimal,
    pub fine_paid: bool,
    pub status: LoanStatus,
    pub is_overdue: bool,
}

/// Borrow request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLoan {
    pub book_id: i32,
}

/// Loan query parameters (admin listing)
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LoanQuery {
    /// Filter by lifecycle state
    pub status: Option<LoanStatus>,
    /// Filter by borrower
    pub user_id: Option<i32>,
    /// Filter by book
    pub book_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
