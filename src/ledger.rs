//! Loan ledger: the borrow, return and fine payment rules.
//!
//! Everything here is synchronous and side-effect free apart from the records
//! handed in. Callers load the rows under lock, apply one operation and persist
//! the result in the same transaction. An `Err` never leaves a record modified.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    config::LoansConfig,
    models::{Book, LoanRecord, NewLoanRecord},
};

/// Rejections of a ledger operation. None of them changes state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Book {0} is unavailable")]
    BookUnavailable(i32),

    #[error("Loan {0} has already been returned")]
    AlreadyReturned(i32),

    #[error("Loan {0} is held by another user")]
    NotOwner(i32),

    #[error("Loan {0} has no fine to pay")]
    NothingToPay(i32),

    #[error("Book {0} already has all its copies on the shelf")]
    ShelfFull(i32),
}

/// Who asks for a return or a payment.
///
/// The request layer maps an authenticated administrator to `Administrator`;
/// everybody else acts as a `Member` on their own records only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    Member(i32),
    Administrator,
}

impl Requester {
    fn may_act_on(&self, loan: &LoanRecord) -> bool {
        match self {
            Requester::Member(user_id) => *user_id == loan.user_id,
            Requester::Administrator => true,
        }
    }
}

/// Loan period and fine schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanPolicy {
    pub loan_period: Duration,
    /// Lateness below or equal to this is free
    pub grace_period: Duration,
    /// Each started unit past the grace period is charged
    pub fine_unit: Duration,
    pub fine_per_unit: Decimal,
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self {
            loan_period: Duration::days(7),
            grace_period: Duration::seconds(60),
            fine_unit: Duration::seconds(60),
            fine_per_unit: Decimal::ONE,
        }
    }
}

/// Expects settings that passed `LoansConfig::validate`
impl From<&LoansConfig> for LoanPolicy {
    fn from(config: &LoansConfig) -> Self {
        Self {
            loan_period: Duration::days(config.loan_period_days),
            grace_period: Duration::seconds(config.grace_period_seconds),
            fine_unit: Duration::seconds(config.fine_unit_seconds),
            fine_per_unit: config.fine_per_unit,
        }
    }
}

impl LoanPolicy {
    pub fn due_at(&self, borrowed_at: DateTime<Utc>) -> DateTime<Utc> {
        borrowed_at + self.loan_period
    }

    /// Number of fine units owed for a book handed back at `at`
    pub fn overdue_units(&self, due_at: DateTime<Utc>, at: DateTime<Utc>) -> i64 {
        let excess = (at - due_at) - self.grace_period;
        if excess <= Duration::zero() {
            return 0;
        }

        let unit_us = self.fine_unit.num_microseconds().unwrap_or(i64::MAX).max(1);
        let excess_us = excess.num_microseconds().unwrap_or(i64::MAX);
        let whole = excess_us / unit_us;

        // Any remainder, down to the nanosecond, starts another unit.
        if Duration::microseconds(whole * unit_us) < excess {
            whole + 1
        } else {
            whole
        }
    }

    pub fn fine(&self, due_at: DateTime<Utc>, at: DateTime<Utc>) -> Decimal {
        self.fine_per_unit * Decimal::from(self.overdue_units(due_at, at))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    policy: LoanPolicy,
}

impl Ledger {
    pub fn new(policy: LoanPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &LoanPolicy {
        &self.policy
    }

    /// Take one copy of `book` off the shelf for `user_id`
    pub fn borrow(
        &self,
        book: &mut Book,
        user_id: i32,
        now: DateTime<Utc>,
    ) -> Result<NewLoanRecord, LedgerError> {
        if !book.is_available() {
            return Err(LedgerError::BookUnavailable(book.id));
        }

        book.available_copies -= 1;

        Ok(NewLoanRecord {
            user_id,
            book_id: book.id,
            borrowed_at: now,
            due_at: self.policy.due_at(now),
        })
    }

    /// Close an active loan, fix its fine and put the copy back on the shelf
    pub fn return_loan(
        &self,
        loan: &mut LoanRecord,
        book: &mut Book,
        requester: Requester,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        debug_assert_eq!(loan.book_id, book.id);

        if !requester.may_act_on(loan) {
            return Err(LedgerError::NotOwner(loan.id));
        }
        if loan.is_returned() {
            return Err(LedgerError::AlreadyReturned(loan.id));
        }
        if book.available_copies >= book.total_copies {
            return Err(LedgerError::ShelfFull(book.id));
        }

        // returned_at never precedes borrowed_at, even with a clock step back.
        let returned_at = now.max(loan.borrowed_at);

        loan.fine = self.policy.fine(loan.due_at, returned_at);
        loan.returned_at = Some(returned_at);
        book.available_copies += 1;

        Ok(())
    }

    /// Mark the fine of a returned loan as paid
    pub fn pay_fine(&self, loan: &mut LoanRecord, requester: Requester) -> Result<(), LedgerError> {
        if !requester.may_act_on(loan) {
            return Err(LedgerError::NotOwner(loan.id));
        }
        if !loan.is_returned() || loan.fine <= Decimal::ZERO || loan.fine_paid {
            return Err(LedgerError::NothingToPay(loan.id));
        }

        loan.fine_paid = true;
        Ok(())
    }

    /// Stored fine for returned loans, live fine for active ones
    pub fn projected_fine(&self, loan: &LoanRecord, now: DateTime<Utc>) -> Decimal {
        match loan.returned_at {
            Some(_) => loan.fine,
            None => self.policy.fine(loan.due_at, now),
        }
    }
}
