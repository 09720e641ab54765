//! Loans repository for database operations

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{LoanQuery, LoanRecord, LoanStatus, LoanWithBookRow, NewLoanRecord},
        Page,
    },
};

const LOAN_WITH_BOOK: &str = r#"
    SELECT l.*, b.title, b.author
    FROM loan_records l
    JOIN books b ON b.id = l.book_id
"#;

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan with its book by ID
    pub async fn get_with_book(&self, id: i32) -> AppResult<LoanWithBookRow> {
        sqlx::query_as::<_, LoanWithBookRow>(&format!("{} WHERE l.id = $1", LOAN_WITH_BOOK))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Load a loan and lock its row until the surrounding transaction ends
    pub async fn lock_by_id(&self, conn: &mut PgConnection, id: i32) -> AppResult<LoanRecord> {
        sqlx::query_as::<_, LoanRecord>("SELECT * FROM loan_records WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Insert a new active loan
    pub async fn insert(&self, conn: &mut PgConnection, loan: &NewLoanRecord) -> AppResult<LoanRecord> {
        let created = sqlx::query_as::<_, LoanRecord>(
            r#"
            INSERT INTO loan_records (user_id, book_id, borrowed_at, due_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(loan.user_id)
        .bind(loan.book_id)
        .bind(loan.borrowed_at)
        .bind(loan.due_at)
        .fetch_one(&mut *conn)
        .await?;

        Ok(created)
    }

    /// Persist the return date and fine of a loan that was active
    pub async fn save_return(&self, conn: &mut PgConnection, loan: &LoanRecord) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE loan_records
            SET returned_at = $1, fine = $2
            WHERE id = $3 AND returned_at IS NULL
            "#,
        )
        .bind(loan.returned_at)
        .bind(loan.fine)
        .bind(loan.id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() != 1 {
            return Err(AppError::Internal(format!("Loan {} was not active when saving its return", loan.id)));
        }
        Ok(())
    }

    /// Persist a fine payment
    pub async fn save_payment(&self, conn: &mut PgConnection, loan: &LoanRecord) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE loan_records SET fine_paid = TRUE WHERE id = $1 AND fine_paid = FALSE",
        )
        .bind(loan.id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() != 1 {
            return Err(AppError::Internal(format!("Loan {} was already paid when saving payment", loan.id)));
        }
        Ok(())
    }

    /// Get every loan of a user, newest first
    pub async fn get_user_loans(&self, user_id: i32) -> AppResult<Vec<LoanWithBookRow>> {
        let loans = sqlx::query_as::<_, LoanWithBookRow>(&format!(
            "{} WHERE l.user_id = $1 ORDER BY l.borrowed_at DESC, l.id DESC",
            LOAN_WITH_BOOK
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Search loans with filters and pagination
    pub async fn search(&self, query: &LoanQuery, page: Page) -> AppResult<(Vec<LoanWithBookRow>, i64)> {
        let mut count_builder =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM loan_records l WHERE TRUE");
        push_filters(&mut count_builder, query);
        let total = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::<Postgres>::new(LOAN_WITH_BOOK);
        builder.push(" WHERE TRUE");
        push_filters(&mut builder, query);
        builder
            .push(" ORDER BY l.borrowed_at DESC, l.id DESC LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let loans = builder
            .build_query_as::<LoanWithBookRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((loans, total))
    }

    /// Count active loans
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM loan_records WHERE returned_at IS NULL")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Count active loans past their due date
    pub async fn count_overdue(&self, now: DateTime<Utc>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loan_records WHERE returned_at IS NULL AND due_at < $1",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Sum of stored fines, either already paid or still owed
    pub async fn sum_fines(&self, paid: bool) -> AppResult<Decimal> {
        let sum: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(fine), 0)
            FROM loan_records
            WHERE returned_at IS NOT NULL AND fine > 0 AND fine_paid = $1
            "#,
        )
        .bind(paid)
        .fetch_one(&self.pool)
        .await?;
        Ok(sum)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &LoanQuery) {
    if let Some(user_id) = query.user_id {
        builder.push(" AND l.user_id = ").push_bind(user_id);
    }
    if let Some(book_id) = query.book_id {
        builder.push(" AND l.book_id = ").push_bind(book_id);
    }
    match query.status {
        Some(LoanStatus::Active) => {
            builder.push(" AND l.returned_at IS NULL");
        }
        Some(LoanStatus::ReturnedUnpaid) => {
            builder.push(" AND l.returned_at IS NOT NULL AND l.fine_paid = FALSE");
        }
        Some(LoanStatus::ReturnedPaid) => {
            builder.push(" AND l.returned_at IS NOT NULL AND l.fine_paid = TRUE");
        }
        None => {}
    }
}
