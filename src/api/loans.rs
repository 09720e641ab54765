//! Loan endpoints for the authenticated member

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::loan::{CreateLoan, LoanDetails},
};

use super::AuthenticatedUser;

/// Fines of the current user
#[derive(Serialize, ToSchema)]
pub struct FinesResponse {
    /// Loans with a stored or projected fine
    pub loans: Vec<LoanDetails>,
    /// Sum of fines not paid yet, including live fines of overdue loans
    #[schema(value_type = String)]
    pub total_owed: Decimal,
}

impl FinesResponse {
    pub fn from_loans(loans: Vec<LoanDetails>) -> Self {
        let total_owed: Decimal = loans
            .iter()
            .filter(|loan| !loan.fine_paid)
            .map(|loan| loan.projected_fine)
            .sum();
        Self { loans, total_owed }
    }
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Book borrowed", body = LoanDetails),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book unavailable")
    )
)]
pub async fn create_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateLoan>,
) -> AppResult<(StatusCode, Json<LoanDetails>)> {
    let loan = state
        .services
        .loans
        .borrow(claims.user_id, request.book_id)
        .await?;

    Ok((StatusCode::CREATED, Json(loan)))
}

/// List the current user's loans with live fines
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Loans of the current user", body = Vec<LoanDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_my_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.loans.get_user_loans(claims.user_id).await?;
    Ok(Json(loans))
}

/// List the current user's fines
#[utoipa::path(
    get,
    path = "/loans/fines",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Fines of the current user", body = FinesResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_my_fines(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<FinesResponse>> {
    let loans = state.services.loans.get_user_fines(claims.user_id).await?;
    Ok(Json(FinesResponse::from_loans(loans)))
}

/// Get one of the current user's loans
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan details", body = LoanDetails),
        (status = 403, description = "Loan held by another user"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.loans.get_loan(loan_id, user.member()).await?;
    Ok(Json(loan))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Book returned, fine computed", body = LoanDetails),
        (status = 403, description = "Loan held by another user"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.loans.return_loan(loan_id, user.member()).await?;
    Ok(Json(loan))
}

/// Pay the fine of a returned loan
#[utoipa::path(
    post,
    path = "/loans/{id}/pay",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Fine paid", body = LoanDetails),
        (status = 403, description = "Loan held by another user"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Nothing to pay")
    )
)]
pub async fn pay_fine(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.loans.pay_fine(loan_id, user.member()).await?;
    Ok(Json(loan))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use crate::models::{book::BookShort, LoanStatus};

    fn loan(id: i32, projected_fine: i64, fine_paid: bool) -> LoanDetails {
        let now = Utc::now();
        LoanDetails {
            id,
            user_id: 1,
            book: BookShort {
                id: 1,
                title: "1984".to_string(),
                author: "George Orwell".to_string(),
            },
            borrowed_at: now - Duration::days(10),
            due_at: now - Duration::days(3),
            returned_at: Some(now),
            fine: Decimal::from(projected_fine),
            projected_fine: Decimal::from(projected_fine),
            fine_paid,
            status: if fine_paid {
                LoanStatus::ReturnedPaid
            } else {
                LoanStatus::ReturnedUnpaid
            },
            is_overdue: false,
        }
    }

    #[test]
    fn test_total_owed_skips_paid_fines() {
        let response = FinesResponse::from_loans(vec![loan(1, 5, false), loan(2, 40, true), loan(3, 7, false)]);
        assert_eq!(response.total_owed, Decimal::from(12));
        assert_eq!(response.loans.len(), 3);
    }

    #[test]
    fn test_total_owed_of_no_fines_is_zero() {
        assert_eq!(FinesResponse::from_loans(Vec::new()).total_owed, Decimal::ZERO);
    }
}
