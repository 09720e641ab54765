//! Administration endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    ledger::Requester,
    models::{
        loan::{LoanDetails, LoanQuery},
        user::{UserQuery, UserShort},
        Page,
    },
};

use super::{books::PaginatedResponse, AuthenticatedUser};

/// Overview response
#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    /// User statistics
    pub users: UserStats,
    /// Book statistics
    pub books: BookStats,
    /// Loan statistics
    pub loans: LoanStats,
}

#[derive(Serialize, ToSchema)]
pub struct UserStats {
    /// Total number of users
    pub total: i64,
}

#[derive(Serialize, ToSchema)]
pub struct BookStats {
    /// Number of catalog entries
    pub titles: i64,
    /// Copies owned
    pub total_copies: i64,
    /// Copies on the shelf
    pub available_copies: i64,
    /// Copies out on loan
    pub borrowed_copies: i64,
}

#[derive(Serialize, ToSchema)]
pub struct LoanStats {
    /// Active loans
    pub active: i64,
    /// Overdue loans
    pub overdue: i64,
    /// Fines fixed at return and not paid yet
    #[schema(value_type = String)]
    pub outstanding_fines: Decimal,
    /// Fines paid
    #[schema(value_type = String)]
    pub collected_fines: Decimal,
}

/// Library overview
#[utoipa::path(
    get,
    path = "/admin/overview",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Aggregate counts", body = StatsResponse),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn get_overview(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<StatsResponse>> {
    claims.require_admin()?;

    let stats = state.services.stats.get_stats().await?;
    Ok(Json(stats))
}

/// List users with search and pagination
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "List of users", body = PaginatedResponse<UserShort>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<PaginatedResponse<UserShort>>> {
    claims.require_admin()?;

    let page = Page::new(query.page, query.per_page)?;
    let (users, total) = state.services.auth.search_users(&query, page).await?;

    Ok(Json(PaginatedResponse::new(users, total, page)))
}

/// List all loans with filters and pagination
#[utoipa::path(
    get,
    path = "/admin/loans",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(LoanQuery),
    responses(
        (status = 200, description = "List of loans", body = PaginatedResponse<LoanDetails>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<PaginatedResponse<LoanDetails>>> {
    claims.require_admin()?;

    let page = Page::new(query.page, query.per_page)?;
    let (loans, total) = state.services.loans.search_loans(&query, page).await?;

    Ok(Json(PaginatedResponse::new(loans, total, page)))
}

/// Return a book on behalf of its borrower
#[utoipa::path(
    post,
    path = "/admin/loans/{id}/return",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Book returned, fine computed", body = LoanDetails),
        (status = 403, description = "Administrator privileges required"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<LoanDetails>> {
    claims.require_admin()?;

    tracing::info!(loan_id, admin_id = claims.user_id, "Administrator return");
    let loan = state
        .services
        .loans
        .return_loan(loan_id, Requester::Administrator)
        .await?;
    Ok(Json(loan))
}
