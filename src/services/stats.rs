//! Statistics service for the administrator overview

use chrono::Utc;

use crate::{
    api::admin::{BookStats, LoanStats, StatsResponse, UserStats},
    error::AppResult,
    repository::Repository,
};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Aggregate counts over users, books and loans
    pub async fn get_stats(&self) -> AppResult<StatsResponse> {
        let users_total = self.repository.users.count().await?;
        let (titles, total_copies, available_copies) = self.repository.books.count_copies().await?;

        let loans = &self.repository.loans;
        let active = loans.count_active().await?;
        let overdue = loans.count_overdue(Utc::now()).await?;
        let outstanding_fines = loans.sum_fines(false).await?;
        let collected_fines = loans.sum_fines(true).await?;

        Ok(StatsResponse {
            users: UserStats { total: users_total },
            books: BookStats {
                titles,
                total_copies,
                available_copies,
                borrowed_copies: total_copies - available_copies,
            },
            loans: LoanStats {
                active,
                overdue,
                outstanding_fines,
                collected_fines,
            },
        })
    }
}
