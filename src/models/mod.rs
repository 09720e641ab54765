//! Data models for the library ledger

pub mod book;
pub mod loan;
pub mod page;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookShort};
pub use loan::{LoanDetails, LoanRecord, LoanStatus, NewLoanRecord};
pub use page::Page;
pub use user::{User, UserShort};
