//! Type definitions for the fraud risk service

pub mod decision;
pub mod transaction;

pub use decision::Decision;
pub use transaction::TransactionRecord;
