use chrono::{DateTime, Local, NaiveDate};

use super::Transaction;

/// The transaction table loaded for the current session.
///
/// Replaced wholesale on every upload and never written to disk.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub source_name: String,
    pub loaded_at: DateTime<Local>,
    pub transactions: Vec<Transaction>,
    pub skipped_rows: Vec<String>,
}

impl Ledger {
    pub fn new(source_name: String, transactions: Vec<Transaction>, skipped_rows: Vec<String>) -> Self {
        Self {
            source_name,
            loaded_at: Local::now(),
            transactions,
            skipped_rows,
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Earliest and latest transaction dates, if any rows were loaded.
    pub fn date_extent(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.transactions.iter().map(|t| t.date).min()?;
        let max = self.transactions.iter().map(|t| t.date).max()?;
        Some((min, max))
    }

    pub fn loaded_at_display(&self) -> String {
        self.loaded_at.format("%Y-%m-%d %H:%M").to_string()
    }
}
