use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
    Other,
}

impl TransactionType {
    /// Maps the export's `type` column. Copilot exports use `regular` for
    /// ordinary spending; anything unrecognised (transfers, etc.) is `Other`.
    /// Returns `None` only for an empty value.
    pub fn from_export(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        Some(match value.to_ascii_lowercase().as_str() {
            "income" => Self::Income,
            "regular" | "expense" => Self::Expense,
            _ => Self::Other,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Posted,
    Excluded,
    Pending,
}

impl FromStr for TransactionStatus {
    type Err = ();

    /// Lenient: `cleared`, `posted` and anything else unknown map to `Posted`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "excluded" => Ok(Self::Excluded),
            "pending" => Ok(Self::Pending),
            _ => Ok(Self::Posted),
        }
    }
}

/// A single row of the uploaded export.
///
/// Amounts are signed cents. Income is stored negative (its magnitude is the
/// income value); expenses are positive, refunds negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub amount_cents: i64,
    pub transaction_type: TransactionType,
    pub category: Option<String>,
    pub merchant: String,
    pub account: Option<String>,
    pub status: TransactionStatus,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.transaction_type == TransactionType::Income
    }

    pub fn is_excluded(&self) -> bool {
        self.status == TransactionStatus::Excluded
    }

    /// The category, if present and non-blank.
    pub fn category_name(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    pub fn account_name(&self) -> Option<&str> {
        self.account
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_from_export() {
        assert_eq!(
            TransactionType::from_export("income"),
            Some(TransactionType::Income)
        );
        assert_eq!(
            TransactionType::from_export("Regular"),
            Some(TransactionType::Expense)
        );
        assert_eq!(
            TransactionType::from_export("internal transfer"),
            Some(TransactionType::Other)
        );
        assert_eq!(TransactionType::from_export("  "), None);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "excluded".parse::<TransactionStatus>(),
            Ok(TransactionStatus::Excluded)
        );
        assert_eq!(
            "Pending".parse::<TransactionStatus>(),
            Ok(TransactionStatus::Pending)
        );
        assert_eq!(
            "cleared".parse::<TransactionStatus>(),
            Ok(TransactionStatus::Posted)
        );
    }

    #[test]
    fn test_blank_category_is_none() {
        let t = Transaction {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            amount_cents: 100,
            transaction_type: TransactionType::Expense,
            category: Some("   ".into()),
            merchant: "Shop".into(),
            account: None,
            status: TransactionStatus::Posted,
        };
        assert_eq!(t.category_name(), None);
    }
}
