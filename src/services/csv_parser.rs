use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{debug, trace, warn};

use crate::error::AppError;
use crate::models::{Transaction, TransactionStatus, TransactionType};

/// Columns every upload must carry. The merchant column may be named
/// `name`, `merchant` or `payee`.
pub const REQUIRED_COLUMNS: &[&str] = &["date", "amount", "type", "category", "name", "status"];

const MERCHANT_ALIASES: &[&str] = &["name", "merchant", "payee"];

#[derive(Debug)]
pub struct ParseResult {
    pub transactions: Vec<Transaction>,
    pub errors: Vec<String>,
}

/// Parse a transaction export.
///
/// Fails only when the file as a whole is unusable (not UTF-8, no header,
/// missing required column). Individual bad rows are skipped and reported in
/// [`ParseResult::errors`].
pub fn parse_csv(content: &[u8]) -> Result<ParseResult, AppError> {
    trace!(content_size = content.len(), "Starting CSV parsing");

    let content_str =
        std::str::from_utf8(content).map_err(|e| AppError::CsvParse(e.to_string()))?;
    let content_str = content_str.trim_start_matches('\u{feff}');

    if content_str.trim().is_empty() {
        return Err(AppError::CsvParse("The uploaded file is empty".into()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content_str.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::CsvParse(e.to_string()))?
        .clone();

    debug!(column_count = headers.len(), "CSV headers parsed");

    let date_col = require_column(&headers, "date")?;
    let amount_col = require_column(&headers, "amount")?;
    let type_col = require_column(&headers, "type")?;
    let category_col = require_column(&headers, "category")?;
    let status_col = require_column(&headers, "status")?;
    let merchant_col = MERCHANT_ALIASES
        .iter()
        .find_map(|name| find_column(&headers, name))
        .ok_or_else(|| {
            AppError::CsvParse("No name/merchant/payee column found in CSV".into())
        })?;

    let account_col = find_column(&headers, "account");
    let excluded_col = find_column(&headers, "excluded");

    let mut transactions = Vec::new();
    let mut errors = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let row_number = row_idx + 2;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                errors.push(format!("Row {}: {}", row_number, e));
                continue;
            }
        };

        let raw_date = record.get(date_col).unwrap_or("");
        let raw_amount = record.get(amount_col).unwrap_or("");
        let raw_type = record.get(type_col).unwrap_or("");

        if raw_date.is_empty() || raw_amount.is_empty() {
            errors.push(format!("Row {}: Missing date or amount", row_number));
            continue;
        }

        let Some(date) = parse_date(raw_date) else {
            errors.push(format!("Row {}: Invalid date '{}'", row_number, raw_date));
            continue;
        };

        let Some(amount_cents) = parse_amount_cents(raw_amount) else {
            errors.push(format!("Row {}: Invalid amount '{}'", row_number, raw_amount));
            continue;
        };

        let Some(transaction_type) = TransactionType::from_export(raw_type) else {
            errors.push(format!("Row {}: Missing type", row_number));
            continue;
        };

        let excluded_flag = excluded_col
            .and_then(|col| record.get(col))
            .map(is_truthy)
            .unwrap_or(false);
        let status = if excluded_flag {
            TransactionStatus::Excluded
        } else {
            record
                .get(status_col)
                .unwrap_or("")
                .parse::<TransactionStatus>()
                .unwrap_or(TransactionStatus::Posted)
        };

        transactions.push(Transaction {
            date,
            amount_cents,
            transaction_type,
            category: get_optional_field(&record, Some(category_col)),
            merchant: record.get(merchant_col).unwrap_or("").to_string(),
            account: get_optional_field(&record, account_col),
            status,
        });
    }

    if !errors.is_empty() {
        warn!(
            error_count = errors.len(),
            "CSV parsing completed with errors"
        );
    }
    debug!(
        row_count = transactions.len(),
        error_count = errors.len(),
        "CSV parsing completed"
    );

    Ok(ParseResult {
        transactions,
        errors,
    })
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
}

fn require_column(headers: &csv::StringRecord, name: &str) -> Result<usize, AppError> {
    find_column(headers, name)
        .ok_or_else(|| AppError::CsvParse(format!("No {} column found in CSV", name)))
}

fn get_optional_field(record: &csv::StringRecord, col: Option<usize>) -> Option<String> {
    col.and_then(|c| record.get(c))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "1"
    )
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, RFC 3339 and `MM/DD/YYYY`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    NaiveDate::parse_from_str(value, "%m/%d/%Y").ok()
}

/// Largest accepted magnitude in cents (ten trillion in major units).
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000_000;

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹', '₩', '₽', '₺', '₪', '¢'];

/// Parse a decimal amount into cents without going through floating point.
///
/// Currency symbols, spaces and thousands separators are dropped. A value
/// wrapped in parentheses is negative. Extra fraction digits are rounded
/// half away from zero. Letters, a misplaced or repeated sign, a second
/// decimal point, or a magnitude above [`MAX_AMOUNT_CENTS`] make the
/// amount invalid.
pub fn parse_amount_cents(value: &str) -> Option<i64> {
    let cleaned = clean_amount(value)?;
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };

    let (whole, fraction) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut fraction_digits = fraction.bytes().map(|b| i64::from(b - b'0'));
    let tenths = fraction_digits.next().unwrap_or(0);
    let hundredths = fraction_digits.next().unwrap_or(0);
    let round_up = fraction_digits.next().is_some_and(|d| d >= 5);

    let mut cents = whole.checked_mul(100)?.checked_add(tenths * 10 + hundredths)?;
    if round_up {
        cents = cents.checked_add(1)?;
    }
    if cents > MAX_AMOUNT_CENTS {
        return None;
    }

    Some(if negative { -cents } else { cents })
}

/// Normalize to `[-]digits[.digits]`, or `None` if the value is not a number.
fn clean_amount(amount: &str) -> Option<String> {
    let amount = amount.trim();
    let (parenthesized, amount) = match amount
        .strip_prefix('(')
        .and_then(|a| a.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, amount),
    };

    // If both . and , appear, the last one is the decimal separator. A lone
    // comma followed by exactly three digits is a thousands separator.
    let last_dot = amount.rfind('.');
    let last_comma = amount.rfind(',');

    let decimal_char = match (last_dot, last_comma) {
        (Some(d), Some(c)) => {
            if d > c {
                Some('.')
            } else {
                Some(',')
            }
        }
        (Some(_), None) => Some('.'),
        (None, Some(c)) => {
            let tail = &amount[c + 1..];
            if tail.len() == 3 && tail.chars().all(|ch| ch.is_ascii_digit()) {
                None
            } else {
                Some(',')
            }
        }
        (None, None) => None,
    };
    let thousands_char = if decimal_char == Some(',') { '.' } else { ',' };

    let mut result = String::new();
    let mut has_sign = parenthesized;
    let mut has_digit = false;
    let mut has_decimal = false;

    if parenthesized {
        result.push('-');
    }

    for c in amount.chars() {
        if c.is_ascii_digit() {
            result.push(c);
            has_digit = true;
        } else if Some(c) == decimal_char {
            if has_decimal {
                return None;
            }
            result.push('.');
            has_decimal = true;
        } else if c == thousands_char {
            if has_decimal {
                return None;
            }
        } else if c == '-' || c == '+' {
            // A sign may only lead the number.
            if has_sign || has_digit || has_decimal {
                return None;
            }
            has_sign = true;
            if c == '-' {
                result.push('-');
            }
        } else if !(c.is_whitespace() || CURRENCY_SYMBOLS.contains(&c)) {
            return None;
        }
    }

    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "date,name,amount,status,category,type,account,excluded";

    fn csv_with(rows: &[&str]) -> Vec<u8> {
        let mut csv = String::from(HEADER);
        for row in rows {
            csv.push('\n');
            csv.push_str(row);
        }
        csv.into_bytes()
    }

    #[test]
    fn test_parse_sample_export() {
        let csv = csv_with(&[
            "2026-01-01,Salary,-5000.00,cleared,Salary,income,Checking,false",
            "2026-01-02,Grocery Store,85.50,cleared,Food & Dining,regular,Credit Card,false",
        ]);

        let result = parse_csv(&csv).unwrap();
        assert_eq!(result.transactions.len(), 2);
        assert!(result.errors.is_empty());

        let salary = &result.transactions[0];
        assert_eq!(salary.date, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(salary.amount_cents, -500000);
        assert_eq!(salary.transaction_type, TransactionType::Income);
        assert_eq!(salary.status, TransactionStatus::Posted);
        assert_eq!(salary.account.as_deref(), Some("Checking"));

        let grocery = &result.transactions[1];
        assert_eq!(grocery.merchant, "Grocery Store");
        assert_eq!(grocery.amount_cents, 8550);
        assert_eq!(grocery.category.as_deref(), Some("Food & Dining"));
        assert_eq!(grocery.transaction_type, TransactionType::Expense);
    }

    #[test]
    fn test_excluded_column_overrides_status() {
        let csv = csv_with(&["2026-01-02,Shop,10.00,cleared,Food,regular,Card,true"]);
        let result = parse_csv(&csv).unwrap();
        assert_eq!(result.transactions[0].status, TransactionStatus::Excluded);
    }

    #[test]
    fn test_status_values() {
        let csv = csv_with(&[
            "2026-01-02,A,10.00,pending,Food,regular,Card,false",
            "2026-01-02,B,10.00,excluded,Food,regular,Card,",
        ]);
        let result = parse_csv(&csv).unwrap();
        assert_eq!(result.transactions[0].status, TransactionStatus::Pending);
        assert_eq!(result.transactions[1].status, TransactionStatus::Excluded);
    }

    #[test]
    fn test_empty_category_is_none() {
        let csv = csv_with(&["2026-01-02,Shop,30.00,cleared,,regular,Card,false"]);
        let result = parse_csv(&csv).unwrap();
        assert_eq!(result.transactions[0].category, None);
    }

    #[test]
    fn test_other_type_is_kept() {
        let csv = csv_with(&["2026-01-02,Transfer,30.00,cleared,Moves,internal transfer,Card,false"]);
        let result = parse_csv(&csv).unwrap();
        assert_eq!(
            result.transactions[0].transaction_type,
            TransactionType::Other
        );
    }

    #[test]
    fn test_parse_empty_file() {
        assert!(parse_csv(b"").is_err());
        assert!(parse_csv(b"   \n").is_err());
    }

    #[test]
    fn test_parse_headers_only() {
        let result = parse_csv(HEADER.as_bytes()).unwrap();
        assert!(result.transactions.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_parse_invalid_utf8() {
        let csv: &[u8] = &[0xFF, 0xFE, b',', b'a'];
        assert!(parse_csv(csv).is_err());
    }

    #[test]
    fn test_missing_required_columns() {
        for missing in ["date", "amount", "type", "category", "status"] {
            let header: Vec<&str> = HEADER.split(',').filter(|c| *c != missing).collect();
            let csv = format!("{}\n", header.join(","));
            let err = parse_csv(csv.as_bytes()).unwrap_err();
            assert!(
                err.to_string().contains(missing),
                "error for missing {} was {}",
                missing,
                err
            );
        }
    }

    #[test]
    fn test_missing_merchant_column() {
        let csv = b"date,amount,status,category,type\n2026-01-01,1.00,cleared,Food,regular";
        assert!(parse_csv(csv).is_err());
    }

    #[test]
    fn test_merchant_aliases_and_minimal_columns() {
        let csv = b"Date,Payee,Amount,Status,Category,Type\n2026-01-01,Cafe,4.50,cleared,Coffee,regular";
        let result = parse_csv(csv).unwrap();
        assert_eq!(result.transactions.len(), 1);
        assert_eq!(result.transactions[0].merchant, "Cafe");
        assert_eq!(result.transactions[0].account, None);
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let csv = csv_with(&[
            "2026-01-01,Valid,10.00,cleared,Food,regular,Card,false",
            "not-a-date,Bad date,10.00,cleared,Food,regular,Card,false",
            "2026-01-03,Bad amount,abc,cleared,Food,regular,Card,false",
            "2026-01-04,No type,10.00,cleared,Food,,Card,false",
            ",No date,10.00,cleared,Food,regular,Card,false",
            "2026-01-06,Also valid,5.00,cleared,Food,regular,Card,false",
            "2026-01-07,Scientific,1e5,cleared,Food,regular,Card,false",
        ]);
        let result = parse_csv(&csv).unwrap();
        assert_eq!(result.transactions.len(), 2);
        assert_eq!(result.errors.len(), 5);
        assert!(result.errors[0].starts_with("Row 3:"));
        assert!(result.errors[1].contains("Invalid amount"));
        assert!(result.errors[2].contains("Missing type"));
        assert!(result.errors[3].contains("Missing date"));
        assert!(result.errors[4].starts_with("Row 8: Invalid amount"));
    }

    #[test]
    fn test_quoted_fields() {
        let csv = csv_with(&[
            "2026-01-01,\"Smith, Jones & Co\",\"1,250.00\",cleared,Services,regular,Card,false",
        ]);
        let result = parse_csv(&csv).unwrap();
        assert_eq!(result.transactions[0].merchant, "Smith, Jones & Co");
        assert_eq!(result.transactions[0].amount_cents, 125000);
    }

    #[test]
    fn test_parse_dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert_eq!(parse_date("2024-01-15"), expected);
        assert_eq!(parse_date("2024-01-15 08:30:00"), expected);
        assert_eq!(parse_date("2024-01-15T08:30:00Z"), expected);
        assert_eq!(parse_date("01/15/2024"), expected);
        assert_eq!(parse_date("2024-13-01"), None);
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_parse_amount_cents() {
        assert_eq!(parse_amount_cents("50.00"), Some(5000));
        assert_eq!(parse_amount_cents("-5000.00"), Some(-500000));
        assert_eq!(parse_amount_cents("$1,234.56"), Some(123456));
        assert_eq!(parse_amount_cents("-$25.5"), Some(-2550));
        assert_eq!(parse_amount_cents("100"), Some(10000));
        assert_eq!(parse_amount_cents(".75"), Some(75));
        assert_eq!(parse_amount_cents("(12.00)"), Some(-1200));
        assert_eq!(parse_amount_cents("1.234,56"), Some(123456));
        assert_eq!(parse_amount_cents("50,00"), Some(5000));
        assert_eq!(parse_amount_cents("1,000"), Some(100000));
        assert_eq!(parse_amount_cents("abc"), None);
        assert_eq!(parse_amount_cents(""), None);
        assert_eq!(parse_amount_cents("12abc"), None);
        assert_eq!(parse_amount_cents("1.2.3"), None);
        assert_eq!(parse_amount_cents("1e5"), None);
        assert_eq!(parse_amount_cents("5-"), None);
        assert_eq!(parse_amount_cents("--5"), None);
        assert_eq!(parse_amount_cents("+5"), Some(500));
        assert_eq!(parse_amount_cents("€ 1 234.50"), Some(123450));
    }

    #[test]
    fn test_parse_amount_magnitude_limit() {
        assert_eq!(
            parse_amount_cents("10000000000000.00"),
            Some(MAX_AMOUNT_CENTS)
        );
        assert_eq!(parse_amount_cents("10000000000000.01"), None);
        assert_eq!(parse_amount_cents("-99999999999999999999"), None);
    }

    #[test]
    fn test_parse_amount_rounding() {
        assert_eq!(parse_amount_cents("10.005"), Some(1001));
        assert_eq!(parse_amount_cents("10.004"), Some(1000));
        assert_eq!(parse_amount_cents("-10.005"), Some(-1001));
    }

    #[test]
    fn test_bom_is_ignored() {
        let mut csv = "\u{feff}".as_bytes().to_vec();
        csv.extend(csv_with(&["2026-01-01,A,1.00,cleared,Food,regular,Card,false"]));
        let result = parse_csv(&csv).unwrap();
        assert_eq!(result.transactions.len(), 1);
    }

    #[test]
    fn test_parse_large_csv() {
        let mut csv = String::from(HEADER);
        for i in 0..1000 {
            csv.push_str(&format!(
                "\n2024-01-15,Item {},{}.00,cleared,Food,regular,Card,false",
                i, i
            ));
        }
        let result = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(result.transactions.len(), 1000);
        assert!(result.errors.is_empty());
    }
}
