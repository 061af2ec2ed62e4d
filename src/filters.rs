//! Money and percentage formatting for the dashboard.
//!
//! Format: sign + currency symbol + number with thousands separator
//!
//! Color coding (HTML variant only):
//! - Positive amounts (> 0): green
//! - Negative amounts (< 0): red
//! - Zero (= 0): default text color

/// Format cents as a colored money display with proper locale formatting.
/// Returns HTML with appropriate Tailwind color classes.
pub fn format_money(cents: i64, currency: &str, locale: &str) -> String {
    let color_class = if cents > 0 {
        "text-green-600 dark:text-green-400"
    } else if cents < 0 {
        "text-red-600 dark:text-red-400"
    } else {
        "text-gray-900 dark:text-gray-100"
    };
    format!(
        r#"<span class="{}">{}</span>"#,
        color_class,
        format_money_plain(cents, currency, locale)
    )
}

/// Format cents as plain text. Only negative amounts carry a sign.
/// Example: -123456 -> "-$1,234.56"
pub fn format_money_plain(cents: i64, currency: &str, locale: &str) -> String {
    let neutral = format_money_neutral(cents, currency, locale);
    if cents < 0 {
        format!("-{}", neutral)
    } else {
        neutral
    }
}

/// Format cents without any sign, useful for flow magnitudes.
pub fn format_money_neutral(cents: i64, currency: &str, locale: &str) -> String {
    let abs_cents = cents.unsigned_abs();
    let whole = abs_cents / 100;
    let fractional = abs_cents % 100;

    let (thousands_sep, decimal_sep) = locale_separators(locale);
    let whole_str = format_with_thousands(whole, thousands_sep);
    let symbol = currency_symbol(currency);

    format!("{}{}{}{:02}", symbol, whole_str, decimal_sep, fractional)
}

/// Format a fraction (0.85 = 85%) as a percentage with `decimals` places.
/// Example: (0.1234, 2) -> "12.34%" (en-US) or "12,34%" (de-DE)
pub fn format_percent(fraction: f64, decimals: usize, locale: &str) -> String {
    let (_, decimal_sep) = locale_separators(locale);
    let formatted = format!("{:.*}", decimals, fraction * 100.0);
    // Avoid "-0.0%" for tiny negative values.
    let formatted = if formatted.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        formatted.trim_start_matches('-').to_string()
    } else {
        formatted
    };
    format!("{}%", formatted.replace('.', &decimal_sep.to_string()))
}

/// Like [`format_percent`], rendering an undefined rate as `N/A`.
pub fn format_rate(fraction: Option<f64>, decimals: usize, locale: &str) -> String {
    match fraction {
        Some(value) => format_percent(value, decimals, locale),
        None => "N/A".to_string(),
    }
}

/// Get thousands and decimal separators based on locale.
fn locale_separators(locale: &str) -> (char, char) {
    match locale {
        "de-DE" | "de-AT" | "de-CH" | "fr-FR" | "fr-BE" | "fr-CA" | "es-ES" | "es-AR" | "it-IT"
        | "pt-BR" | "pt-PT" | "nl-NL" | "nl-BE" | "pl-PL" | "ru-RU" | "tr-TR" | "vi-VN"
        | "id-ID" | "da-DK" | "nb-NO" | "sv-SE" | "fi-FI" | "cs-CZ" | "sk-SK" | "hu-HU"
        | "ro-RO" | "bg-BG" | "uk-UA" | "el-GR" => ('.', ','),
        _ => (',', '.'),
    }
}

/// Format a number with thousands separators.
fn format_with_thousands(n: u64, sep: char) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);

    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(sep);
        }
        result.push(c);
    }

    result
}

/// Get currency symbol for a currency code.
fn currency_symbol(currency: &str) -> &'static str {
    match currency.to_uppercase().as_str() {
        "USD" => "$",
        "EUR" => "\u{20ac}",
        "GBP" => "\u{00a3}",
        "JPY" => "\u{00a5}",
        "CAD" => "C$",
        "AUD" => "A$",
        "CHF" => "CHF\u{00a0}",
        "INR" => "\u{20b9}",
        "SEK" => "kr\u{00a0}",
        "NZD" => "NZ$",
        _ => "$",
    }
}
