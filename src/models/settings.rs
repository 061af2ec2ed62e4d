use crate::config::Config;
use crate::filters;
use serde::{Deserialize, Serialize};

/// Display settings handed to every template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub currency: String,
    pub locale: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: "USD".into(),
            locale: "en-US".into(),
        }
    }
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            currency: config.currency.clone(),
            locale: config.locale.clone(),
        }
    }

    /// Format a monetary amount (in cents) with locale formatting and color coding.
    pub fn format_money(&self, cents: &i64) -> String {
        filters::format_money(*cents, &self.currency, &self.locale)
    }

    /// Format a monetary amount (in cents) as plain text without HTML/colors.
    pub fn format_money_plain(&self, cents: &i64) -> String {
        filters::format_money_plain(*cents, &self.currency, &self.locale)
    }

    /// Two-decimal percentage of a fraction; `N/A` when undefined.
    pub fn format_rate(&self, fraction: &Option<f64>) -> String {
        filters::format_rate(*fraction, 2, &self.locale)
    }
}
