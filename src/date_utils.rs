use std::str::FromStr;

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Serialize, Serializer};

/// Trait for filter params that support date filtering with presets and navigation.
#[allow(clippy::wrong_self_convention)]
pub trait DateFilterable {
    fn from_date(&self) -> Option<&String>;
    fn to_date(&self) -> Option<&String>;
    fn preset(&self) -> Option<&String>;

    /// Override to support prev/next navigation. Defaults to None.
    fn nav(&self) -> Option<&String> {
        None
    }

    fn resolve_date_range(&self) -> DateRange {
        self.resolve_date_range_at(Local::now().date_naive())
    }

    /// Resolve against an explicit "today" so presets are deterministic.
    fn resolve_date_range_at(&self, today: NaiveDate) -> DateRange {
        let parse = |s: Option<&String>| {
            s.map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        };

        let base_range = if let Some(preset_str) = self.preset().filter(|p| !p.is_empty()) {
            preset_str
                .parse::<DatePreset>()
                .map(|p| DateRange::from_preset_at(p, today))
                .unwrap_or_else(|_| DateRange::default_at(today))
        } else {
            match (parse(self.from_date()), parse(self.to_date())) {
                (None, None) => DateRange::default_at(today),
                (from, to) => DateRange::from_dates_at(from, to, today),
            }
        };

        match self.nav().map(|s| s.as_str()) {
            Some("prev") => base_range.prev(today),
            Some("next") => base_range.next(today),
            _ => base_range,
        }
    }
}

/// Named rolling windows ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePreset {
    Last7Days,
    Last30Days,
    Last60Days,
    Last90Days,
    Last6Months,
    LastYear,
    All,
}

impl Serialize for DatePreset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl FromStr for DatePreset {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last_7_days" => Ok(Self::Last7Days),
            "last_30_days" => Ok(Self::Last30Days),
            "last_60_days" => Ok(Self::Last60Days),
            "last_90_days" => Ok(Self::Last90Days),
            "last_6_months" => Ok(Self::Last6Months),
            "last_year" => Ok(Self::LastYear),
            "all" => Ok(Self::All),
            _ => Err(()),
        }
    }
}

impl DatePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Last7Days => "last_7_days",
            Self::Last30Days => "last_30_days",
            Self::Last60Days => "last_60_days",
            Self::Last90Days => "last_90_days",
            Self::Last6Months => "last_6_months",
            Self::LastYear => "last_year",
            Self::All => "all",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Last7Days => "Last Week",
            Self::Last30Days => "Last Month",
            Self::Last60Days => "Last 60 Days",
            Self::Last90Days => "Last 90 Days",
            Self::Last6Months => "Last 6 Months",
            Self::LastYear => "Last Year",
            Self::All => "All Time",
        }
    }

    /// Window length in days; `None` for all time.
    pub fn days(&self) -> Option<i64> {
        match self {
            Self::Last7Days => Some(7),
            Self::Last30Days => Some(30),
            Self::Last60Days => Some(60),
            Self::Last90Days => Some(90),
            Self::Last6Months => Some(180),
            Self::LastYear => Some(365),
            Self::All => None,
        }
    }

    pub fn all() -> &'static [DatePreset] {
        &[
            Self::All,
            Self::Last7Days,
            Self::Last30Days,
            Self::Last60Days,
            Self::Last90Days,
            Self::Last6Months,
            Self::LastYear,
        ]
    }
}

/// Inclusive date window. A missing bound is open on that side; both missing
/// means all time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub preset: Option<DatePreset>,
}

impl DateRange {
    pub fn all() -> Self {
        Self {
            from: None,
            to: None,
            preset: Some(DatePreset::All),
        }
    }

    pub fn from_preset_at(preset: DatePreset, today: NaiveDate) -> Self {
        match preset.days() {
            Some(days) => Self {
                from: Some(today - Duration::days(days)),
                to: Some(today),
                preset: Some(preset),
            },
            None => Self::all(),
        }
    }

    /// Custom range. Reversed bounds are swapped.
    pub fn from_dates_at(from: Option<NaiveDate>, to: Option<NaiveDate>, today: NaiveDate) -> Self {
        let (from, to) = match (from, to) {
            (Some(f), Some(t)) if f > t => (Some(t), Some(f)),
            other => other,
        };
        let preset = detect_preset(from, to, today);
        Self { from, to, preset }
    }

    pub fn default_at(today: NaiveDate) -> Self {
        Self::from_preset_at(DatePreset::Last30Days, today)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    /// Shift a fully bounded range back by its own length. Open ranges stay put.
    pub fn prev(&self, today: NaiveDate) -> Self {
        self.shift(-1, today)
    }

    pub fn next(&self, today: NaiveDate) -> Self {
        self.shift(1, today)
    }

    /// A shift that would leave the representable calendar is a no-op.
    fn shift(&self, direction: i64, today: NaiveDate) -> Self {
        let (Some(from), Some(to)) = (self.from, self.to) else {
            return self.clone();
        };
        let delta = Duration::days(((to - from).num_days() + 1) * direction);
        match (from.checked_add_signed(delta), to.checked_add_signed(delta)) {
            (Some(from), Some(to)) => Self::from_dates_at(Some(from), Some(to), today),
            _ => self.clone(),
        }
    }

    /// Human-readable label, e.g. "Last Month", "All Time",
    /// "Jan 1 – Mar 15, 2026" or "Since Jan 1, 2026".
    pub fn display_label(&self) -> String {
        if let Some(preset) = self.preset {
            return preset.label().to_string();
        }
        match (self.from, self.to) {
            (None, None) => DatePreset::All.label().to_string(),
            (Some(from), None) => format!("Since {}", from.format("%b %-d, %Y")),
            (None, Some(to)) => format!("Until {}", to.format("%b %-d, %Y")),
            (Some(from), Some(to)) => {
                if from.year() == to.year() {
                    format!(
                        "{} – {}, {}",
                        from.format("%b %-d"),
                        to.format("%b %-d"),
                        to.format("%Y")
                    )
                } else {
                    format!(
                        "{}, {} – {}, {}",
                        from.format("%b %-d"),
                        from.format("%Y"),
                        to.format("%b %-d"),
                        to.format("%Y")
                    )
                }
            }
        }
    }

    pub fn from_str(&self) -> String {
        self.from
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }

    pub fn to_str(&self) -> String {
        self.to
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }

    pub fn is_preset(&self, preset: &DatePreset) -> bool {
        self.preset == Some(*preset)
    }

    /// For an open range, fill the missing bounds from the data extent so
    /// the page can show concrete dates. Bounded ranges are unchanged.
    pub fn resolve_all(self, extent: Option<(NaiveDate, NaiveDate)>) -> Self {
        match extent {
            Some((min_date, max_date)) => Self {
                from: self.from.or(Some(min_date)),
                to: self.to.or(Some(max_date)),
                preset: self.preset,
            },
            None => self,
        }
    }
}

fn detect_preset(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<DatePreset> {
    DatePreset::all().iter().copied().find(|preset| {
        let range = DateRange::from_preset_at(*preset, today);
        range.from == from && range.to == to
    })
}
