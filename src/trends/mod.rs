use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{Display, EnumString};
use time::{Date, Duration};

use crate::journal::{Category, Entry};

const RECENT_WINDOW_DAYS: i64 = 7;
const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, SerializeDisplay, DeserializeFromStr)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(self, entry: &Entry) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => entry.category == category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str(ALL_CATEGORIES),
            CategoryFilter::Only(category) => f.write_str(category.as_ref()),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(ALL_CATEGORIES) {
            return Ok(CategoryFilter::All);
        }
        Category::from_str(trimmed).map(CategoryFilter::Only)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortKey {
    #[default]
    Date,
    Severity,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrendsQuery {
    pub category: CategoryFilter,
    pub sort: SortKey,
}

/// Statistics over the whole collection, independent of the active filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub avg_severity: f64,
    pub top_category: Category,
    pub recent_count: usize,
}

impl Summary {
    pub fn top_category_name(&self) -> &'static str {
        self.top_category.display_name()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    #[serde(with = "point_date")]
    pub date: Date,
    pub severity: u8,
    pub category: Category,
}

time::serde::format_description!(point_date, Date, "[year]-[month]-[day]");

/// Derived trends for one collection and one set of view parameters.
#[derive(Debug, Clone)]
pub struct TrendsView {
    pub entries: Vec<Entry>,
    pub total: usize,
    pub summary: Option<Summary>,
    pub series: Vec<TrendPoint>,
}

impl TrendsView {
    pub fn compute(entries: &[Entry], query: TrendsQuery, today: Date) -> Self {
        Self {
            entries: filtered_view(entries, query),
            total: entries.len(),
            summary: summarize(entries, today),
            series: severity_series(entries),
        }
    }

    pub fn shown(&self) -> usize {
        self.entries.len()
    }

    pub fn top_category_label(&self) -> &'static str {
        self.summary
            .as_ref()
            .map(Summary::top_category_name)
            .unwrap_or("None")
    }
}

pub fn filter_entries(entries: &[Entry], filter: CategoryFilter) -> Vec<Entry> {
    entries
        .iter()
        .filter(|entry| filter.matches(entry))
        .cloned()
        .collect()
}

/// Most recent or most severe first. `sort_by_key` is stable, so ties keep stored order.
pub fn sort_entries(entries: &mut [Entry], key: SortKey) {
    match key {
        SortKey::Date => entries.sort_by_key(|entry| Reverse(entry.date)),
        SortKey::Severity => entries.sort_by_key(|entry| Reverse(entry.severity)),
    }
}

pub fn filtered_view(entries: &[Entry], query: TrendsQuery) -> Vec<Entry> {
    let mut view = filter_entries(entries, query.category);
    sort_entries(&mut view, query.sort);
    view
}

pub fn summarize(entries: &[Entry], today: Date) -> Option<Summary> {
    if entries.is_empty() {
        return None;
    }
    let total = entries.len();
    let severity_sum: u32 = entries
        .iter()
        .map(|entry| u32::from(entry.severity.get()))
        .sum();
    let mean = f64::from(severity_sum) / total as f64;

    Some(Summary {
        total,
        avg_severity: round_one_decimal(mean),
        top_category: most_frequent_category(entries)?,
        recent_count: count_recent(entries, today),
    })
}

/// Ties go to whichever category appeared first in stored order.
pub fn most_frequent_category(entries: &[Entry]) -> Option<Category> {
    let mut counts: IndexMap<Category, usize> = IndexMap::new();
    for entry in entries {
        *counts.entry(entry.category).or_default() += 1;
    }
    let mut best: Option<(Category, usize)> = None;
    for (category, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((category, count)),
        }
    }
    best.map(|(category, _)| category)
}

/// Entries dated within `[today - 7 days, today]`, both ends inclusive.
pub fn count_recent(entries: &[Entry], today: Date) -> usize {
    let start = today
        .checked_sub(Duration::days(RECENT_WINDOW_DAYS))
        .unwrap_or(Date::MIN);
    entries
        .iter()
        .filter(|entry| entry.date >= start && entry.date <= today)
        .count()
}

pub fn severity_series(entries: &[Entry]) -> Vec<TrendPoint> {
    entries
        .iter()
        .map(|entry| TrendPoint {
            date: entry.date,
            severity: entry.severity.get(),
            category: entry.category,
        })
        .collect()
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{Severity, TimeOfDay};
    use time::macros::{date, datetime};

    fn entry(id: &str, date: Date, category: Category, severity: u8) -> Entry {
        Entry {
            id: id.into(),
            date,
            symptom: format!("symptom {id}"),
            category,
            severity: Severity::new(severity).expect("valid severity"),
            notes: None,
            time_of_day: TimeOfDay::Morning,
            duration: None,
            created_at: datetime!(2024-06-01 08:00 UTC),
        }
    }

    fn ids(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    const TODAY: Date = date!(2024 - 06 - 15);

    #[test]
    fn severity_sort_is_descending_and_stable() {
        let entries = vec![
            entry("i0", TODAY, Category::Pain, 3),
            entry("i1", TODAY, Category::Pain, 9),
            entry("i2", TODAY, Category::Pain, 9),
            entry("i3", TODAY, Category::Pain, 1),
        ];
        let query = TrendsQuery {
            category: CategoryFilter::All,
            sort: SortKey::Severity,
        };
        let view = filtered_view(&entries, query);
        assert_eq!(ids(&view), ["i1", "i2", "i0", "i3"]);
        assert_eq!(ids(&entries), ["i0", "i1", "i2", "i3"], "input untouched");
    }

    #[test]
    fn date_sort_puts_most_recent_first_and_keeps_tie_order() {
        let entries = vec![
            entry("old", date!(2024 - 06 - 01), Category::Sleep, 2),
            entry("new-a", date!(2024 - 06 - 10), Category::Sleep, 2),
            entry("mid", date!(2024 - 06 - 05), Category::Sleep, 2),
            entry("new-b", date!(2024 - 06 - 10), Category::Sleep, 2),
        ];
        let view = filtered_view(&entries, TrendsQuery::default());
        assert_eq!(ids(&view), ["new-a", "new-b", "mid", "old"]);
    }

    #[test]
    fn filter_without_matches_keeps_unfiltered_totals() {
        let entries = vec![
            entry("a", TODAY, Category::Pain, 4),
            entry("b", TODAY, Category::Sleep, 6),
        ];
        let query = TrendsQuery {
            category: CategoryFilter::Only(Category::Skin),
            sort: SortKey::Date,
        };
        let view = TrendsView::compute(&entries, query, TODAY);
        assert_eq!(view.shown(), 0);
        assert_eq!(view.total, 2);
        assert_eq!(view.summary.as_ref().map(|s| s.total), Some(2));
    }

    #[test]
    fn category_filter_keeps_only_matching_entries() {
        let entries = vec![
            entry("a", TODAY, Category::Pain, 4),
            entry("b", TODAY, Category::Sleep, 6),
            entry("c", TODAY, Category::Pain, 5),
        ];
        let filtered = filter_entries(&entries, CategoryFilter::Only(Category::Pain));
        assert_eq!(ids(&filtered), ["a", "c"]);
    }

    #[test]
    fn average_severity_is_rounded_to_one_decimal() {
        let entries = vec![
            entry("a", TODAY, Category::Pain, 2),
            entry("b", TODAY, Category::Pain, 4),
            entry("c", TODAY, Category::Pain, 6),
        ];
        let summary = summarize(&entries, TODAY).expect("summary");
        assert_eq!(summary.avg_severity, 4.0);

        let uneven = vec![
            entry("a", TODAY, Category::Pain, 1),
            entry("b", TODAY, Category::Pain, 2),
            entry("c", TODAY, Category::Pain, 2),
        ];
        assert_eq!(summarize(&uneven, TODAY).map(|s| s.avg_severity), Some(1.7));
    }

    #[test]
    fn empty_collection_has_no_statistics() {
        assert_eq!(summarize(&[], TODAY), None);
        let view = TrendsView::compute(&[], TrendsQuery::default(), TODAY);
        assert!(view.summary.is_none());
        assert_eq!(view.top_category_label(), "None");
        assert!(view.series.is_empty());
    }

    #[test]
    fn top_category_prefers_first_encountered_on_ties() {
        let majority = vec![
            entry("a", TODAY, Category::Pain, 1),
            entry("b", TODAY, Category::Sleep, 1),
            entry("c", TODAY, Category::Pain, 1),
        ];
        assert_eq!(most_frequent_category(&majority), Some(Category::Pain));

        let tie = vec![
            entry("a", TODAY, Category::Pain, 1),
            entry("b", TODAY, Category::Sleep, 1),
        ];
        assert_eq!(most_frequent_category(&tie), Some(Category::Pain));

        let later_majority = vec![
            entry("a", TODAY, Category::Pain, 1),
            entry("b", TODAY, Category::Sleep, 1),
            entry("c", TODAY, Category::Sleep, 1),
        ];
        let view = TrendsView::compute(&later_majority, TrendsQuery::default(), TODAY);
        assert_eq!(view.top_category_label(), "Sleep");
    }

    #[test]
    fn recent_count_uses_inclusive_seven_day_window() {
        let entries = vec![
            entry("today", TODAY, Category::Energy, 3),
            entry("edge", date!(2024 - 06 - 08), Category::Energy, 3),
            entry("outside", date!(2024 - 06 - 07), Category::Energy, 3),
            entry("future", date!(2024 - 06 - 16), Category::Energy, 3),
        ];
        assert_eq!(count_recent(&entries, TODAY), 2);
    }

    #[test]
    fn series_follows_stored_order() {
        let entries = vec![
            entry("a", date!(2024 -06 - 03), Category::Mental, 8),
            entry("b", date!(2024 - 06 - 01), Category::Skin, 2),
        ];
        let series = severity_series(&entries);
        assert_eq!(
            series,
            vec![
                TrendPoint {
                    date: date!(2024 - 06 - 03),
                    severity: 8,
                    category: Category::Mental,
                },
                TrendPoint {
                    date: date!(2024 - 06 - 01),
                    severity: 2,
                    category: Category::Skin,
                },
            ]
        );
        let json = serde_json::to_value(&series[0]).expect("serialize point");
        assert_eq!(json["date"], "2024-06-03");
    }

    #[test]
    fn category_filter_parses_all_and_ids() {
        assert_eq!("all".parse::<CategoryFilter>().ok(), Some(CategoryFilter::All));
        assert_eq!(
            "digestive".parse::<CategoryFilter>().ok(),
            Some(CategoryFilter::Only(Category::Digestive))
        );
        assert!("unknown".parse::<CategoryFilter>().is_err());
        assert_eq!(CategoryFilter::Only(Category::Skin).to_string(), "skin");
    }
}
