//! crates/lifedeal_core/src/views.rs
//!
//! Derived views: pure functions over the current deal set and filter criteria.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::domain::{Category, Deal};

/// Usage status filter. The empty string selects every deal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum StatusFilter {
    #[default]
    All,
    Used,
    Unused,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown status filter '{0}', expected \"\", \"used\" or \"unused\"")]
pub struct UnknownStatus(String);

impl FromStr for StatusFilter {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "used" => Ok(Self::Used),
            "unused" => Ok(Self::Unused),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

impl TryFrom<String> for StatusFilter {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StatusFilter> for &'static str {
    fn from(status: StatusFilter) -> Self {
        match status {
            StatusFilter::All => "",
            StatusFilter::Used => "used",
            StatusFilter::Unused => "unused",
        }
    }
}

impl StatusFilter {
    fn admits(self, is_used: bool) -> bool {
        match self {
            Self::All => true,
            Self::Used => is_used,
            Self::Unused => !is_used,
        }
    }
}

/// The list view's filter criteria. Every empty criterion is a wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DealFilter {
    pub search: String,
    pub category: String,
    pub status: StatusFilter,
}

impl DealFilter {
    pub fn matches(&self, deal: &Deal) -> bool {
        self.matches_search(deal)
            && (self.category.is_empty() || deal.category == self.category)
            && self.status.admits(deal.is_used)
    }

    fn matches_search(&self, deal: &Deal) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        deal.name.to_lowercase().contains(&needle)
            || deal.description.to_lowercase().contains(&needle)
    }
}

/// Returns the deals that pass `filter`, in their original order.
pub fn filter_deals<'a>(deals: &'a [Deal], filter: &DealFilter) -> Vec<&'a Deal> {
    deals.iter().filter(|deal| filter.matches(deal)).collect()
}

/// Aggregate statistics over a whole deal collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealStats {
    pub total_deals: usize,
    pub total_spent: f64,
    pub used_deals: usize,
    /// Whole percent of deals in use; 0 for an empty collection.
    pub usage_rate: u32,
}

pub fn compute_stats(deals: &[Deal]) -> DealStats {
    let total_deals = deals.len();
    let used_deals = deals.iter().filter(|d| d.is_used).count();
    let total_spent = deals.iter().map(|d| d.price).sum();
    let usage_rate = if total_deals == 0 {
        0
    } else {
        (used_deals as f64 / total_deals as f64 * 100.0).round() as u32
    };

    DealStats {
        total_deals,
        total_spent,
        used_deals,
        usage_rate,
    }
}

/// Copies `categories` with `deal_count` recomputed from `deals`.
pub fn category_deal_counts(categories: &[Category], deals: &[Deal]) -> Vec<Category> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for deal in deals {
        *counts.entry(deal.category.as_str()).or_default() += 1;
    }

    categories
        .iter()
        .map(|category| Category {
            deal_count: counts.get(category.name.as_str()).copied().unwrap_or(0),
            ..category.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordId;
    use chrono::{NaiveDate, Utc};

    fn deal(id: i64, name: &str, description: &str, category: &str, is_used: bool) -> Deal {
        Deal {
            id: RecordId::new(id),
            name: name.to_string(),
            price: 10.0 * id as f64,
            purchase_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            category: category.to_string(),
            description: description.to_string(),
            url: None,
            notes: String::new(),
            is_used,
            last_accessed: None,
            created_at: Utc::now(),
        }
    }

    fn sample() -> Vec<Deal> {
        vec![
            deal(1, "Notion Alternative", "All-in-one workspace", "Productivity", true),
            deal(2, "Pixel Studio", "Mockups for teams", "Design", false),
            deal(3, "MailPilot", "Email campaigns on autopilot", "Marketing", true),
            deal(4, "Vector Forge", "Icon design at scale", "Design", true),
        ]
    }

    fn ids(deals: &[&Deal]) -> Vec<i64> {
        deals.iter().map(|d| d.id.value()).collect()
    }

    #[test]
    fn empty_filter_is_identity() {
        let deals = sample();
        let visible = filter_deals(&deals, &DealFilter::default());
        assert_eq!(ids(&visible), vec![1, 2, 3, 4]);
    }

    #[test]
    fn search_is_case_insensitive_over_name_and_description() {
        let deals = sample();
        let by_name = DealFilter {
            search: "PIXEL".to_string(),
            ..DealFilter::default()
        };
        let by_description = DealFilter {
            search: "design".to_string(),
            ..DealFilter::default()
        };
        let nowhere = DealFilter {
            search: "crm".to_string(),
            ..DealFilter::default()
        };

        assert_eq!(ids(&filter_deals(&deals, &by_name)), vec![2]);
        assert_eq!(ids(&filter_deals(&deals, &by_description)), vec![4]);
        assert!(filter_deals(&deals, &nowhere).is_empty());
    }

    #[test]
    fn criteria_compose_with_and() {
        let deals = sample();
        let filter = DealFilter {
            search: String::new(),
            category: "Design".to_string(),
            status: StatusFilter::Used,
        };
        assert_eq!(ids(&filter_deals(&deals, &filter)), vec![4]);

        let unused = DealFilter {
            status: StatusFilter::Unused,
            ..DealFilter::default()
        };
        assert_eq!(ids(&filter_deals(&deals, &unused)), vec![2]);
    }

    #[test]
    fn status_filter_parses_wire_values() {
        assert_eq!("".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!("used".parse::<StatusFilter>().unwrap(), StatusFilter::Used);
        assert_eq!("unused".parse::<StatusFilter>().unwrap(), StatusFilter::Unused);
        assert!("sometimes".parse::<StatusFilter>().is_err());

        let filter: DealFilter = serde_json::from_str(r#"{"status": "unused"}"#).unwrap();
        assert_eq!(filter.status, StatusFilter::Unused);
        assert!(filter.search.is_empty());
    }

    #[test]
    fn stats_cover_the_whole_collection() {
        let stats = compute_stats(&sample());
        assert_eq!(stats.total_deals, 4);
        assert_eq!(stats.used_deals, 3);
        assert!((stats.total_spent - 100.0).abs() < f64::EPSILON);
        assert_eq!(stats.usage_rate, 75);
    }

    #[test]
    fn usage_rate_rounds_and_handles_empty() {
        assert_eq!(compute_stats(&[]).usage_rate, 0);

        let one_of_three = vec![
            deal(1, "a", "", "x", true),
            deal(2, "b", "", "x", false),
            deal(3, "c", "", "x", false),
        ];
        assert_eq!(compute_stats(&one_of_three).usage_rate, 33);

        let two_of_three = vec![
            deal(1, "a", "", "x", true),
            deal(2, "b", "", "x", true),
            deal(3, "c", "", "x", false),
        ];
        assert_eq!(compute_stats(&two_of_three).usage_rate, 67);
    }

    #[test]
    fn deal_counts_are_projected_per_category_name() {
        let categories = vec![
            Category {
                id: RecordId::new(1),
                name: "Design".to_string(),
                deal_count: 99,
            },
            Category {
                id: RecordId::new(2),
                name: "Analytics".to_string(),
                deal_count: 5,
            },
        ];

        let counted = category_deal_counts(&categories, &sample());

        assert_eq!(counted[0].deal_count, 2);
        assert_eq!(counted[1].deal_count, 0);
    }
}
