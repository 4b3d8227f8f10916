//! Chart series for the dashboard
//!
//! Turns score rows into the two Chart.js line charts: net points per team
//! per gameweek, and each team's cumulative total.

use crate::storage::Score;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Line colours, cycled per team. Some colours repeat within the cycle.
pub const PALETTE: [&str; 10] = [
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40", "#FF6384", "#C9CBCF",
    "#4BC0C0", "#FF6384",
];

/// Appended to the border colour to get a translucent fill
const BACKGROUND_ALPHA: &str = "20";

const LINE_TENSION: f64 = 0.4;

/// Chart.js `data` object
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartData {
    /// Gameweek numbers along the x-axis
    pub labels: Vec<i64>,
    pub datasets: Vec<ChartDataset>,
}

/// One team's line
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<i64>,
    pub border_color: String,
    pub background_color: String,
    pub tension: f64,
    pub fill: bool,
}

impl ChartDataset {
    fn new(label: &str, data: Vec<i64>, index: usize) -> Self {
        let color = PALETTE[index % PALETTE.len()];
        Self {
            label: label.to_string(),
            data,
            border_color: color.to_string(),
            background_color: format!("{}{}", color, BACKGROUND_ALPHA),
            tension: LINE_TENSION,
            fill: false,
        }
    }
}

/// Both dashboard charts, sharing the same labels and team order
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardCharts {
    pub weekly: ChartData,
    pub overall: ChartData,
}

/// Build weekly and cumulative series per team.
///
/// Labels are the distinct gameweeks present in `scores`, ascending, or
/// `[1]` when there are none. Teams are sorted by label. A team with no
/// score in a gameweek gets 0 for that week and carries its cumulative
/// total forward.
pub fn build_charts(scores: &[Score]) -> DashboardCharts {
    let mut per_team: BTreeMap<&str, BTreeMap<i64, i64>> = BTreeMap::new();
    let mut gameweeks = BTreeSet::new();

    for score in scores {
        gameweeks.insert(score.gameweek);
        let week = per_team
            .entry(score.team.as_str())
            .or_default()
            .entry(score.gameweek)
            .or_insert(0);
        *week = week.saturating_add(score.net_points);
    }

    let labels: Vec<i64> = if gameweeks.is_empty() {
        vec![1]
    } else {
        gameweeks.into_iter().collect()
    };

    let mut weekly = Vec::with_capacity(per_team.len());
    let mut overall = Vec::with_capacity(per_team.len());

    for (index, (team, by_gameweek)) in per_team.iter().enumerate() {
        let week_values: Vec<i64> = labels
            .iter()
            .map(|gw| by_gameweek.get(gw).copied().unwrap_or(0))
            .collect();
        let cumulative = running_total(&week_values);

        weekly.push(ChartDataset::new(team, week_values, index));
        overall.push(ChartDataset::new(team, cumulative, index));
    }

    DashboardCharts {
        weekly: ChartData {
            labels: labels.clone(),
            datasets: weekly,
        },
        overall: ChartData {
            labels,
            datasets: overall,
        },
    }
}

/// Prefix sums of `values`, saturating at the `i64` bounds
pub fn running_total(values: &[i64]) -> Vec<i64> {
    values
        .iter()
        .scan(0_i64, |acc, value| {
            *acc = acc.saturating_add(*value);
            Some(*acc)
        })
        .collect()
}
