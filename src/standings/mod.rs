//! Standings
//!
//! Pure aggregation over score rows. Nothing here touches the database:
//! callers load scores from the [`Store`](crate::storage::Store) and pass
//! them in.
//!
//! - [`build_charts`]: weekly and cumulative Chart.js series per team
//! - [`team_standings`]: ranked league table

pub mod charts;
pub mod table;

pub use charts::{build_charts, running_total, ChartData, ChartDataset, DashboardCharts, PALETTE};
pub use table::{team_standings, BestWeek, TeamStanding};
