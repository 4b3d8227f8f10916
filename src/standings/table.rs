//! Team league table
//!
//! Ranks teams by net points (week points minus transfer costs) summed over
//! every score of every player carrying the team label.

use crate::storage::Score;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One row of the league table
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TeamStanding {
    /// 1-based; teams with equal net totals share a rank
    pub rank: usize,
    pub team: String,
    /// Players with at least one score
    pub players: usize,
    pub gameweeks_played: usize,
    pub total_points: i64,
    pub total_cost: i64,
    pub net_points: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_week: Option<BestWeek>,
}

/// Highest-scoring gameweek for a team
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct BestWeek {
    pub gameweek: i64,
    pub net_points: i64,
}

#[derive(Default)]
struct TeamTally {
    players: BTreeSet<i64>,
    weeks: BTreeMap<i64, i64>,
    total_points: i64,
    total_cost: i64,
}

/// Build the ranked table, best team first
pub fn team_standings(scores: &[Score]) -> Vec<TeamStanding> {
    let mut tallies: BTreeMap<&str, TeamTally> = BTreeMap::new();

    for score in scores {
        let tally = tallies.entry(score.team.as_str()).or_default();
        tally.players.insert(score.player_id);
        let week = tally.weeks.entry(score.gameweek).or_insert(0);
        *week = week.saturating_add(score.net_points);
        tally.total_points = tally.total_points.saturating_add(score.week_points);
        tally.total_cost = tally.total_cost.saturating_add(score.week_cost);
    }

    let mut table: Vec<TeamStanding> = tallies
        .into_iter()
        .map(|(team, tally)| {
            // Earliest gameweek wins ties
            let best_week = tally
                .weeks
                .iter()
                .fold(None::<BestWeek>, |best, (&gameweek, &net_points)| match best {
                    Some(b) if b.net_points >= net_points => Some(b),
                    _ => Some(BestWeek {
                        gameweek,
                        net_points,
                    }),
                });

            TeamStanding {
                rank: 0,
                team: team.to_string(),
                players: tally.players.len(),
                gameweeks_played: tally.weeks.len(),
                total_points: tally.total_points,
                total_cost: tally.total_cost,
                net_points: tally.total_points.saturating_sub(tally.total_cost),
                best_week,
            }
        })
        .collect();

    table.sort_by(|a, b| b.net_points.cmp(&a.net_points).then_with(|| a.team.cmp(&b.team)));

    let mut previous: Option<(i64, usize)> = None;
    for (position, row) in table.iter_mut().enumerate() {
        row.rank = match previous {
            Some((net, rank)) if net == row.net_points => rank,
            _ => position + 1,
        };
        previous = Some((row.net_points, row.rank));
    }

    table
}
