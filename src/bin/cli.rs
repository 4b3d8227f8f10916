//! FPL Tracker CLI
//!
//! Command-line client for a running FPL Tracker server:
//! - Inspect players, scores and the league table
//! - Add, rename and remove players
//! - Enter or import a gameweek's scores
//! - Export scores and generate a config file

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fpl_tracker::api::dto::BulkScoreResponse;
use fpl_tracker::storage::{Player, Score, ScoreEntry};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "fpl-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Manage an FPL Tracker mini-league from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Server URL (default: $FPL_API_URL or http://localhost:8000)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Admin username (default: $ADMIN_USERNAME or admin)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Admin password (default: $ADMIN_PASSWORD or password)
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show server status
    Status,

    /// List players
    Players {
        /// Only players in this team
        #[arg(short, long)]
        team: Option<String>,
    },

    /// Add a player
    AddPlayer {
        name: String,
        team: String,
    },

    /// Rename a player or move them to another team
    RenamePlayer {
        id: i64,
        name: String,
        team: String,
    },

    /// Remove a player and all of their scores
    RemovePlayer {
        id: i64,
    },

    /// List scores
    Scores {
        /// Only this player's scores
        #[arg(short, long)]
        player: Option<i64>,
        /// Only this gameweek
        #[arg(short, long)]
        gameweek: Option<i64>,
    },

    /// Enter scores for a gameweek, e.g. `enter 5 1=64:4 2=51`
    Enter {
        gameweek: i64,
        /// Entries as player_id=points[:cost]
        #[arg(required = true)]
        entries: Vec<String>,
    },

    /// Enter a gameweek from a CSV with player_id, week_points, week_cost columns
    Import {
        /// Path to CSV file
        path: PathBuf,
        #[arg(short, long)]
        gameweek: i64,
        /// Dry run (parse only, send nothing)
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the league table
    Standings,

    /// Export every score as CSV
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Thin wrapper over the JSON API
struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl ApiClient {
    fn new(cli: &Cli) -> Self {
        let base_url = cli
            .api_url
            .clone()
            .or_else(|| std::env::var("FPL_API_URL").ok())
            .unwrap_or_else(|| "http://localhost:8000".to_string());
        let username = cli
            .user
            .clone()
            .or_else(|| std::env::var("ADMIN_USERNAME").ok())
            .unwrap_or_else(|| "admin".to_string());
        let password = cli
            .password
            .clone()
            .or_else(|| std::env::var("ADMIN_PASSWORD").ok())
            .unwrap_or_else(|| "password".to_string());

        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            password,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .with_context(|| format!("Cannot reach FPL Tracker at {}", self.base_url))?;
        Self::parse(response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &Value,
    ) -> Result<T> {
        let response = self
            .http
            .request(method, self.url(path))
            .basic_auth(&self.username, Some(&self.password))
            .json(body)
            .send()
            .await
            .with_context(|| format!("Cannot reach FPL Tracker at {}", self.base_url))?;
        Self::parse(response).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.url(path))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .with_context(|| format!("Cannot reach FPL Tracker at {}", self.base_url))?;
        Self::check(response).await?;
        Ok(())
    }

    async fn text(&self, path: &str) -> Result<String> {
        let response = self.http.get(self.url(path)).send().await?;
        Ok(Self::check(response).await?.text().await?)
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .unwrap_or(text);

        if status == reqwest::StatusCode::UNAUTHORIZED {
            bail!("Not authorized ({}): check --user/--password or ADMIN_USERNAME/ADMIN_PASSWORD", message);
        }
        bail!("Request failed ({}): {}", status, message)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let client = ApiClient::new(&cli);
    let json_output = cli.format.eq_ignore_ascii_case("json");

    match &cli.command {
        Commands::Status => {
            let health: Value = client.get("/health", &[]).await?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&health)?);
                return Ok(());
            }

            println!("FPL Tracker v{}", health["version"].as_str().unwrap_or("?"));
            println!();
            println!("Status:   {}", health["status"].as_str().unwrap_or("unknown"));
            println!("Database: {}", health["database"].as_str().unwrap_or("unknown"));
            println!("Players:  {}", health["players"].as_u64().unwrap_or(0));
            println!("Scores:   {}", health["scores"].as_u64().unwrap_or(0));
            if let Some(uptime) = health["uptime_seconds"].as_u64() {
                println!("Uptime:   {}", format_duration(uptime));
            }
        }

        Commands::Players { team } => {
            let query: Vec<(&str, String)> =
                team.iter().map(|team| ("team", team.clone())).collect();
            let response: Value = client.get("/api/players", &query).await?;
            let players: Vec<Player> = serde_json::from_value(response["players"].clone())?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&players)?);
            } else if players.is_empty() {
                println!("No players yet.");
                println!();
                println!("Add one with:");
                println!("  fpl-cli add-player \"Name\" \"Team\"");
            } else {
                print_players(&players);
            }
        }

        Commands::AddPlayer { name, team } => {
            let player: Player = client
                .send_json(
                    reqwest::Method::POST,
                    "/api/players",
                    &json!({ "name": name, "team": team }),
                )
                .await?;
            println!("Added {} ({}) with id {}", player.name, player.team, player.id);
        }

        Commands::RenamePlayer { id, name, team } => {
            let player: Player = client
                .send_json(
                    reqwest::Method::PUT,
                    &format!("/api/players/{}", id),
                    &json!({ "name": name, "team": team }),
                )
                .await?;
            println!("Player {} is now {} ({})", player.id, player.name, player.team);
        }

        Commands::RemovePlayer { id } => {
            client.delete(&format!("/api/players/{}", id)).await?;
            println!("Removed player {} and their scores", id);
        }

        Commands::Scores { player, gameweek } => {
            let mut query = Vec::new();
            if let Some(player) = player {
                query.push(("player_id", player.to_string()));
            }
            if let Some(gameweek) = gameweek {
                query.push(("gameweek", gameweek.to_string()));
            }

            let response: Value = client.get("/api/scores", &query).await?;
            let scores: Vec<Score> = serde_json::from_value(response["scores"].clone())?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&scores)?);
            } else if scores.is_empty() {
                println!("No scores match.");
            } else {
                print_scores(&scores);
                println!();
                println!(
                    "Next gameweek to enter: {}",
                    response["next_gameweek"].as_i64().unwrap_or(1)
                );
            }
        }

        Commands::Enter { gameweek, entries } => {
            let entries = entries
                .iter()
                .map(|raw| parse_entry(raw))
                .collect::<Result<Vec<_>>>()?;

            let outcome = submit_gameweek(&client, *gameweek, &entries).await?;
            println!(
                "Gameweek {}: {} created, {} updated",
                outcome.gameweek, outcome.created, outcome.updated
            );
        }

        Commands::Import {
            path,
            gameweek,
            dry_run,
        } => {
            let entries = read_entries_csv(path)?;
            println!("Read {} entries from {:?}", entries.len(), path);

            if *dry_run {
                for entry in &entries {
                    println!(
                        "  player {:<5} points {:<4} cost {}",
                        entry.player_id, entry.week_points, entry.week_cost
                    );
                }
                println!();
                println!("(Dry run - nothing was sent)");
            } else if entries.is_empty() {
                println!("Nothing to import.");
            } else {
                let outcome = submit_gameweek(&client, *gameweek, &entries).await?;
                println!(
                    "Gameweek {}: {} created, {} updated",
                    outcome.gameweek, outcome.created, outcome.updated
                );
            }
        }

        Commands::Standings => {
            let response: Value = client.get("/api/standings", &[]).await?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&response)?);
                return Ok(());
            }

            let rows = response["standings"].as_array().cloned().unwrap_or_default();
            if rows.is_empty() {
                println!("No scores entered yet.");
                return Ok(());
            }

            println!(
                "After gameweek {}",
                response["max_gameweek"].as_i64().unwrap_or(0)
            );
            println!();
            println!(
                "{:<5} {:<24} {:>7} {:>7} {:>6} {:>7}",
                "Rank", "Team", "Players", "Points", "Cost", "Net"
            );
            println!("{}", "-".repeat(61));
            for row in rows {
                println!(
                    "{:<5} {:<24} {:>7} {:>7} {:>6} {:>7}",
                    row["rank"].as_u64().unwrap_or(0),
                    row["team"].as_str().unwrap_or("-"),
                    row["players"].as_u64().unwrap_or(0),
                    row["total_points"].as_i64().unwrap_or(0),
                    row["total_cost"].as_i64().unwrap_or(0),
                    row["net_points"].as_i64().unwrap_or(0),
                );
            }
        }

        Commands::Export { output } => {
            let data = client.text("/api/export/scores.csv").await?;

            match output {
                Some(path) => {
                    std::fs::write(path, &data)
                        .with_context(|| format!("Cannot write {:?}", path))?;
                    println!("Exported to {:?}", path);
                }
                None => {
                    print!("{}", data);
                }
            }
        }

        Commands::Config { output } => {
            let config = fpl_tracker::config::generate_default_config();

            match output {
                Some(path) => {
                    // Create parent directory if needed
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

async fn submit_gameweek(
    client: &ApiClient,
    gameweek: i64,
    entries: &[ScoreEntry],
) -> Result<BulkScoreResponse> {
    client
        .send_json(
            reqwest::Method::POST,
            "/api/scores/bulk",
            &json!({ "gameweek": gameweek, "entries": entries }),
        )
        .await
}

/// Parse `player_id=points` or `player_id=points:cost`
fn parse_entry(raw: &str) -> Result<ScoreEntry> {
    let (id, rest) = raw
        .split_once('=')
        .with_context(|| format!("Expected player_id=points[:cost], got {:?}", raw))?;

    let (points, cost) = match rest.split_once(':') {
        Some((points, cost)) => (points, cost),
        None => (rest, "0"),
    };

    let player_id = id
        .trim()
        .parse()
        .with_context(|| format!("Invalid player id in {:?}", raw))?;
    let week_points = points
        .trim()
        .parse()
        .with_context(|| format!("Invalid points in {:?}", raw))?;
    let week_cost = cost
        .trim()
        .parse()
        .with_context(|| format!("Invalid cost in {:?}", raw))?;

    Ok(ScoreEntry::new(player_id, week_points, week_cost))
}

/// Read `player_id,week_points[,week_cost]` rows with a header line
fn read_entries_csv(path: &Path) -> Result<Vec<ScoreEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Cannot open {:?}", path))?;

    let mut entries = Vec::new();
    for (i, row) in reader.deserialize::<ScoreEntry>().enumerate() {
        // Line 1 is the header
        let entry = row.with_context(|| format!("Bad row at line {}", i + 2))?;
        entries.push(entry);
    }
    Ok(entries)
}

fn print_players(players: &[Player]) {
    println!("{:<5} {:<24} {:<24} {}", "ID", "Name", "Team", "Added");
    println!("{}", "-".repeat(70));

    for player in players {
        println!(
            "{:<5} {:<24} {:<24} {}",
            player.id,
            player.name,
            player.team,
            player.created_at.format("%Y-%m-%d")
        );
    }
}

fn print_scores(scores: &[Score]) {
    println!(
        "{:<5} {:<4} {:<20} {:<20} {:>6} {:>5} {:>5} {:>7}",
        "ID", "GW", "Player", "Team", "Points", "Cost", "Net", "Overall"
    );
    println!("{}", "-".repeat(80));

    for score in scores {
        println!(
            "{:<5} {:<4} {:<20} {:<20} {:>6} {:>5} {:>5} {:>7}",
            score.id,
            score.gameweek,
            score.player_name,
            score.team,
            score.week_points,
            score.week_cost,
            score.net_points,
            score.overall_points
        );
    }
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}
