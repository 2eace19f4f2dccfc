mod config;
mod db;
mod gemini;
mod parser;
mod render;

use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use config::Config;
use db::Report;
use parser::sections::{SectionKind, SectionMap};

#[derive(Parser)]
#[command(name = "anglerpro", about = "Grounded fishing scouting reports in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Request a fresh scouting report for a location
    Scout {
        /// City, body of water, or coordinates (derived from --lat/--lng when omitted)
        location: Option<String>,
        /// Target species (default: local game fish)
        #[arg(short, long)]
        species: Option<String>,
        /// Latitude for maps grounding
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Longitude for maps grounding
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
        /// Print JSON instead of panels
        #[arg(long)]
        json: bool,
        /// Do not store the report in the local cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Parse and render a report from a file (or stdin), offline
    Parse {
        /// Report file; reads stdin when omitted
        file: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Re-render a cached report (latest when no id is given)
    Show {
        id: Option<i64>,
        #[arg(long)]
        json: bool,
    },
    /// List cached reports
    History {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Section coverage and bite averages across cached reports
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let config = Config::load();

    let result = match cli.command {
        Commands::Scout { location, species, lat, lng, json, no_cache } => {
            let coords = lat.zip(lng);
            let req = gemini::ScoutRequest::new(location, species, coords)?;
            let client = gemini::GeminiClient::new(&config)?;

            let mut report = with_spinner(client.scout(&req)).await?;
            if !no_cache {
                let conn = db::connect(&config.db_path)?;
                db::init_schema(&conn)?;
                let id = db::save_report(&conn, &report)?;
                info!("Cached report #{} in {}", id, config.db_path);
                report.id = Some(id);
            }
            print_report(&report, json)
        }
        Commands::Parse { file, json } => {
            let text = match &file {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {path}"))?,
                None => std::io::read_to_string(std::io::stdin())
                    .context("Failed to read report from stdin")?,
            };
            let report = Report {
                id: None,
                location: file_label(file.as_deref()),
                species: None,
                lat: None,
                lng: None,
                model: String::new(),
                text,
                sources: Vec::new(),
                created_at: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            };
            print_report(&report, json)
        }
        Commands::Show { id, json } => {
            let conn = db::connect(&config.db_path)?;
            db::init_schema(&conn)?;
            match find_report(&conn, id)? {
                Some(report) => print_report(&report, json),
                None => {
                    println!("No cached reports. Run 'scout' first.");
                    Ok(())
                }
            }
        }
        Commands::History { limit } => {
            let conn = db::connect(&config.db_path)?;
            db::init_schema(&conn)?;
            let rows = db::fetch_history(&conn, limit)?;
            if rows.is_empty() {
                println!("No cached reports.");
            } else {
                print_history(&rows);
            }
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&config.db_path)?;
            db::init_schema(&conn)?;
            let texts = db::fetch_all_texts(&conn)?;
            if texts.is_empty() {
                println!("No cached reports.");
            } else {
                collect_stats(&texts).print();
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// A specific cached report, or the latest one. An unknown id is an error;
/// an empty cache is not.
fn find_report(conn: &rusqlite::Connection, id: Option<i64>) -> anyhow::Result<Option<Report>> {
    match id {
        Some(id) => db::fetch_report(conn, id)?
            .map(Some)
            .ok_or_else(|| anyhow!("No cached report with id {}", id)),
        None => db::fetch_latest(conn),
    }
}

fn print_history(rows: &[db::HistoryRow]) {
    println!(
        "{:>4} | {:<19} | {:<30} | {:<16} | {:>7}",
        "#", "Created (UTC)", "Location", "Species", "Sources"
    );
    println!("{}", "-".repeat(88));
    for r in rows {
        println!(
            "{:>4} | {:<19} | {:<30} | {:<16} | {:>7}",
            r.id,
            r.created_at,
            truncate(&r.location, 30),
            truncate(&r.species, 16),
            r.source_count
        );
    }
    println!("\n{} reports | show one with: anglerpro show <id>", rows.len());
}

const LOADING_PHRASES: &[&str] = &[
    "Decrypting local reports...",
    "Triangulating hot spots...",
    "Calculating lunar windows...",
    "Mapping tackle configs...",
    "Uploading tactical data...",
];

/// Drive `fut` while a spinner cycles through the loading phrases.
async fn with_spinner<T>(fut: impl std::future::Future<Output = T>) -> T {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed}]");
    if let Ok(style) = style {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));

    let ticker = {
        let pb = pb.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(1500));
            for phrase in LOADING_PHRASES.iter().cycle() {
                interval.tick().await;
                pb.set_message(*phrase);
            }
        })
    };

    let out = fut.await;
    ticker.abort();
    pb.finish_and_clear();
    out
}

#[derive(Serialize)]
struct ReportView<'a> {
    report: &'a Report,
    sections: &'a SectionMap,
    bite_scores: &'a [u8],
}

fn print_report(report: &Report, json: bool) -> anyhow::Result<()> {
    let sections = parser::parse_sections(&report.text);
    let scores = parser::bite_scores(&sections);
    if sections.is_empty() {
        warn!("Report has no recognized section tags");
    }

    if json {
        let view = ReportView {
            report,
            sections: &sections,
            bite_scores: &scores,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        let now = chrono::Local::now().naive_local();
        print!("{}", render::report(report, &sections, &scores, now));
    }
    Ok(())
}

struct ReportStats {
    reports: usize,
    coverage: [usize; 7],
    scored_reports: usize,
    score_sum: u64,
    score_count: u64,
}

impl ReportStats {
    fn print(&self) {
        println!("Reports:        {}", self.reports);
        for (kind, count) in SectionKind::ALL.iter().zip(self.coverage) {
            println!("  {:<12}  {:>4} ({:.0}%)", kind.label(), count, percent(count, self.reports));
        }
        println!("With bite data: {}", self.scored_reports);
        if self.score_count > 0 {
            println!(
                "Mean bite:      {:.1}/10",
                self.score_sum as f64 / self.score_count as f64
            );
        }
    }
}

/// Re-parse every cached report; sections are never stored, only derived.
fn collect_stats(texts: &[(i64, String)]) -> ReportStats {
    use rayon::prelude::*;

    let parsed: Vec<(SectionMap, Vec<u8>)> = texts
        .par_iter()
        .map(|(_, text)| {
            let sections = parser::parse_sections(text);
            let scores = parser::bite_scores(&sections);
            (sections, scores)
        })
        .collect();

    let mut stats = ReportStats {
        reports: parsed.len(),
        coverage: [0; 7],
        scored_reports: 0,
        score_sum: 0,
        score_count: 0,
    };
    for (sections, scores) in &parsed {
        for (i, section) in sections.iter().enumerate() {
            if !section.lines.is_empty() {
                stats.coverage[i] += 1;
            }
        }
        if !scores.is_empty() {
            stats.scored_reports += 1;
            stats.score_sum += scores.iter().map(|&s| s as u64).sum::<u64>();
            stats.score_count += scores.len() as u64;
        }
    }
    stats
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

fn file_label(path: Option<&str>) -> String {
    path.and_then(|p| std::path::Path::new(p).file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stdin".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_over_cached_texts() {
        let fixture = std::fs::read_to_string("tests/fixtures/lake_travis.md").unwrap();
        let texts = vec![
            (1, fixture),
            (2, "[SUMMARY] Slow\n[BITE_DATA] 2, 4".to_string()),
            (3, "no tags at all".to_string()),
        ];
        let stats = collect_stats(&texts);
        assert_eq!(stats.reports, 3);
        assert_eq!(stats.coverage[0], 2); // SUMMARY
        assert_eq!(stats.coverage[6], 1); // PRO TIPS
        assert_eq!(stats.scored_reports, 2);
        assert_eq!(stats.score_count, 14);
        assert_eq!(stats.score_sum, 66 + 6);
    }

    #[test]
    fn find_report_empty_cache_and_unknown_id() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        assert!(find_report(&conn, None).unwrap().is_none());
        assert!(find_report(&conn, Some(7)).is_err());

        let report = Report {
            id: None,
            location: "Lake Travis".into(),
            species: None,
            lat: None,
            lng: None,
            model: "gemini-2.5-flash".into(),
            text: "[SUMMARY] Go".into(),
            sources: Vec::new(),
            created_at: "2026-10-16 06:00:00".into(),
        };
        let id = db::save_report(&conn, &report).unwrap();
        assert_eq!(find_report(&conn, None).unwrap().unwrap().id, Some(id));
        assert_eq!(find_report(&conn, Some(id)).unwrap().unwrap().location, "Lake Travis");
    }

    #[test]
    fn truncate_keeps_width() {
        assert_eq!(truncate("Lake Travis", 30), "Lake Travis");
        assert_eq!(truncate("Lake of the Ozarks", 10), "Lake of...");
        assert_eq!(truncate("Lake of the Ozarks", 10).chars().count(), 10);
    }

    #[test]
    fn file_label_uses_stem() {
        assert_eq!(file_label(Some("reports/lake_travis.md")), "lake_travis");
        assert_eq!(file_label(None), "stdin");
    }

    #[test]
    fn cli_parses_negative_coords() {
        let args = ["anglerpro", "scout", "--lat", "30.39", "--lng", "-97.9"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Scout { location, lat, lng, .. } => {
                assert_eq!(location, None);
                assert_eq!(lat.zip(lng), Some((30.39, -97.9)));
            }
            _ => panic!("expected scout"),
        }
    }

    #[test]
    fn cli_lat_requires_lng() {
        assert!(Cli::try_parse_from(["anglerpro", "scout", "Austin", "--lat", "30.39"]).is_err());
    }
}
