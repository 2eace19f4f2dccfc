use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

pub fn connect(path: &str) -> Result<Connection> {
    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {path}"))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS reports (
            id         INTEGER PRIMARY KEY,
            location   TEXT NOT NULL,
            species    TEXT,
            lat        REAL,
            lng        REAL,
            model      TEXT NOT NULL,
            text       TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_reports_created ON reports(created_at);

        CREATE TABLE IF NOT EXISTS report_sources (
            id        INTEGER PRIMARY KEY,
            report_id INTEGER NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
            position  INTEGER NOT NULL,
            title     TEXT NOT NULL,
            uri       TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sources_report ON report_sources(report_id);
        ",
    )?;
    Ok(())
}

// ── Reports ──

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Store id; `None` until saved.
    pub id: Option<i64>,
    pub location: String,
    pub species: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub model: String,
    pub text: String,
    pub sources: Vec<GroundingSource>,
    pub created_at: String,
}

/// Insert a report and its sources in one transaction; returns the new id.
pub fn save_report(conn: &Connection, report: &Report) -> Result<i64> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO reports (location, species, lat, lng, model, text, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            report.location,
            report.species,
            report.lat,
            report.lng,
            report.model,
            report.text,
            report.created_at,
        ],
    )?;
    let id = tx.last_insert_rowid();
    {
        let mut stmt = tx.prepare(
            "INSERT INTO report_sources (report_id, position, title, uri)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (pos, s) in report.sources.iter().enumerate() {
            stmt.execute(rusqlite::params![id, pos as i64, s.title, s.uri])?;
        }
    }
    tx.commit()?;
    Ok(id)
}

pub fn fetch_report(conn: &Connection, id: i64) -> Result<Option<Report>> {
    let report = conn
        .query_row(
            "SELECT id, location, species, lat, lng, model, text, created_at
             FROM reports WHERE id = ?1",
            [id],
            row_to_report,
        )
        .optional()?;

    match report {
        Some(mut r) => {
            r.sources = fetch_sources(conn, id)?;
            Ok(Some(r))
        }
        None => Ok(None),
    }
}

pub fn fetch_latest(conn: &Connection) -> Result<Option<Report>> {
    let id: Option<i64> = conn
        .query_row("SELECT id FROM reports ORDER BY id DESC LIMIT 1", [], |r| r.get(0))
        .optional()?;
    match id {
        Some(id) => fetch_report(conn, id),
        None => Ok(None),
    }
}

fn row_to_report(row: &rusqlite::Row) -> rusqlite::Result<Report> {
    Ok(Report {
        id: Some(row.get(0)?),
        location: row.get(1)?,
        species: row.get(2)?,
        lat: row.get(3)?,
        lng: row.get(4)?,
        model: row.get(5)?,
        text: row.get(6)?,
        sources: Vec::new(),
        created_at: row.get(7)?,
    })
}

fn fetch_sources(conn: &Connection, report_id: i64) -> Result<Vec<GroundingSource>> {
    let mut stmt = conn.prepare(
        "SELECT title, uri FROM report_sources WHERE report_id = ?1 ORDER BY position",
    )?;
    let rows = stmt
        .query_map([report_id], |row| {
            Ok(GroundingSource {
                title: row.get(0)?,
                uri: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── History ──

pub struct HistoryRow {
    pub id: i64,
    pub created_at: String,
    pub location: String,
    pub species: String,
    pub source_count: usize,
}

pub fn fetch_history(conn: &Connection, limit: usize) -> Result<Vec<HistoryRow>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.created_at, r.location, COALESCE(r.species, ''),
                (SELECT COUNT(*) FROM report_sources s WHERE s.report_id = r.id)
         FROM reports r
         ORDER BY r.id DESC
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit as i64], |row| {
            Ok(HistoryRow {
                id: row.get(0)?,
                created_at: row.get(1)?,
                location: row.get(2)?,
                species: row.get(3)?,
                source_count: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Raw text of every cached report, oldest first.
pub fn fetch_all_texts(conn: &Connection) -> Result<Vec<(i64, String)>> {
    let mut stmt = conn.prepare("SELECT id, text FROM reports ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
