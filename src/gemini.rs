use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::db::{GroundingSource, Report};

const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;
const REQUEST_TIMEOUT_SECS: u64 = 120;
const THINKING_BUDGET: u32 = 1000;
const DEFAULT_SPECIES: &str = "Local game fish";
const EMPTY_REPORT: &str = "Report unavailable.";

/// What the user asked to scout.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoutRequest {
    pub location: String,
    pub species: Option<String>,
    pub coords: Option<(f64, f64)>,
}

impl ScoutRequest {
    /// A blank location is filled from the coordinates when they exist.
    pub fn new(
        location: Option<String>,
        species: Option<String>,
        coords: Option<(f64, f64)>,
    ) -> Result<Self> {
        let location = location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());
        let location = match location {
            Some(l) => l,
            None => match coords {
                Some((lat, lng)) => format!("{lat:.4}, {lng:.4}"),
                None => bail!("Please provide a location to begin scouting."),
            },
        };
        let species = species.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Ok(Self { location, species, coords })
    }
}

pub fn build_prompt(req: &ScoutRequest) -> String {
    let species = req.species.as_deref().unwrap_or(DEFAULT_SPECIES);
    format!(
        "ACT AS: An elite professional tournament angler and local guide.
TASK: Generate a TACTICAL SCOUTING REPORT for {location}.
TARGET: {species}.

RULES:
- NO conversational filler.
- NO \"Welcome\", \"Good luck\", or \"I hope this helps\".
- USE precise technical terms (e.g., \"12lb Fluorocarbon\", \"Dropshot rig\").
- BE ultra-specific about spots found in the area.

INSTRUCTIONS FOR TACKLE:
- Based on current local reports, infer WATER CLARITY and DEPTH.
- RECOMMEND specific lure colors based on clarity.
- RECOMMEND specific sizes (e.g., \"1/4 oz\", \"5-inch\", \"Size 2 Hook\") \
    based on depth and species behavior.

STRUCTURE YOUR RESPONSE AS FOLLOWS:
[SUMMARY] One short tactical overview sentence.
[CONDITIONS] Brief info on Water Clarity and Target Depth \
    (e.g., \"Clarity: Stained, Depth: 10-15ft\").
[SPOTS] List 2-3 specific coordinate-based or landmark spots with a 1-sentence \"why\".
[TIMING] Precise peak hours and specific weather/lunar triggers.
[BITE_DATA] 12 comma-separated integers (0-10) representing bite intensity \
    for the next 12 hours starting now.
[TACKLE] Bulleted list of specific rod, line, and lure/bait combos including EXACT COLORS and SIZES.
[PRO TIPS] 3-4 punchy technique-specific commands.

Use Search and Maps to find real, active reports.",
        location = req.location,
    )
}

/// JSON body for `models/{model}:generateContent` with search + maps grounding.
pub fn build_request_body(req: &ScoutRequest) -> Value {
    let mut body = json!({
        "contents": [{ "role": "user", "parts": [{ "text": build_prompt(req) }] }],
        "tools": [{ "googleSearch": {} }, { "googleMaps": {} }],
        "generationConfig": {
            "thinkingConfig": { "thinkingBudget": THINKING_BUDGET }
        },
    });
    if let Some((lat, lng)) = req.coords {
        body["toolConfig"] = json!({
            "retrievalConfig": {
                "latLng": { "latitude": lat, "longitude": lng }
            }
        });
    }
    body
}

// ── Response wire types ──

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<ChunkRef>,
    maps: Option<ChunkRef>,
}

#[derive(Debug, Deserialize)]
struct ChunkRef {
    #[serde(default)]
    title: String,
    #[serde(default)]
    uri: String,
}

/// Report text and grounding sources of the first candidate.
fn read_response(resp: GenerateResponse) -> (String, Vec<GroundingSource>) {
    let Some(candidate) = resp.candidates.into_iter().next() else {
        return (EMPTY_REPORT.to_string(), Vec::new());
    };

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|p| !p.thought)
        .filter_map(|p| p.text)
        .collect();
    let text = if text.trim().is_empty() {
        EMPTY_REPORT.to_string()
    } else {
        text
    };

    let sources = candidate
        .grounding_metadata
        .map(|m| m.grounding_chunks)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|chunk| chunk.web.or(chunk.maps))
        .map(|r| GroundingSource {
            title: r.title,
            uri: r.uri,
        })
        .collect();

    (text, sources)
}

// ── Client ──

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            api_key: config.require_api_key()?.to_string(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    /// Ask for a scouting report, retrying rate limits and server errors.
    pub async fn scout(&self, req: &ScoutRequest) -> Result<Report> {
        let body = build_request_body(req);
        let start = Instant::now();

        let mut attempt = 0;
        let resp = loop {
            match self.generate(&body).await? {
                Ok(resp) => break resp,
                Err((status, text)) if is_retryable(status) && attempt < MAX_RETRIES => {
                    let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
                    warn!(
                        "{} from API (attempt {}/{}), backing off {:.1}s",
                        status,
                        attempt + 1,
                        MAX_RETRIES,
                        backoff.as_secs_f64()
                    );
                    debug!("Error body: {}", text);
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err((status, text)) => bail!("Report request failed ({}): {}", status, text),
            }
        };

        let (text, sources) = read_response(resp);
        info!(
            "Report for {} received in {:.1}s ({} sources)",
            req.location,
            start.elapsed().as_secs_f64(),
            sources.len()
        );

        Ok(Report {
            id: None,
            location: req.location.clone(),
            species: req.species.clone(),
            lat: req.coords.map(|c| c.0),
            lng: req.coords.map(|c| c.1),
            model: self.model.clone(),
            text,
            sources,
            created_at: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        })
    }

    /// Outer error: transport or decoding failure. Inner error: non-success status.
    async fn generate(
        &self,
        body: &Value,
    ) -> Result<std::result::Result<GenerateResponse, (StatusCode, String)>> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .context("Failed to reach the generative language API")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Ok(Err((status, text)));
        }

        let parsed = response
            .json::<GenerateResponse>()
            .await
            .context("Failed to decode generateContent response")?;
        Ok(Ok(parsed))
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
