use std::fmt::{self, Write};

use chrono::{Duration, NaiveDateTime};

use crate::db::{GroundingSource, Report};
use crate::parser::bite::{BiteBand, MAX_SCORE};
use crate::parser::sections::{SectionKind, SectionMap};

const SUMMARY_FALLBACK: &str = "Analysis complete. Target identified.";
const NO_BITE_DATA: &str = "Historical data stream unavailable.";
const RULE_WIDTH: usize = 60;

const PANELS: &[(SectionKind, &str)] = &[
    (SectionKind::Conditions, "Water Conditions"),
    (SectionKind::Timing, "Optimal Timing"),
    (SectionKind::Tackle, "Tackle Config"),
    (SectionKind::Spots, "Strategic Spots"),
    (SectionKind::ProTips, "Pro Maneuvers"),
];

/// Full terminal rendering of a report. `now` anchors the bite chart's hour labels.
pub fn report(
    report: &Report,
    sections: &SectionMap,
    scores: &[u8],
    now: NaiveDateTime,
) -> String {
    let mut out = String::new();
    write_report(&mut out, report, sections, scores, now).expect("String writes are infallible");
    out
}

fn write_report(
    out: &mut impl Write,
    report: &Report,
    sections: &SectionMap,
    scores: &[u8],
    now: NaiveDateTime,
) -> fmt::Result {
    let target = report.species.as_deref().unwrap_or("Local game fish");
    writeln!(out, "TACTICAL BRIEFING | {} | {}", report.location, target)?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    let summary = sections.first(SectionKind::Summary).unwrap_or(SUMMARY_FALLBACK);
    writeln!(out, "\"{}\"", summary)?;

    for (kind, title) in PANELS {
        let items = sections.get(*kind);
        if items.is_empty() {
            continue;
        }
        write_heading(out, title)?;
        for item in items {
            writeln!(out, "  > {}", item)?;
        }
    }

    write_heading(out, "12H Bite Probability")?;
    write_bite_chart(out, scores, now)?;

    if !report.sources.is_empty() {
        write_heading(out, "Grounding Sources")?;
        write_sources(out, &report.sources)?;
    }
    Ok(())
}

fn write_heading(out: &mut impl Write, title: &str) -> fmt::Result {
    let pad = RULE_WIDTH.saturating_sub(title.len() + 4);
    writeln!(out, "\n-- {} {}", title, "-".repeat(pad))
}

fn write_bite_chart(out: &mut impl Write, scores: &[u8], now: NaiveDateTime) -> fmt::Result {
    if scores.is_empty() {
        return writeln!(out, "  {}", NO_BITE_DATA);
    }
    for (i, &score) in scores.iter().enumerate() {
        let hour = now + Duration::hours(i as i64);
        // Zero still gets one cell so the row stays visible.
        let filled = score.max(1) as usize;
        let bar = format!(
            "{}{}",
            "#".repeat(filled),
            ".".repeat(MAX_SCORE as usize - filled)
        );
        let marker = if i == 0 { "*" } else { " " };
        writeln!(
            out,
            " {}{} {} {:>2}/10 {}",
            marker,
            hour.format("%H:00"),
            bar,
            score,
            BiteBand::of(score).label()
        )?;
    }
    Ok(())
}

fn write_sources(out: &mut impl Write, sources: &[GroundingSource]) -> fmt::Result {
    for s in sources {
        let kind = if s.uri.contains("maps") { "map" } else { "web" };
        let title = if s.title.is_empty() { "Source" } else { s.title.as_str() };
        writeln!(out, "  [{}] {} <{}>", kind, title, s.uri)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{bite_scores, parse_sections};
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(hour, 20, 0)
            .unwrap()
    }

    fn report_with(text: &str, sources: Vec<GroundingSource>) -> Report {
        Report {
            id: Some(1),
            location: "Lake Travis".into(),
            species: None,
            lat: None,
            lng: None,
            model: "gemini-2.5-flash".into(),
            text: text.into(),
            sources,
            created_at: "2026-10-16 06:00:00".into(),
        }
    }

    fn render(r: &Report, hour: u32) -> String {
        let sections = parse_sections(&r.text);
        let scores = bite_scores(&sections);
        report(r, &sections, &scores, at(hour))
    }

    #[test]
    fn fixture_renders_all_panels() {
        let text = std::fs::read_to_string("tests/fixtures/lake_travis.md").unwrap();
        let out = render(&report_with(&text, Vec::new()), 6);
        assert!(out.starts_with("TACTICAL BRIEFING | Lake Travis | Local game fish"));
        for (_, title) in PANELS {
            assert!(out.contains(title), "missing panel {title}");
        }
        assert!(out.contains("  > Drag the jig, never hop it"));
        assert!(!out.contains("Grounding Sources"));
    }

    #[test]
    fn summary_fallback_and_empty_panels_skipped() {
        let out = render(&report_with("[TIMING] Dawn", Vec::new()), 6);
        assert!(out.contains(&format!("\"{}\"", SUMMARY_FALLBACK)));
        assert!(out.contains("Optimal Timing"));
        assert!(!out.contains("Tackle Config"));
        assert!(out.contains(NO_BITE_DATA));
    }

    #[test]
    fn bite_chart_rows() {
        let out = render(&report_with("[BITE_DATA] 9, 0, 5", Vec::new()), 23);
        assert!(out.contains(" *23:00 #########.  9/10 Peak"));
        assert!(out.contains("  00:00 #.........  0/10 Low"));
        assert!(out.contains("  01:00 #####.....  5/10 Active"));
        assert!(!out.contains(NO_BITE_DATA));
    }

    #[test]
    fn sources_tagged_by_kind() {
        let sources = vec![
            GroundingSource {
                title: "".into(),
                uri: "https://example.com/a".into(),
            },
            GroundingSource {
                title: "Hurst Creek".into(),
                uri: "https://maps.google.com/?cid=7".into(),
            },
        ];
        let out = render(&report_with("", sources), 6);
        assert!(out.contains("  [web] Source <https://example.com/a>"));
        assert!(out.contains("  [map] Hurst Creek <https://maps.google.com/?cid=7>"));
    }
}
