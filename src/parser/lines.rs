use std::sync::LazyLock;

use regex::Regex;

use super::sections::SectionKind;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i-u)^\[(SUMMARY|CONDITIONS|SPOTS|TIMING|BITE_DATA|TACKLE|PRO TIPS)\]").unwrap()
});
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[*-]\s*").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// `[TAG] optional trailing text`
    Header { kind: SectionKind, rest: Option<String> },
    /// Any other non-blank line, bullet marker already stripped.
    Item(String),
}

/// Classify every non-blank line of a report. Blank lines are dropped here,
/// so the output may be shorter than the input line count.
pub fn classify_lines(text: &str) -> Vec<Line> {
    text.lines().filter_map(classify_line).collect()
}

fn classify_line(raw: &str) -> Option<Line> {
    let line = raw.trim();
    if line.is_empty() {
        return None;
    }

    let header = HEADER_RE
        .captures(line)
        .and_then(|caps| Some((SectionKind::from_tag(&caps[1])?, caps[0].len())));
    if let Some((kind, tag_len)) = header {
        let rest = line[tag_len..].trim();
        return Some(Line::Header {
            kind,
            rest: (!rest.is_empty()).then(|| rest.to_string()),
        });
    }

    let item = BULLET_RE.replace(line, "");
    if item.is_empty() {
        return None;
    }
    Some(Line::Item(item.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_with_trailing_text() {
        let lines = classify_lines("[SUMMARY] Bass are shallow");
        assert_eq!(
            lines,
            vec![Line::Header {
                kind: SectionKind::Summary,
                rest: Some("Bass are shallow".into())
            }]
        );
    }

    #[test]
    fn header_case_insensitive() {
        let lines = classify_lines("[pro tips]\n[Bite_Data] 1,2,3");
        assert!(matches!(&lines[0], Line::Header { kind: SectionKind::ProTips, rest: None }));
        assert!(matches!(
            &lines[1],
            Line::Header { kind: SectionKind::BiteData, rest: Some(r) } if r == "1,2,3"
        ));
    }

    #[test]
    fn unknown_tag_is_item() {
        let lines = classify_lines("[WEATHER] Overcast");
        assert_eq!(lines, vec![Line::Item("[WEATHER] Overcast".into())]);
    }

    #[test]
    fn non_ascii_case_fold_is_not_a_header() {
        // U+017F folds to 's' under Unicode rules only.
        let lines =
            classify_lines("[TIMING] Dawn\n[\u{17f}UMMARY] keep me\n[\u{212a}ACKLE] and me");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], Line::Item("[\u{17f}UMMARY] keep me".into()));
        assert_eq!(lines[2], Line::Item("[\u{212a}ACKLE] and me".into()));
    }

    #[test]
    fn header_must_lead_the_line() {
        let lines = classify_lines("See [SPOTS] below");
        assert_eq!(lines, vec![Line::Item("See [SPOTS] below".into())]);
    }

    #[test]
    fn bullets_stripped() {
        let lines = classify_lines("- Use a jig\n* Use a jig\n*Tight line");
        assert_eq!(
            lines,
            vec![
                Line::Item("Use a jig".into()),
                Line::Item("Use a jig".into()),
                Line::Item("Tight line".into()),
            ]
        );
    }

    #[test]
    fn only_one_bullet_stripped() {
        let lines = classify_lines("- - nested");
        assert_eq!(lines, vec![Line::Item("- nested".into())]);
    }

    #[test]
    fn blank_and_bare_bullet_lines_dropped() {
        let lines = classify_lines("\n   \n-\n\r\n");
        assert!(lines.is_empty());
    }

    #[test]
    fn crlf_input() {
        let lines = classify_lines("[TIMING] Dawn\r\n- Dusk\r\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], Line::Item("Dusk".into()));
    }
}
