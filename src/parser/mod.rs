pub mod bite;
pub mod lines;
pub mod sections;

use sections::{SectionKind, SectionMap};

/// Two-pass pipeline: report text → classified lines → section map.
pub fn parse_sections(text: &str) -> SectionMap {
    let lines = lines::classify_lines(text);
    sections::cluster_sections(&lines)
}

/// Bite scores from the first BITE_DATA line; empty when the section is missing.
pub fn bite_scores(sections: &SectionMap) -> Vec<u8> {
    sections
        .first(SectionKind::BiteData)
        .map(bite::extract_scores)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_bite_scores() {
        let text = std::fs::read_to_string("tests/fixtures/lake_travis.md").unwrap();
        let scores = bite_scores(&parse_sections(&text));
        assert_eq!(scores, vec![8, 9, 7, 5, 3, 2, 2, 3, 4, 6, 8, 9]);
    }

    #[test]
    fn only_first_bite_line_used() {
        let map = parse_sections("[BITE_DATA]\n1, 2, 3\n4, 5, 6");
        assert_eq!(bite_scores(&map), vec![1, 2, 3]);
    }

    #[test]
    fn no_bite_section() {
        let map = parse_sections("[SUMMARY] Slow day");
        assert!(bite_scores(&map).is_empty());
    }

    #[test]
    fn empty_input_degrades_quietly() {
        let map = parse_sections("");
        assert!(map.is_empty());
        assert!(bite_scores(&map).is_empty());
    }

    #[test]
    fn refusal_has_no_sections() {
        let text = std::fs::read_to_string("tests/fixtures/no_tags.md").unwrap();
        assert!(parse_sections(&text).is_empty());
    }
}
