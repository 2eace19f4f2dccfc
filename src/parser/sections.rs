use serde::ser::{Serialize, SerializeMap, Serializer};

use super::lines::Line;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Summary,
    Conditions,
    Spots,
    Timing,
    BiteData,
    Tackle,
    ProTips,
}

impl SectionKind {
    /// Report order, which is also the order the prompt asks for.
    pub const ALL: [SectionKind; 7] = [
        SectionKind::Summary,
        SectionKind::Conditions,
        SectionKind::Spots,
        SectionKind::Timing,
        SectionKind::BiteData,
        SectionKind::Tackle,
        SectionKind::ProTips,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SectionKind::Summary => "SUMMARY",
            SectionKind::Conditions => "CONDITIONS",
            SectionKind::Spots => "SPOTS",
            SectionKind::Timing => "TIMING",
            SectionKind::BiteData => "BITE_DATA",
            SectionKind::Tackle => "TACKLE",
            SectionKind::ProTips => "PRO TIPS",
        }
    }

    /// Case-insensitive lookup of a bracket tag's inner text.
    pub fn from_tag(tag: &str) -> Option<SectionKind> {
        Self::ALL
            .into_iter()
            .find(|k| k.label().eq_ignore_ascii_case(tag.trim()))
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    pub lines: Vec<String>,
}

/// Every known section, always present, in report order.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionMap {
    sections: Vec<Section>,
}

impl Default for SectionMap {
    fn default() -> Self {
        Self {
            sections: SectionKind::ALL
                .into_iter()
                .map(|kind| Section { kind, lines: Vec::new() })
                .collect(),
        }
    }
}

impl SectionMap {
    pub fn get(&self, kind: SectionKind) -> &[String] {
        &self.sections[kind.index()].lines
    }

    pub fn first(&self, kind: SectionKind) -> Option<&str> {
        self.get(kind).first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.lines.is_empty())
    }

    fn push(&mut self, kind: SectionKind, line: String) {
        self.sections[kind.index()].lines.push(line);
    }
}

impl Serialize for SectionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for s in &self.sections {
            map.serialize_entry(s.kind.label(), &s.lines)?;
        }
        map.end()
    }
}

/// Group classified lines under the most recent header. Items seen before
/// any header have nowhere to go and are dropped.
pub fn cluster_sections(lines: &[Line]) -> SectionMap {
    let mut map = SectionMap::default();
    let mut current: Option<SectionKind> = None;

    for line in lines {
        match line {
            Line::Header { kind, rest } => {
                current = Some(*kind);
                if let Some(rest) = rest {
                    map.push(*kind, rest.clone());
                }
            }
            Line::Item(text) => {
                if let Some(kind) = current {
                    map.push(kind, text.clone());
                }
            }
        }
    }

    map
}

// ── Tests ──
