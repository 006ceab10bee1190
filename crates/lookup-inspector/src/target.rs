//! What the user asked to snoop

use lookup_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entry points into the host model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnoopTarget {
    Selection,
    ActiveView,
    ActiveDocument,
    Application,
    Database,
    Face,
    Edge,
    LinkedElement,
    Point,
    SubElement,
}

/// Interactive references the user picks in the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickKind {
    Face,
    Edge,
    LinkedElement,
    Point,
    SubElement,
}

impl SnoopTarget {
    pub const ALL: [SnoopTarget; 10] = [
        SnoopTarget::Selection,
        SnoopTarget::ActiveView,
        SnoopTarget::ActiveDocument,
        SnoopTarget::Application,
        SnoopTarget::Database,
        SnoopTarget::Face,
        SnoopTarget::Edge,
        SnoopTarget::LinkedElement,
        SnoopTarget::Point,
        SnoopTarget::SubElement,
    ];

    /// `Some` when the target needs an interactive pick
    pub fn pick_kind(self) -> Option<PickKind> {
        match self {
            SnoopTarget::Face => Some(PickKind::Face),
            SnoopTarget::Edge => Some(PickKind::Edge),
            SnoopTarget::LinkedElement => Some(PickKind::LinkedElement),
            SnoopTarget::Point => Some(PickKind::Point),
            SnoopTarget::SubElement => Some(PickKind::SubElement),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SnoopTarget::Selection => "selection",
            SnoopTarget::ActiveView => "active-view",
            SnoopTarget::ActiveDocument => "active-document",
            SnoopTarget::Application => "application",
            SnoopTarget::Database => "database",
            SnoopTarget::Face => "face",
            SnoopTarget::Edge => "edge",
            SnoopTarget::LinkedElement => "linked-element",
            SnoopTarget::Point => "point",
            SnoopTarget::SubElement => "sub-element",
        }
    }
}

impl fmt::Display for SnoopTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnoopTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        SnoopTarget::ALL
            .into_iter()
            .find(|target| target.as_str() == normalized)
            .ok_or_else(|| Error::not_found(format!("snoop target '{}'", s)))
    }
}

impl fmt::Display for PickKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PickKind::Face => "face",
            PickKind::Edge => "edge",
            PickKind::LinkedElement => "linked element",
            PickKind::Point => "point",
            PickKind::SubElement => "subelement",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_targets() {
        let picks: Vec<_> = SnoopTarget::ALL
            .into_iter()
            .filter(|t| t.pick_kind().is_some())
            .collect();
        assert_eq!(picks.len(), 5);
        assert_eq!(SnoopTarget::Selection.pick_kind(), None);
        assert_eq!(SnoopTarget::Edge.pick_kind(), Some(PickKind::Edge));
    }

    #[test]
    fn test_parse() {
        assert_eq!("active_document".parse::<SnoopTarget>().unwrap(), SnoopTarget::ActiveDocument);
        assert_eq!("Sub-Element".parse::<SnoopTarget>().unwrap(), SnoopTarget::SubElement);
        assert!("viewport".parse::<SnoopTarget>().is_err());
    }
}
