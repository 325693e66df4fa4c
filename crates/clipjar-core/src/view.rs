//! Derived view: the filtered, sorted subset of clips shown to the user.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::{Clip, ClipError, ClipKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Newest => SortOrder::Oldest,
            SortOrder::Oldest => SortOrder::Newest,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ClipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" | "desc" => Ok(SortOrder::Newest),
            "oldest" | "asc" => Ok(SortOrder::Oldest),
            other => Err(ClipError::UnknownSort(other.to_string())),
        }
    }
}

/// Inputs of the view derivation, kept together instead of as loose UI state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub search: String,
    pub category: Option<ClipKind>,
    pub sort: SortOrder,
}

impl ViewState {
    /// Cycles the category filter: all, text, image, all.
    pub fn cycle_category(&mut self) {
        self.category = match self.category {
            None => Some(ClipKind::Text),
            Some(ClipKind::Text) => Some(ClipKind::Image),
            Some(ClipKind::Image) => None,
        };
    }
}

/// Filters `records` by search text and category, then sorts by creation
/// time. Equal timestamps fall back to id in the same direction.
pub fn derive<'a>(records: &'a [Clip], state: &ViewState) -> Vec<&'a Clip> {
    let needle = state.search.trim().to_lowercase();
    let mut out: Vec<&Clip> = records
        .iter()
        .filter(|c| c.matches_lowercase(&needle))
        .filter(|c| state.category.map(|k| c.kind == k).unwrap_or(true))
        .collect();
    out.sort_by(|a, b| match state.sort {
        SortOrder::Newest => chronological(b, a),
        SortOrder::Oldest => chronological(a, b),
    });
    out
}

fn chronological(a: &Clip, b: &Clip) -> Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.id.cmp(&b.id))
}
