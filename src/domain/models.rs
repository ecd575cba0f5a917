// Domain models the rest of the crate works with; wire DTOs are mapped into these

use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Serialize};

pub const PLACEHOLDER_IMAGE: &str = "/img/placeholder.png";
const ONSALE_DATE: &str = "onsaleDate";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub extension: String,
}

impl Thumbnail {
    pub fn is_complete(&self) -> bool {
        !self.path.is_empty() && !self.extension.is_empty()
    }

    /// Full image URL, e.g. `http://i.annihil.us/u/prod/marvel/i/mg/c/e0/535fecbbb9784.jpg`
    pub fn url(&self) -> String {
        format!("{}.{}", self.path, self.extension)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComicDate {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "crate::domain::de::opt_datetime")]
    pub date: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comic {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Thumbnail>,
    #[serde(default)]
    pub dates: Vec<ComicDate>,
}

impl Comic {
    /// A comic can be shown in the feed only when it carries a complete thumbnail.
    pub fn is_displayable(&self) -> bool {
        self.thumbnail.as_ref().is_some_and(Thumbnail::is_complete)
    }

    pub fn image_url(&self) -> String {
        match &self.thumbnail {
            Some(t) if t.is_complete() => t.url(),
            _ => PLACEHOLDER_IMAGE.to_string(),
        }
    }

    pub fn onsale_date(&self) -> Option<DateTime<FixedOffset>> {
        self.dates
            .iter()
            .find(|d| d.kind == ONSALE_DATE)
            .and_then(|d| d.date)
    }

    /// Calendar year of the on-sale date, in the date's own offset.
    pub fn release_year(&self) -> Option<i32> {
        self.onsale_date().map(|d| d.year())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Thumbnail>,
}

impl Character {
    pub fn image_url(&self) -> String {
        match &self.thumbnail {
            Some(t) if t.is_complete() => t.url(),
            _ => PLACEHOLDER_IMAGE.to_string(),
        }
    }
}

/// Result of a detail load. Either half may be missing independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComicDetail {
    pub comic: Option<Comic>,
    pub characters: Vec<Character>,
}
