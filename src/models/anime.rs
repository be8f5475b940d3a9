use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Broadcast format of an anime entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AnimeType {
    #[serde(rename = "TV")]
    Tv,
    Movie,
    #[serde(rename = "OVA")]
    Ova,
    #[serde(rename = "ONA")]
    Ona,
    Special,
    Music,
    Unknown,
}

impl From<&str> for AnimeType {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tv" => AnimeType::Tv,
            "movie" => AnimeType::Movie,
            "ova" => AnimeType::Ova,
            "ona" => AnimeType::Ona,
            "special" => AnimeType::Special,
            "music" => AnimeType::Music,
            _ => AnimeType::Unknown,
        }
    }
}

impl Display for AnimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AnimeType::Tv => "TV",
            AnimeType::Movie => "Movie",
            AnimeType::Ova => "OVA",
            AnimeType::Ona => "ONA",
            AnimeType::Special => "Special",
            AnimeType::Music => "Music",
            AnimeType::Unknown => "Unknown",
        };
        write!(f, "{}", label)
    }
}

/// One catalog entry, immutable once loaded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnimeRecord {
    pub anime_id: u64,
    pub name: String,
    /// MyAnimeList average rating on a 0-10 scale; `None` when the source had no number
    pub score: Option<f32>,
    /// Comma-delimited genre tags, as found in the source
    pub genres: String,
    #[serde(rename = "type")]
    pub anime_type: AnimeType,
    pub episodes: Option<u32>,
}

impl AnimeRecord {
    /// Whether this entry passes a minimum-score filter. Entries without a score never do.
    pub fn meets_min_score(&self, min_score: f32) -> bool {
        self.score.is_some_and(|score| score >= min_score)
    }

    /// Case-insensitive substring match on the display name.
    /// `needle` must already be lowercased.
    pub fn name_contains(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
    }
}
