use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod anime;

pub use anime::{AnimeRecord, AnimeType};

/// Default list length offered to a user
pub const DEFAULT_TOP_N: usize = 10;
/// Largest list length a single request may ask for
pub const MAX_TOP_N: usize = 100;
/// Default minimum MyAnimeList score
pub const DEFAULT_MIN_SCORE: f32 = 7.0;

/// Model output for one candidate anime
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate {
    pub anime_id: u64,
    pub predicted_rating: f32,
}

/// A catalog entry merged with the rating the model predicts for the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub anime_id: u64,
    pub name: String,
    pub score: Option<f32>,
    pub genres: String,
    #[serde(rename = "type")]
    pub anime_type: AnimeType,
    pub episodes: Option<u32>,
    pub predicted_rating: f32,
}

impl Recommendation {
    pub fn new(anime: &AnimeRecord, predicted_rating: f32) -> Self {
        Self {
            anime_id: anime.anime_id,
            name: anime.name.clone(),
            score: anime.score,
            genres: anime.genres.clone(),
            anime_type: anime.anime_type,
            episodes: anime.episodes,
            predicted_rating,
        }
    }
}

/// Why a personalized request produced no rows
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// The model has never seen this user
    UnknownUser,
    /// Scoring succeeded but nothing passed the score filter
    NoQualifyingItems,
}

/// Result of the personalized pipeline. Failures are carried by `AppResult` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationOutcome {
    Ranked(Vec<Recommendation>),
    Empty(EmptyReason),
}

/// Where the returned list came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Personalized,
    /// Popularity-ranked substitute, shown when personalization yields nothing
    Fallback,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: u64,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_min_score")]
    pub min_score: f32,
    #[serde(default)]
    pub query: Option<String>,
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_min_score() -> f32 {
    DEFAULT_MIN_SCORE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub user_id: u64,
    pub source: RecommendationSource,
    /// Set when `source` is `fallback`
    pub empty_reason: Option<EmptyReason>,
    pub query: Option<String>,
    pub items: Vec<Recommendation>,
    pub generated_at: DateTime<Utc>,
}
