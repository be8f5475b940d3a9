use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::{
    error::{AppError, AppResult},
    models::{AnimeRecord, AnimeType},
};

/// Columns every catalog source must provide
const REQUIRED_COLUMNS: [&str; 6] = ["anime_id", "Name", "Score", "Genres", "Type", "Episodes"];

/// A catalog row as it appears in the CSV, before coercion
#[derive(Debug, Deserialize)]
struct RawAnimeRow {
    anime_id: u64,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Score")]
    score: String,
    #[serde(rename = "Genres")]
    genres: String,
    #[serde(rename = "Type")]
    anime_type: String,
    #[serde(rename = "Episodes")]
    episodes: String,
}

impl From<RawAnimeRow> for AnimeRecord {
    fn from(row: RawAnimeRow) -> Self {
        AnimeRecord {
            anime_id: row.anime_id,
            name: row.name,
            score: coerce_score(&row.score),
            genres: row.genres,
            anime_type: AnimeType::from(row.anime_type.as_str()),
            episodes: coerce_episodes(&row.episodes),
        }
    }
}

/// Anything that is not a finite number ("UNKNOWN", "", "nan") becomes `None`
fn coerce_score(raw: &str) -> Option<f32> {
    raw.trim().parse::<f32>().ok().filter(|score| score.is_finite())
}

fn coerce_episodes(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    raw.parse::<u32>().ok().or_else(|| {
        // Some exports write counts as floats ("26.0")
        raw.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite() && *n >= 0.0 && n.fract() == 0.0 && *n <= u32::MAX as f64)
            .map(|n| n as u32)
    })
}

/// Read-only anime metadata, indexed by `anime_id`
///
/// Entries keep their source order. When the source repeats an `anime_id`,
/// the first row wins and later rows are skipped.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<AnimeRecord>,
    index: HashMap<u64, usize>,
}

impl Catalog {
    /// Loads the catalog from a CSV file on disk
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            AppError::DataLoad(format!("Cannot open catalog {}: {}", path.display(), e))
        })?;

        let catalog = Self::from_reader(file)?;

        tracing::info!(
            path = %path.display(),
            entries = catalog.len(),
            "Loaded anime catalog"
        );

        Ok(catalog)
    }

    /// Parses a catalog from any CSV source with a header row
    pub fn from_reader<R: Read>(reader: R) -> AppResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| AppError::DataLoad(format!("Cannot read catalog header: {}", e)))?
            .clone();

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| !headers.iter().any(|h| h == *column))
            .collect();

        if !missing.is_empty() {
            return Err(AppError::DataLoad(format!(
                "Catalog is missing required columns: {}",
                missing.join(", ")
            )));
        }

        let mut catalog = Catalog::default();
        let mut duplicates = 0usize;

        for (line, row) in csv_reader.deserialize::<RawAnimeRow>().enumerate() {
            let row = row.map_err(|e| {
                AppError::DataLoad(format!("Malformed catalog row {}: {}", line + 1, e))
            })?;

            if !catalog.insert(row.into()) {
                duplicates += 1;
            }
        }

        if duplicates > 0 {
            tracing::warn!(
                duplicates,
                "Catalog repeats anime ids; kept the first row for each"
            );
        }

        Ok(catalog)
    }

    /// Builds a catalog from records already in memory, first id wins
    pub fn from_records(records: impl IntoIterator<Item = AnimeRecord>) -> Self {
        let mut catalog = Catalog::default();
        for record in records {
            catalog.insert(record);
        }
        catalog
    }

    /// Returns false when the id was already present
    fn insert(&mut self, record: AnimeRecord) -> bool {
        if self.index.contains_key(&record.anime_id) {
            return false;
        }
        self.index.insert(record.anime_id, self.entries.len());
        self.entries.push(record);
        true
    }

    pub fn lookup(&self, anime_id: u64) -> Option<&AnimeRecord> {
        self.index.get(&anime_id).map(|&pos| &self.entries[pos])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnimeRecord> {
        self.entries.iter()
    }

    /// Highest-scored entries first; unscored entries are left out.
    /// Equal scores keep catalog order.
    pub fn popular(&self, top_n: usize) -> Vec<&AnimeRecord> {
        let mut scored: Vec<(&AnimeRecord, f32)> = self
            .iter()
            .filter_map(|anime| anime.score.map(|score| (anime, score)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.into_iter().take(top_n).map(|(anime, _)| anime).collect()
    }

    /// Entries whose name contains `query`, ignoring case, in catalog order
    pub fn search(&self, query: &str, limit: usize) -> Vec<&AnimeRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.iter()
            .filter(|anime| anime.name_contains(&needle))
            .take(limit)
            .collect()
    }
}
