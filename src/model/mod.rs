use ndarray::{Array1, Array2};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{AppError, AppResult};

mod embedding;
mod vocabulary;

pub use embedding::EmbeddingModel;
pub use vocabulary::{Vocabulary, VocabularyGate};

/// On-disk form of a trained collaborative filtering model
///
/// The item capacity is the number of `item_factors` rows, which may be
/// lower than `item_ids.len()` when training truncated the table.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    pub user_ids: Vec<u64>,
    pub item_ids: Vec<u64>,
    pub user_factors: Vec<Vec<f32>>,
    pub item_factors: Vec<Vec<f32>>,
    #[serde(default)]
    pub user_bias: Option<Vec<f32>>,
    #[serde(default)]
    pub item_bias: Option<Vec<f32>>,
    #[serde(default)]
    pub y_range: Option<[f32; 2]>,
}

impl ModelArtifact {
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            AppError::ModelLoad(format!("Cannot open model {}: {}", path.display(), e))
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> AppResult<Self> {
        serde_json::from_reader(reader)
            .map_err(|e| AppError::ModelLoad(format!("Malformed model artifact: {}", e)))
    }

    /// Validates the artifact and splits it into the vocabulary gate and the predictor
    pub fn into_parts(self) -> AppResult<(VocabularyGate, EmbeddingModel)> {
        let users = Vocabulary::new(self.user_ids).map_err(|id| {
            AppError::ModelLoad(format!("User id {} appears twice in the vocabulary", id))
        })?;
        let items = Vocabulary::new(self.item_ids).map_err(|id| {
            AppError::ModelLoad(format!("Anime id {} appears twice in the vocabulary", id))
        })?;

        let width = self
            .user_factors
            .first()
            .or(self.item_factors.first())
            .map(Vec::len)
            .unwrap_or(0);

        let user_factors = to_matrix("user_factors", self.user_factors, width)?;
        let item_factors = to_matrix("item_factors", self.item_factors, width)?;
        let user_bias = to_bias("user_bias", self.user_bias, user_factors.nrows())?;
        let item_bias = to_bias("item_bias", self.item_bias, item_factors.nrows())?;

        let y_range = match self.y_range {
            Some([low, high]) if low < high => Some((low, high)),
            Some([low, high]) => {
                return Err(AppError::ModelLoad(format!(
                    "y_range lower bound {} is not below upper bound {}",
                    low, high
                )))
            }
            None => None,
        };

        let model = EmbeddingModel::new(user_factors, item_factors, user_bias, item_bias, y_range);
        let gate = VocabularyGate::new(users, items, model.num_item_embeddings());

        tracing::info!(
            users = gate.user_ids().len(),
            usable_items = gate.usable_item_ids().len(),
            embedding_dim = model.embedding_dim(),
            "Loaded embedding model"
        );

        Ok((gate, model))
    }
}

fn to_matrix(name: &str, rows: Vec<Vec<f32>>, width: usize) -> AppResult<Array2<f32>> {
    if let Some(pos) = rows.iter().position(|row| row.len() != width) {
        return Err(AppError::ModelLoad(format!(
            "{} row {} has {} values, expected {}",
            name,
            pos,
            rows[pos].len(),
            width
        )));
    }

    let height = rows.len();
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((height, width), flat)
        .map_err(|e| AppError::ModelLoad(format!("{} has an invalid shape: {}", name, e)))
}

fn to_bias(name: &str, bias: Option<Vec<f32>>, rows: usize) -> AppResult<Array1<f32>> {
    match bias {
        None => Ok(Array1::zeros(rows)),
        Some(values) if values.len() == rows => Ok(Array1::from_vec(values)),
        Some(values) => Err(AppError::ModelLoad(format!(
            "{} has {} values for {} embedding rows",
            name,
            values.len(),
            rows
        ))),
    }
}

/// Loads the artifact at `path` and returns its vocabulary gate and predictor
pub fn load(path: impl AsRef<Path>) -> AppResult<(VocabularyGate, EmbeddingModel)> {
    ModelArtifact::load(path)?.into_parts()
}
