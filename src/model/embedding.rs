use ndarray::{Array1, Array2, Axis};

use crate::{error::InferenceError, services::inference::Predictor};

/// Dot-product collaborative filtering model with per-user and per-item biases
///
/// `rating = dot(user, item) + user_bias + item_bias`, optionally squashed
/// into `y_range` with a scaled sigmoid.
#[derive(Debug, Clone)]
pub struct EmbeddingModel {
    user_factors: Array2<f32>,
    item_factors: Array2<f32>,
    user_bias: Array1<f32>,
    item_bias: Array1<f32>,
    y_range: Option<(f32, f32)>,
}

impl EmbeddingModel {
    /// Callers guarantee equal factor widths and bias lengths matching table rows
    pub(crate) fn new(
        user_factors: Array2<f32>,
        item_factors: Array2<f32>,
        user_bias: Array1<f32>,
        item_bias: Array1<f32>,
        y_range: Option<(f32, f32)>,
    ) -> Self {
        Self {
            user_factors,
            item_factors,
            user_bias,
            item_bias,
            y_range,
        }
    }

    pub fn num_user_embeddings(&self) -> usize {
        self.user_factors.nrows()
    }

    pub fn num_item_embeddings(&self) -> usize {
        self.item_factors.nrows()
    }

    pub fn embedding_dim(&self) -> usize {
        self.item_factors.ncols()
    }
}

fn check_codes(table: &str, codes: &[usize], rows: usize) -> Result<(), InferenceError> {
    match codes.iter().copied().find(|&code| code >= rows) {
        Some(code) => Err(InferenceError::ShapeMismatch(format!(
            "{} code {} is outside an embedding table of {} rows",
            table, code, rows
        ))),
        None => Ok(()),
    }
}

fn sigmoid_range(x: f32, low: f32, high: f32) -> f32 {
    low + (high - low) / (1.0 + (-x).exp())
}

impl Predictor for EmbeddingModel {
    fn predict(&self, users: &[usize], items: &[usize]) -> Result<Vec<f32>, InferenceError> {
        if users.len() != items.len() {
            return Err(InferenceError::ShapeMismatch(format!(
                "{} user codes for {} item codes",
                users.len(),
                items.len()
            )));
        }

        check_codes("user", users, self.num_user_embeddings())?;
        check_codes("item", items, self.num_item_embeddings())?;

        let user_vectors = self.user_factors.select(Axis(0), users);
        let item_vectors = self.item_factors.select(Axis(0), items);

        let mut ratings = (&user_vectors * &item_vectors).sum_axis(Axis(1));
        ratings += &self.user_bias.select(Axis(0), users);
        ratings += &self.item_bias.select(Axis(0), items);

        if let Some((low, high)) = self.y_range {
            ratings.mapv_inplace(|x| sigmoid_range(x, low, high));
        }

        Ok(ratings.to_vec())
    }
}
