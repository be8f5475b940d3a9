use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{
    error::InferenceError,
    models::ScoredCandidate,
    services::candidates::CandidateSet,
};

/// Trained rating predictor
///
/// Implementations receive encoded user and item codes of equal length and
/// return one rating per position. `predict` takes `&self` and may run on
/// several blocking threads at once; a predictor with mutable internals must
/// serialize access itself (e.g. behind a `Mutex`).
#[cfg_attr(test, mockall::automock)]
pub trait Predictor: Send + Sync {
    fn predict(&self, users: &[usize], items: &[usize]) -> Result<Vec<f32>, InferenceError>;
}

/// Runs the predictor over a whole candidate set in one batched call
#[derive(Clone)]
pub struct InferenceAdapter {
    predictor: Arc<dyn Predictor>,
    timeout: Duration,
}

impl InferenceAdapter {
    pub fn new(predictor: Arc<dyn Predictor>, timeout: Duration) -> Self {
        Self { predictor, timeout }
    }

    /// Scores every pair, preserving candidate order
    pub async fn score(
        &self,
        candidates: &CandidateSet,
    ) -> Result<Vec<ScoredCandidate>, InferenceError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let (users, items) = candidates.codes();
        let predictor = self.predictor.clone();
        let start = Instant::now();

        let task = tokio::task::spawn_blocking(move || predictor.predict(&users, &items));

        let predictions = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(e)) => return Err(InferenceError::Aborted(e.to_string())),
            Err(_) => {
                // The blocking task runs to completion in the background; its result is discarded
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    candidates = candidates.len(),
                    "Inference timed out"
                );
                return Err(InferenceError::Timeout(self.timeout.as_millis() as u64));
            }
        };

        if predictions.len() != candidates.len() {
            return Err(InferenceError::ShapeMismatch(format!(
                "model returned {} predictions for {} candidates",
                predictions.len(),
                candidates.len()
            )));
        }

        tracing::debug!(
            candidates = candidates.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Batch scored"
        );

        candidates
            .pairs()
            .iter()
            .zip(predictions)
            .map(|(pair, predicted_rating)| {
                if predicted_rating.is_finite() {
                    Ok(ScoredCandidate {
                        anime_id: pair.anime_id,
                        predicted_rating,
                    })
                } else {
                    Err(InferenceError::InvalidPrediction {
                        anime_id: pair.anime_id,
                    })
                }
            })
            .collect()
    }
}
