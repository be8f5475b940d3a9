use std::sync::Arc;
use std::time::Duration;

use crate::{
    catalog::Catalog,
    config::Config,
    error::AppResult,
    model::{self, VocabularyGate},
    services::{InferenceAdapter, Predictor, Recommender},
};

/// Immutable context shared by every request handler
///
/// Built once at startup; nothing in it is mutated while serving.
pub struct AppState {
    pub recommender: Recommender,
}

impl AppState {
    pub fn new(
        catalog: Catalog,
        vocabulary: VocabularyGate,
        predictor: Arc<dyn Predictor>,
        inference_timeout: Duration,
    ) -> Self {
        Self {
            recommender: Recommender::new(
                Arc::new(catalog),
                Arc::new(vocabulary),
                InferenceAdapter::new(predictor, inference_timeout),
            ),
        }
    }

    /// Loads the catalog and model named in `config`. Any failure here is fatal.
    pub fn initialize(config: &Config) -> AppResult<Self> {
        let catalog = Catalog::load(&config.catalog_path)?;
        let (vocabulary, embedding_model) = model::load(&config.model_path)?;

        Ok(Self::new(
            catalog,
            vocabulary,
            Arc::new(embedding_model),
            config.inference_timeout(),
        ))
    }
}
