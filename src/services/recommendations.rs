use chrono::Utc;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use crate::{
    catalog::Catalog,
    error::{AppError, AppResult},
    model::VocabularyGate,
    models::{
        EmptyReason, RecommendationOutcome, RecommendationRequest, RecommendationResponse,
        RecommendationSource, MAX_TOP_N,
    },
    services::{candidates, inference::InferenceAdapter, ranking, title_search},
};

/// Pipeline stages a request moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Start,
    Validating,
    Scoring,
    Merging,
    Done,
    Failed,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Validating => "validating",
            Stage::Scoring => "scoring",
            Stage::Merging => "merging",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Request-scoped stage tracker that logs every transition
struct StageTracker {
    user_id: u64,
    stage: Stage,
}

impl StageTracker {
    fn new(user_id: u64) -> Self {
        Self {
            user_id,
            stage: Stage::Start,
        }
    }

    fn advance(&mut self, next: Stage) {
        tracing::debug!(user_id = self.user_id, from = %self.stage, to = %next, "Pipeline stage");
        self.stage = next;
    }

    fn fail(&mut self, reason: &str) {
        tracing::debug!(user_id = self.user_id, from = %self.stage, reason, "Pipeline failed");
        self.stage = Stage::Failed;
    }
}

/// Personalized recommendation pipeline over shared, read-only model state
#[derive(Clone)]
pub struct Recommender {
    catalog: Arc<Catalog>,
    vocabulary: Arc<VocabularyGate>,
    inference: InferenceAdapter,
}

impl Recommender {
    pub fn new(
        catalog: Arc<Catalog>,
        vocabulary: Arc<VocabularyGate>,
        inference: InferenceAdapter,
    ) -> Self {
        Self {
            catalog,
            vocabulary,
            inference,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn vocabulary(&self) -> &VocabularyGate {
        &self.vocabulary
    }

    /// Scores every usable anime for `user_id` and returns the best `top_n`
    ///
    /// An unknown user or an empty filtered list is reported as
    /// `RecommendationOutcome::Empty`; a scoring failure is an error.
    pub async fn recommend(
        &self,
        user_id: u64,
        top_n: usize,
        min_score: f32,
    ) -> AppResult<RecommendationOutcome> {
        let mut tracker = StageTracker::new(user_id);

        tracker.advance(Stage::Validating);
        if !self.vocabulary.is_known_user(user_id) {
            tracker.fail("unknown user");
            tracing::info!(user_id, "User unknown to the model; no personalization");
            return Ok(RecommendationOutcome::Empty(EmptyReason::UnknownUser));
        }

        tracker.advance(Stage::Scoring);
        let candidate_set = candidates::generate(&self.vocabulary, user_id);
        let scored = match self.inference.score(&candidate_set).await {
            Ok(scored) => scored,
            Err(e) => {
                tracker.fail("inference error");
                tracing::error!(user_id, error = %e, "Inference failed");
                return Err(e.into());
            }
        };

        tracker.advance(Stage::Merging);
        let ranked = ranking::rank(&scored, &self.catalog, min_score, top_n);
        if ranked.is_empty() {
            tracker.fail("nothing passed the score filter");
            return Ok(RecommendationOutcome::Empty(EmptyReason::NoQualifyingItems));
        }

        tracker.advance(Stage::Done);
        Ok(RecommendationOutcome::Ranked(ranked))
    }
}

fn validate(request: &RecommendationRequest) -> AppResult<()> {
    if request.top_n == 0 || request.top_n > MAX_TOP_N {
        return Err(AppError::InvalidInput(format!(
            "top_n must be between 1 and {}",
            MAX_TOP_N
        )));
    }

    if !(0.0..=10.0).contains(&request.min_score) {
        return Err(AppError::InvalidInput(
            "min_score must be between 0 and 10".to_string(),
        ));
    }

    Ok(())
}

/// Generates a user's recommendation list
///
/// Runs the personalized pipeline and, when it comes back empty, substitutes
/// the popularity list. The optional name query is applied last, to
/// whichever list was chosen.
pub async fn get_recommendations(
    recommender: &Recommender,
    request: RecommendationRequest,
) -> AppResult<RecommendationResponse> {
    validate(&request)?;
    let start = Instant::now();

    let (source, empty_reason, items) = match recommender
        .recommend(request.user_id, request.top_n, request.min_score)
        .await?
    {
        RecommendationOutcome::Ranked(items) => (RecommendationSource::Personalized, None, items),
        RecommendationOutcome::Empty(reason) => {
            tracing::warn!(
                user_id = request.user_id,
                reason = ?reason,
                "No personalized recommendations; showing popular anime instead"
            );
            (
                RecommendationSource::Fallback,
                Some(reason),
                ranking::fallback(recommender.catalog(), request.top_n),
            )
        }
    };

    let query = request.query.filter(|q| !q.trim().is_empty());
    let items = title_search::filter(items, query.as_deref());

    tracing::info!(
        user_id = request.user_id,
        source = ?source,
        returned = items.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Recommendations ready"
    );

    Ok(RecommendationResponse {
        user_id: request.user_id,
        source,
        empty_reason,
        query,
        items,
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InferenceError;
    use crate::model::Vocabulary;
    use crate::models::{AnimeRecord, AnimeType};
    use crate::services::inference::MockPredictor;
    use std::time::Duration;

    fn anime(anime_id: u64, name: &str, score: Option<f32>) -> AnimeRecord {
        AnimeRecord {
            anime_id,
            name: name.to_string(),
            score,
            genres: "Action, Fantasy".to_string(),
            anime_type: AnimeType::Tv,
            episodes: None,
        }
    }

    /// Users 100 and 200 are known; items 1-3 are usable, 4 is past capacity
    fn recommender(mock: MockPredictor) -> Recommender {
        let catalog = Catalog::from_records(vec![
            anime(1, "Shingeki no Kyojin", Some(8.0)),
            anime(2, "Naruto", Some(6.0)),
            anime(3, "Steins;Gate", Some(9.0)),
            anime(4, "Gintama", Some(9.5)),
            anime(5, "Unscored Special", None),
        ]);
        let gate = VocabularyGate::new(
            Vocabulary::new(vec![100, 200]).unwrap(),
            Vocabulary::new(vec![1, 2, 3, 4]).unwrap(),
            3,
        );

        Recommender::new(
            Arc::new(catalog),
            Arc::new(gate),
            InferenceAdapter::new(Arc::new(mock), Duration::from_secs(1)),
        )
    }

    fn scoring(predictions: Vec<f32>) -> MockPredictor {
        let mut mock = MockPredictor::new();
        mock.expect_predict()
            .times(1)
            .returning(move |_, _| Ok(predictions.clone()));
        mock
    }

    fn request(
        user_id: u64,
        top_n: usize,
        min_score: f32,
        query: Option<&str>,
    ) -> RecommendationRequest {
        RecommendationRequest {
            user_id,
            top_n,
            min_score,
            query: query.map(str::to_string),
        }
    }

    fn ids(response: &RecommendationResponse) -> Vec<u64> {
        response.items.iter().map(|i| i.anime_id).collect()
    }

    #[tokio::test]
    async fn test_known_user_gets_ranked_list() {
        let recommender = recommender(scoring(vec![0.9, 0.95, 0.1]));
        let outcome = recommender.recommend(100, 10, 0.0).await.unwrap();

        match outcome {
            RecommendationOutcome::Ranked(items) => {
                let ids: Vec<u64> = items.iter().map(|i| i.anime_id).collect();
                assert_eq!(ids, vec![2, 1, 3]);
            }
            other => panic!("expected ranked list, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_user_is_empty_without_inference() {
        let mut mock = MockPredictor::new();
        mock.expect_predict().times(0);

        let outcome = recommender(mock).recommend(999, 10, 0.0).await.unwrap();
        assert_eq!(outcome, RecommendationOutcome::Empty(EmptyReason::UnknownUser));
    }

    #[tokio::test]
    async fn test_everything_filtered_is_empty() {
        let outcome = recommender(scoring(vec![5.0, 5.0, 5.0]))
            .recommend(100, 10, 9.5)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            RecommendationOutcome::Empty(EmptyReason::NoQualifyingItems)
        );
    }

    #[tokio::test]
    async fn test_zero_capacity_is_empty() {
        let mut mock = MockPredictor::new();
        mock.expect_predict().times(0);

        let gate = VocabularyGate::new(
            Vocabulary::new(vec![100]).unwrap(),
            Vocabulary::new(vec![1, 2]).unwrap(),
            0,
        );
        let recommender = Recommender::new(
            Arc::new(Catalog::from_records(vec![anime(1, "Mushishi", Some(8.7))])),
            Arc::new(gate),
            InferenceAdapter::new(Arc::new(mock), Duration::from_secs(1)),
        );

        let outcome = recommender.recommend(100, 10, 0.0).await.unwrap();
        assert_eq!(
            outcome,
            RecommendationOutcome::Empty(EmptyReason::NoQualifyingItems)
        );
    }

    #[tokio::test]
    async fn test_inference_failure_is_error_not_empty() {
        let mut mock = MockPredictor::new();
        mock.expect_predict()
            .returning(|_, _| Err(InferenceError::ShapeMismatch("bad weights".to_string())));

        let err = recommender(mock).recommend(100, 10, 0.0).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Inference(InferenceError::ShapeMismatch(_))
        ));
    }

    #[tokio::test]
    async fn test_capacity_excludes_items_past_embedding_table() {
        let mut mock = MockPredictor::new();
        mock.expect_predict()
            .withf(|_, items| items.to_vec() == vec![0, 1, 2])
            .returning(|_, _| Ok(vec![1.0, 2.0, 3.0]));

        let response = get_recommendations(&recommender(mock), request(200, 10, 0.0, None))
            .await
            .unwrap();
        assert!(!ids(&response).contains(&4));
    }

    #[tokio::test]
    async fn test_personalized_response_applies_query() {
        let response = get_recommendations(
            &recommender(scoring(vec![0.9, 0.95, 0.1])),
            request(100, 10, 7.0, Some("GATE")),
        )
        .await
        .unwrap();

        assert_eq!(response.source, RecommendationSource::Personalized);
        assert_eq!(response.empty_reason, None);
        assert_eq!(response.query.as_deref(), Some("GATE"));
        assert_eq!(ids(&response), vec![3]);
    }

    #[tokio::test]
    async fn test_unknown_user_falls_back_to_popular() {
        let mut mock = MockPredictor::new();
        mock.expect_predict().times(0);

        let response = get_recommendations(&recommender(mock), request(999, 3, 7.0, None))
            .await
            .unwrap();

        assert_eq!(response.source, RecommendationSource::Fallback);
        assert_eq!(response.empty_reason, Some(EmptyReason::UnknownUser));
        assert_eq!(ids(&response), vec![4, 3, 1]);
        assert!(response
            .items
            .iter()
            .all(|i| Some(i.predicted_rating) == i.score));
    }

    #[tokio::test]
    async fn test_fallback_then_query() {
        let response = get_recommendations(
            &recommender(scoring(vec![1.0, 1.0, 1.0])),
            request(100, 5, 10.0, Some("naru")),
        )
        .await
        .unwrap();

        assert_eq!(response.source, RecommendationSource::Fallback);
        assert_eq!(response.empty_reason, Some(EmptyReason::NoQualifyingItems));
        assert_eq!(ids(&response), vec![2]);
    }

    #[tokio::test]
    async fn test_inference_failure_does_not_fall_back() {
        let mut mock = MockPredictor::new();
        mock.expect_predict()
            .returning(|_, _| Err(InferenceError::Model("corrupt".to_string())));

        let result = get_recommendations(&recommender(mock), request(100, 5, 7.0, None)).await;
        assert!(matches!(result, Err(AppError::Inference(_))));
    }

    #[tokio::test]
    async fn test_invalid_parameters_rejected() {
        for bad in [
            request(100, 0, 7.0, None),
            request(100, MAX_TOP_N + 1, 7.0, None),
            request(100, 10, -1.0, None),
            request(100, 10, 10.5, None),
            request(100, 10, f32::NAN, None),
        ] {
            let mut mock = MockPredictor::new();
            mock.expect_predict().times(0);
            let result = get_recommendations(&recommender(mock), bad).await;
            assert!(matches!(result, Err(AppError::InvalidInput(_))));
        }
    }

    #[tokio::test]
    async fn test_blank_query_is_dropped() {
        let response = get_recommendations(
            &recommender(scoring(vec![0.9, 0.95, 0.1])),
            request(100, 10, 0.0, Some("  ")),
        )
        .await
        .unwrap();
        assert_eq!(response.query, None);
        assert_eq!(ids(&response), vec![2, 1, 3]);
    }
}
