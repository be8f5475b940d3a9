use crate::{
    catalog::Catalog,
    models::{Recommendation, ScoredCandidate},
};

/// Merges model output with catalog metadata and keeps the best `top_n`
///
/// Candidates without a catalog entry are dropped, as are entries whose score
/// is missing or below `min_score`. Ordering is by predicted rating, highest
/// first; equal ratings keep their candidate order.
pub fn rank(
    scored: &[ScoredCandidate],
    catalog: &Catalog,
    min_score: f32,
    top_n: usize,
) -> Vec<Recommendation> {
    let mut merged: Vec<Recommendation> = scored
        .iter()
        .filter_map(|candidate| {
            catalog
                .lookup(candidate.anime_id)
                .map(|anime| (anime, candidate.predicted_rating))
        })
        .filter(|(anime, _)| anime.meets_min_score(min_score))
        .map(|(anime, predicted_rating)| Recommendation::new(anime, predicted_rating))
        .collect();

    // sort_by is stable
    merged.sort_by(|a, b| b.predicted_rating.total_cmp(&a.predicted_rating));
    merged.truncate(top_n);
    merged
}

/// Popularity list used when personalization yields nothing
///
/// The catalog score doubles as the displayed predicted rating.
pub fn fallback(catalog: &Catalog, top_n: usize) -> Vec<Recommendation> {
    catalog
        .popular(top_n)
        .into_iter()
        .filter_map(|anime| {
            anime
                .score
                .map(|score| Recommendation::new(anime, score))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnimeRecord, AnimeType};

    fn anime(anime_id: u64, name: &str, score: Option<f32>) -> AnimeRecord {
        AnimeRecord {
            anime_id,
            name: name.to_string(),
            score,
            genres: "Action".to_string(),
            anime_type: AnimeType::Tv,
            episodes: Some(12),
        }
    }

    fn catalog() -> Catalog {
        Catalog::from_records(vec![
            anime(1, "A", Some(8.0)),
            anime(2, "B", Some(6.0)),
            anime(3, "C", Some(9.0)),
        ])
    }

    fn scored(pairs: &[(u64, f32)]) -> Vec<ScoredCandidate> {
        pairs
            .iter()
            .map(|&(anime_id, predicted_rating)| ScoredCandidate {
                anime_id,
                predicted_rating,
            })
            .collect()
    }

    fn ids(recs: &[Recommendation]) -> Vec<u64> {
        recs.iter().map(|r| r.anime_id).collect()
    }

    #[test]
    fn test_sorted_by_predicted_rating() {
        let recs = rank(&scored(&[(1, 0.9), (2, 0.95), (3, 0.1)]), &catalog(), 0.0, 10);
        assert_eq!(ids(&recs), vec![2, 1, 3]);
        assert_eq!(recs[0].predicted_rating, 0.95);
    }

    #[test]
    fn test_min_score_excludes_regardless_of_prediction() {
        let recs = rank(&scored(&[(1, 0.9), (2, 9.9), (3, 0.1)]), &catalog(), 7.0, 10);
        assert_eq!(ids(&recs), vec![1, 3]);
    }

    #[test]
    fn test_truncates_to_top_n() {
        let recs = rank(&scored(&[(1, 0.9), (2, 0.95), (3, 0.1)]), &catalog(), 0.0, 2);
        assert_eq!(ids(&recs), vec![2, 1]);
        assert!(rank(&scored(&[(1, 0.9)]), &catalog(), 0.0, 0).is_empty());
    }

    #[test]
    fn test_ties_keep_candidate_order() {
        let recs = rank(&scored(&[(3, 0.5), (1, 0.5), (2, 0.5)]), &catalog(), 0.0, 10);
        assert_eq!(ids(&recs), vec![3, 1, 2]);
    }

    #[test]
    fn test_unmatched_candidates_dropped() {
        let recs = rank(&scored(&[(42, 5.0), (1, 0.9)]), &catalog(), 0.0, 10);
        assert_eq!(ids(&recs), vec![1]);
    }

    #[test]
    fn test_unscored_anime_excluded_even_at_zero_threshold() {
        let catalog = Catalog::from_records(vec![anime(1, "A", Some(8.0)), anime(4, "D", None)]);
        let recs = rank(&scored(&[(4, 9.0), (1, 1.0)]), &catalog, 0.0, 10);
        assert_eq!(ids(&recs), vec![1]);
    }

    #[test]
    fn test_result_invariants() {
        let scored = scored(&[(1, 3.0), (2, 7.0), (3, 5.0)]);
        for min_score in [0.0, 6.0, 8.0, 9.0, 9.5] {
            for top_n in 0..=3 {
                let recs = rank(&scored, &catalog(), min_score, top_n);
                assert!(recs.len() <= top_n);
                assert!(recs.iter().all(|r| r.score.unwrap() >= min_score));
                assert!(recs
                    .windows(2)
                    .all(|w| w[0].predicted_rating >= w[1].predicted_rating));
            }
        }
    }

    #[test]
    fn test_fallback_uses_catalog_score_as_rating() {
        let recs = fallback(&catalog(), 2);
        assert_eq!(ids(&recs), vec![3, 1]);
        assert!(recs.iter().all(|r| Some(r.predicted_rating) == r.score));
    }

    #[test]
    fn test_fallback_skips_unscored_anime() {
        let catalog = Catalog::from_records(vec![anime(4, "D", None), anime(2, "B", Some(6.0))]);
        assert_eq!(ids(&fallback(&catalog, 5)), vec![2]);
    }
}
