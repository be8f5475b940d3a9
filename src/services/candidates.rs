use crate::model::VocabularyGate;

/// One encoded (user, anime) pair submitted for scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidatePair {
    pub user_code: usize,
    pub anime_id: u64,
    pub item_code: usize,
}

/// All pairs scored for a single request, in item-vocabulary order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    user_id: u64,
    pairs: Vec<CandidatePair>,
}

impl CandidateSet {
    pub fn empty(user_id: u64) -> Self {
        Self {
            user_id,
            pairs: Vec::new(),
        }
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn pairs(&self) -> &[CandidatePair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Splits the pairs into the user and item code columns the model consumes
    pub fn codes(&self) -> (Vec<usize>, Vec<usize>) {
        self.pairs
            .iter()
            .map(|pair| (pair.user_code, pair.item_code))
            .unzip()
    }
}

/// Pairs `user_id` with every usable anime in the vocabulary
///
/// Identifiers that do not encode are dropped instead of failing the request,
/// so an unknown user yields an empty set.
pub fn generate(gate: &VocabularyGate, user_id: u64) -> CandidateSet {
    let Some(user_code) = gate.encode_user(user_id) else {
        return CandidateSet::empty(user_id);
    };

    let pairs: Vec<CandidatePair> = gate
        .usable_item_ids()
        .iter()
        .filter_map(|&anime_id| {
            gate.encode_item(anime_id).map(|item_code| CandidatePair {
                user_code,
                anime_id,
                item_code,
            })
        })
        .collect();

    let dropped = gate.usable_item_ids().len() - pairs.len();
    if dropped > 0 {
        tracing::debug!(user_id, dropped, "Dropped candidates that failed to encode");
    }

    CandidateSet { user_id, pairs }
}
