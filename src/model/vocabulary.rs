use std::collections::HashMap;

/// Ordered identifier list with the categorical code the model assigned to each id
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    ids: Vec<u64>,
    codes: HashMap<u64, usize>,
}

impl Vocabulary {
    /// Builds a vocabulary, rejecting repeated ids (returned as the error)
    pub fn new(ids: Vec<u64>) -> Result<Self, u64> {
        let mut codes = HashMap::with_capacity(ids.len());
        for (code, &id) in ids.iter().enumerate() {
            if codes.insert(id, code).is_some() {
                return Err(id);
            }
        }
        Ok(Self { ids, codes })
    }

    pub fn encode(&self, id: u64) -> Option<usize> {
        self.codes.get(&id).copied()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.codes.contains_key(&id)
    }

    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// The users and items the trained model recognizes
///
/// `item_capacity` is the number of rows in the model's item embedding table.
/// It can be smaller than the item vocabulary when training truncated the
/// table; ids past that point must never be scored.
#[derive(Debug, Clone)]
pub struct VocabularyGate {
    users: Vocabulary,
    items: Vocabulary,
    item_capacity: usize,
}

impl VocabularyGate {
    pub fn new(users: Vocabulary, items: Vocabulary, item_capacity: usize) -> Self {
        if item_capacity < items.len() {
            tracing::warn!(
                item_vocabulary = items.len(),
                item_capacity,
                "Item embedding table is smaller than the item vocabulary; truncating"
            );
        }

        Self {
            users,
            items,
            item_capacity,
        }
    }

    pub fn is_known_user(&self, user_id: u64) -> bool {
        self.users.contains(user_id)
    }

    pub fn encode_user(&self, user_id: u64) -> Option<usize> {
        self.users.encode(user_id)
    }

    /// Only codes inside the embedding table are returned
    pub fn encode_item(&self, anime_id: u64) -> Option<usize> {
        self.items
            .encode(anime_id)
            .filter(|&code| code < self.item_capacity)
    }

    /// Known item ids truncated to the embedding capacity
    pub fn usable_item_ids(&self) -> &[u64] {
        let usable = self.items.len().min(self.item_capacity);
        &self.items.ids()[..usable]
    }

    pub fn user_ids(&self) -> &[u64] {
        self.users.ids()
    }

    pub fn item_capacity(&self) -> usize {
        self.item_capacity
    }
}
