use crate::models::Recommendation;

/// Narrows a ranked list to entries whose name contains `query`, ignoring case
///
/// A missing or blank query leaves the list untouched. Ranking order is kept.
pub fn filter(items: Vec<Recommendation>, query: Option<&str>) -> Vec<Recommendation> {
    let needle = match query.map(str::trim) {
        Some(q) if !q.is_empty() => q.to_lowercase(),
        _ => return items,
    };

    items
        .into_iter()
        .filter(|item| item.name.to_lowercase().contains(&needle))
        .collect()
}
