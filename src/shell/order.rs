use std::collections::{BTreeMap, BTreeSet};

use crate::error::{StoreError, StoreResult};

/// Order keys so that every `after` target is emitted before its dependents.
///
/// `after_of` maps each key to the key it must follow (empty for none).
/// Targets outside the map are ignored. Keys that are ready at the same time
/// are emitted in ascending order, so the result does not depend on how the
/// caller enumerated them.
pub(crate) fn topological_order(after_of: &BTreeMap<String, String>) -> StoreResult<Vec<String>> {
    let mut in_degree: BTreeMap<&str, usize> =
        after_of.keys().map(|key| (key.as_str(), 0)).collect();
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for (key, after) in after_of {
        if after.is_empty() || !after_of.contains_key(after) {
            continue;
        }
        dependents
            .entry(after.as_str())
            .or_default()
            .push(key.as_str());
        if let Some(degree) = in_degree.get_mut(key.as_str()) {
            *degree += 1;
        }
    }

    let mut ready: BTreeSet<&str> = in_degree
        .iter()
        .filter_map(|(key, degree)| (*degree == 0).then_some(*key))
        .collect();
    let mut ordered = Vec::with_capacity(after_of.len());

    while let Some(next) = ready.pop_first() {
        ordered.push(next.to_string());
        for child in dependents.get(next).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(child) {
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    ready.insert(*child);
                }
            }
        }
    }

    if ordered.len() != after_of.len() {
        let nodes = in_degree
            .into_iter()
            .filter_map(|(key, degree)| (degree > 0).then(|| key.to_string()))
            .collect();
        return Err(StoreError::Cycle { nodes });
    }

    Ok(ordered)
}
