//! Set difference between what is persisted and what is selected.

use std::collections::HashSet;
use std::hash::Hash;

/// Minimal change set moving `current` to `desired`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff<T> {
    /// `desired − current`, in `desired` order.
    pub to_add: Vec<T>,
    /// `current − desired`, in `current` order.
    pub to_remove: Vec<T>,
}

impl<T> Diff<T> {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Number of write calls applying this diff will issue.
    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_remove.len()
    }
}

/// Compute `{to_add, to_remove}` between two id collections treated as sets.
///
/// Duplicates within either input are collapsed (first occurrence wins), so the
/// result never asks for the same id twice.
pub fn diff<T>(current: impl IntoIterator<Item = T>, desired: impl IntoIterator<Item = T>) -> Diff<T>
where
    T: Eq + Hash + Clone,
{
    let current = dedup(current);
    let desired = dedup(desired);

    let current_set: HashSet<&T> = current.iter().collect();
    let desired_set: HashSet<&T> = desired.iter().collect();

    let to_add = desired
        .iter()
        .filter(|id| !current_set.contains(id))
        .cloned()
        .collect();
    let to_remove = current
        .iter()
        .filter(|id| !desired_set.contains(id))
        .cloned()
        .collect();

    Diff { to_add, to_remove }
}

fn dedup<T: Eq + Hash + Clone>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
