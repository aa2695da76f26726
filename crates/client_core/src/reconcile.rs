//! Row-level diff between two rendered todo lists.
//!
//! Rows are matched by id. Matched rows whose visible content differs are
//! reported as updates; matched rows that leave the longest run of rows
//! already in relative order are reported as moves.

use std::collections::HashMap;

use shared::domain::TodoItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    /// Index in the old list.
    pub from: usize,
    /// Index in the new list.
    pub to: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListDiff {
    /// Old-list indices of rows that are gone.
    pub removed: Vec<usize>,
    /// New-list indices of rows that did not exist before.
    pub inserted: Vec<usize>,
    pub moved: Vec<Move>,
    /// New-list indices of rows whose content changed.
    pub updated: Vec<usize>,
}

impl ListDiff {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
            && self.inserted.is_empty()
            && self.moved.is_empty()
            && self.updated.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.removed.len() + self.inserted.len() + self.moved.len() + self.updated.len()
    }
}

pub fn same_row(a: &TodoItem, b: &TodoItem) -> bool {
    a.same_row(b)
}

pub fn content_eq(a: &TodoItem, b: &TodoItem) -> bool {
    a.content_eq(b)
}

pub fn diff(old: &[TodoItem], new: &[TodoItem]) -> ListDiff {
    let old_rows = first_positions(old);
    let new_rows = first_positions(new);
    let mut result = ListDiff::default();

    for (index, item) in old.iter().enumerate() {
        let is_row = old_rows.get(item.id.as_str()) == Some(&index);
        if !is_row || !new_rows.contains_key(item.id.as_str()) {
            result.removed.push(index);
        }
    }

    // (old index, new index) for every matched row, in new-list order.
    let mut matched = Vec::new();
    for (index, item) in new.iter().enumerate() {
        let is_row = new_rows.get(item.id.as_str()) == Some(&index);
        match old_rows.get(item.id.as_str()) {
            Some(&old_index) if is_row => {
                matched.push((old_index, index));
                if !old[old_index].renders_same(item) {
                    result.updated.push(index);
                }
            }
            _ => result.inserted.push(index),
        }
    }

    let old_order: Vec<usize> = matched.iter().map(|(from, _)| *from).collect();
    let stays = longest_increasing_mask(&old_order);
    result.moved = matched
        .iter()
        .zip(stays)
        .filter(|(_, stays)| !stays)
        .map(|(&(from, to), _)| Move { from, to })
        .collect();

    result
}

fn first_positions(items: &[TodoItem]) -> HashMap<&str, usize> {
    let mut positions = HashMap::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        positions.entry(item.id.as_str()).or_insert(index);
    }
    positions
}

/// Marks the members of one longest strictly increasing subsequence.
/// Patience sorting, O(n log n).
fn longest_increasing_mask(values: &[usize]) -> Vec<bool> {
    let mut tails: Vec<usize> = Vec::new();
    let mut predecessor: Vec<Option<usize>> = vec![None; values.len()];

    for (i, &value) in values.iter().enumerate() {
        let slot = tails.partition_point(|&t| values[t] < value);
        predecessor[i] = slot.checked_sub(1).map(|p| tails[p]);
        if slot == tails.len() {
            tails.push(i);
        } else {
            tails[slot] = i;
        }
    }

    let mut mask = vec![false; values.len()];
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        mask[i] = true;
        cursor = predecessor[i];
    }
    mask
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
