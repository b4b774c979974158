//! 1-based display positions over a store's visible window.
//!
//! Position `1` is the first visible item (the newest one right after an add).
//! Positions are only meaningful against the window they were printed from; anything
//! past the window is reported back as missing rather than reaching into hidden items.

use crate::error::{QrError, Result};
use crate::model::Item;
use std::collections::HashSet;
use uuid::Uuid;

/// Longest range a single argument may expand to.
pub const MAX_RANGE_LEN: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayItem {
    pub index: usize,
    pub item: Item,
}

/// Numbers the visible items from 1.
pub fn index_items(visible: &[Item]) -> Vec<DisplayItem> {
    visible
        .iter()
        .enumerate()
        .map(|(i, item)| DisplayItem {
            index: i + 1,
            item: item.clone(),
        })
        .collect()
}

/// Parses a single position ("3") or an inclusive range ("2-5").
pub fn parse_index_or_range(s: &str) -> std::result::Result<Vec<usize>, String> {
    let s = s.trim();
    if let Some(dash_pos) = s.find('-') {
        if dash_pos > 0 {
            let start = parse_position(&s[..dash_pos])?;
            let end = parse_position(&s[dash_pos + 1..])?;
            if start > end {
                return Err(format!(
                    "Invalid range: start ({}) must be <= end ({})",
                    start, end
                ));
            }
            if end - start >= MAX_RANGE_LEN {
                return Err(format!(
                    "Invalid range: {}-{} spans more than {} positions",
                    start, end, MAX_RANGE_LEN
                ));
            }
            return Ok((start..=end).collect());
        }
    }
    parse_position(s).map(|p| vec![p])
}

fn parse_position(s: &str) -> std::result::Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("Invalid index: positions start at 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("Invalid index format: {}", s)),
    }
}

/// Parses every input and flattens the result, keeping first occurrences in order.
pub fn parse_positions<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<usize>> {
    let mut positions = Vec::new();
    let mut seen = HashSet::new();
    for input in inputs {
        for position in parse_index_or_range(input.as_ref()).map_err(QrError::Api)? {
            if seen.insert(position) {
                positions.push(position);
            }
        }
    }
    Ok(positions)
}

/// Positions split into the ids they point at and the ones past the window.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Resolved {
    pub ids: Vec<Uuid>,
    pub missing: Vec<usize>,
}

pub fn resolve(visible: &[Item], positions: &[usize]) -> Resolved {
    let mut resolved = Resolved::default();
    for &position in positions {
        match visible.get(position - 1) {
            Some(item) => resolved.ids.push(item.id),
            None => resolved.missing.push(position),
        }
    }
    resolved
}
