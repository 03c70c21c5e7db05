//! Parsing of the operator's group selection (`1,2,3` or `all`)

use crate::error::{Error, Result};

/// Zero-based indices into the listed groups, plus whatever could not be used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub indices: Vec<usize>,
    pub invalid: Vec<String>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Parse a selection against a list of `count` groups numbered from 1.
///
/// `all` picks every group. Otherwise the input is a comma-separated list of
/// numbers; non-numeric or out-of-range entries land in `invalid` and are
/// skipped. Repeated numbers are kept once, in first-seen order.
pub fn parse_selection(input: &str, count: usize) -> Result<Selection> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::InvalidArgument("No groups selected".to_string()));
    }

    if input.eq_ignore_ascii_case("all") {
        return Ok(Selection {
            indices: (0..count).collect(),
            invalid: Vec::new(),
        });
    }

    let mut selection = Selection::default();
    for part in input.split(',').map(str::trim) {
        if part.is_empty() {
            continue;
        }
        match part.parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => {
                if !selection.indices.contains(&(n - 1)) {
                    selection.indices.push(n - 1);
                }
            }
            _ => selection.invalid.push(part.to_string()),
        }
    }

    Ok(selection)
}
