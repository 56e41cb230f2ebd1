//! Ceiling search over key-ordered samples.
//!
//! Every time/slot alignment in the report goes through [`ceiling`]: client
//! elapsed time to leader slot, and slot to leader/follower CPU sample.

use std::fmt::Debug;
use thiserror::Error;

/// An entry that can be located by an ordered key.
pub trait Keyed {
    type Key: Ord + Copy + Debug;

    fn key(&self) -> Self::Key;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("cannot look up {target} in an empty sequence")]
    Empty { target: String },
}

/// How a lookup was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Some entry's key is not less than the target.
    Exact,
    /// Target at or below the first key.
    ClampedLow,
    /// Target beyond the last key; the last entry was used instead.
    ClampedHigh,
}

#[derive(Debug, Clone, Copy)]
pub struct Found<'a, T> {
    pub index: usize,
    pub entry: &'a T,
    pub resolution: Resolution,
}

/// Return the first entry whose key is `>= target`.
///
/// `entries` must be sorted ascending by key. Targets outside the covered
/// range are clamped to the nearest end; running off the top is logged.
pub fn ceiling<'a, T: Keyed>(entries: &'a [T], target: T::Key) -> Result<Found<'a, T>, LookupError> {
    let Some(first) = entries.first() else {
        return Err(LookupError::Empty {
            target: format!("{target:?}"),
        });
    };
    if target <= first.key() {
        return Ok(Found {
            index: 0,
            entry: first,
            resolution: Resolution::ClampedLow,
        });
    }

    let mut lo = 0;
    let mut hi = entries.len() - 1;
    let last = &entries[hi];
    if last.key() < target {
        tracing::warn!(
            target_key = ?target,
            using = ?last.key(),
            "lookup target out of range, using last entry"
        );
        return Ok(Found {
            index: hi,
            entry: last,
            resolution: Resolution::ClampedHigh,
        });
    }

    // key(lo) < target <= key(hi)
    while lo + 1 < hi {
        let mid = lo + (hi - lo) / 2;
        if target <= entries[mid].key() {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    Ok(Found {
        index: hi,
        entry: &entries[hi],
        resolution: Resolution::Exact,
    })
}
