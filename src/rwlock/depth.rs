// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-thread depth of plain (non-owner) read holds, keyed by lock id.
//!
//! Only the outermost read of a thread goes through admission; the rest are counted here.

use crate::error::{LockError, MAX_NESTING, Nesting};
use std::cell::RefCell;

thread_local! {
    static READ_DEPTHS: RefCell<Vec<(u64, u16)>> = const { RefCell::new(Vec::new()) };
}

/// How many plain reads the current thread holds on lock `id`.
pub(super) fn current(id: u64) -> u16 {
    READ_DEPTHS.with_borrow(|depths| {
        depths
            .iter()
            .find(|(lock, _)| *lock == id)
            .map_or(0, |(_, depth)| *depth)
    })
}

/// Nests one more read if the current thread already reads lock `id`.
///
/// Returns `None` when the thread holds no read yet and has to go through admission.
pub(super) fn nest(id: u64) -> Option<Result<(), LockError>> {
    READ_DEPTHS.with_borrow_mut(|depths| {
        let (_, depth) = depths.iter_mut().find(|(lock, _)| *lock == id)?;
        if *depth == MAX_NESTING {
            return Some(Err(LockError::Overflow(Nesting::Read)));
        }
        *depth += 1;
        Some(Ok(()))
    })
}

/// Records the outermost read of lock `id` after it was admitted.
pub(super) fn enter(id: u64) {
    READ_DEPTHS.with_borrow_mut(|depths| {
        debug_assert!(depths.iter().all(|(lock, _)| *lock != id));
        depths.push((id, 1));
    });
}

/// Drops one read of lock `id` and returns how many remain.
pub(super) fn unnest(id: u64) -> u16 {
    READ_DEPTHS.with_borrow_mut(|depths| {
        let pos = depths.iter().position(|(lock, _)| *lock == id);
        debug_assert!(pos.is_some(), "release_read without a matching acquire_read");
        let Some(pos) = pos else {
            return 0;
        };
        let depth = &mut depths[pos].1;
        *depth -= 1;
        let remaining = *depth;
        if remaining == 0 {
            depths.swap_remove(pos);
        }
        remaining
    })
}
