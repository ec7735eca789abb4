// SPDX-License-Identifier: MIT OR Apache-2.0
//! Decides whether a wasm thread may park or has to spin.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

// A mismatched expected value makes `Atomics.wait` return without sleeping. Agents that
// cannot suspend (browser main threads) throw before the comparison, as do hosts without
// shared memory.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(inline_js = "
export function _rrw_canBlock() {
    try {
        const cell = new Int32Array(new SharedArrayBuffer(4));
        return Atomics.wait(cell, 0, 1, 0) === 'not-equal';
    } catch (_) {
        return false;
    }
}
")]
extern "C" {
    fn _rrw_canBlock() -> bool;
}

/// Whether the current wasm thread may park. Probed once per thread.
#[cfg(target_arch = "wasm32")]
pub(crate) fn atomics_wait_supported() -> bool {
    thread_local! {
        static CAN_BLOCK: bool = _rrw_canBlock();
    }
    CAN_BLOCK.with(|can_block| *can_block)
}
