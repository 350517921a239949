//! Helpers that build the play order.
//!
//! The queue is a `Vec<usize>` of library indices and, outside of the
//! `play_track_by_id` front-insert, always a permutation of
//! `0..library_len`. These helpers produce the two orders the controller
//! uses: the natural (library) order and a pinned shuffle.

use rand::seq::SliceRandom;

/// The natural play order: library indices as-is.
pub(crate) fn natural_order(library_len: usize) -> Vec<usize> {
    (0..library_len).collect()
}

/// A uniformly random permutation of `0..library_len` (Fisher-Yates via
/// `SliceRandom::shuffle`). When `pin` names a library index, that index is
/// moved to position 0 after shuffling; the other entries keep their
/// shuffled relative order. This keeps the playing track playing across a
/// shuffle toggle.
pub(crate) fn shuffled_order_pinned(library_len: usize, pin: Option<usize>) -> Vec<usize> {
    let mut order = natural_order(library_len);
    order.shuffle(&mut rand::rng());

    if let Some(pinned) = pin {
        if let Some(pos) = order.iter().position(|&i| i == pinned) {
            let idx = order.remove(pos);
            order.insert(0, idx);
        }
    }

    order
}
