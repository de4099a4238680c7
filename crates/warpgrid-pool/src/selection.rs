//! Selection policy — which of N equivalent idle connections is served next.
//!
//! Before every reservation the pool lets the policy reorder the available
//! collection and then serves its front element. Shuffling spreads load
//! across physical connections so no single one absorbs every reservation
//! while the others only ever see keepalive probes.

use std::collections::VecDeque;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Ordering applied to the available collection before each reservation.
#[derive(Debug)]
pub enum SelectionPolicy {
    /// Uniform random permutation.
    Shuffle(StdRng),
    /// Leave the collection untouched: the most recently released
    /// connection is served first.
    InOrder,
}

impl SelectionPolicy {
    /// Shuffle seeded from the OS entropy source.
    pub fn random() -> Self {
        Self::Shuffle(StdRng::from_entropy())
    }

    /// Shuffle with a fixed seed, for reproducible ordering.
    pub fn seeded(seed: u64) -> Self {
        Self::Shuffle(StdRng::seed_from_u64(seed))
    }

    pub fn in_order() -> Self {
        Self::InOrder
    }

    pub(crate) fn arrange<T>(&mut self, items: &mut VecDeque<T>) {
        match self {
            Self::Shuffle(rng) => items.make_contiguous().shuffle(rng),
            Self::InOrder => {}
        }
    }
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::random()
    }
}
