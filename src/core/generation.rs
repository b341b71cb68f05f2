//! Single-slot "latest generation wins" sink.
//!
//! Every recalculation runs under a [`Generation`] handed out by
//! [`LatestWins::supersede`] or [`LatestWins::edit`]. An edit that starts a
//! recalculation bumps the generation under the same lock that applies it.
//! Results may only be written through [`LatestWins::publish`], which compares
//! the generation and writes under that lock too, so a superseded
//! recalculation can never overwrite a newer edit or result.

use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }
}

struct Slot<T> {
    generation: u64,
    value: T,
}

pub struct LatestWins<T: Clone> {
    slot: Mutex<Slot<T>>,
    published: watch::Sender<T>,
}

impl<T: Clone> LatestWins<T> {
    pub fn new(value: T) -> Self {
        let (published, _) = watch::channel(value.clone());
        Self {
            slot: Mutex::new(Slot {
                generation: 0,
                value,
            }),
            published,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub fn begin(&self) -> Generation {
        self.supersede(|_| {})
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.lock().generation == generation.0
    }

    /// Applies `write` only if `generation` is still the latest.
    pub fn publish(&self, generation: Generation, write: impl FnOnce(&mut T)) -> bool {
        let mut slot = self.lock();
        if slot.generation != generation.0 {
            trace!(
                stale = generation.0,
                latest = slot.generation,
                "Discarding superseded result"
            );
            return false;
        }
        write(&mut slot.value);
        self.published.send_replace(slot.value.clone());
        true
    }

    /// Applies `modify` and starts a new generation under the same lock,
    /// superseding every earlier one.
    pub fn supersede(&self, modify: impl FnOnce(&mut T)) -> Generation {
        let mut slot = self.lock();
        modify(&mut slot.value);
        slot.generation += 1;
        self.published.send_replace(slot.value.clone());
        Generation(slot.generation)
    }

    /// Ungated modification, used for edits made by the user. When `modify`
    /// returns `true` a new generation starts before the lock is released.
    pub fn edit(&self, modify: impl FnOnce(&mut T) -> bool) -> Option<Generation> {
        let mut slot = self.lock();
        let supersedes = modify(&mut slot.value);
        let generation = supersedes.then(|| {
            slot.generation += 1;
            Generation(slot.generation)
        });
        self.published.send_replace(slot.value.clone());
        generation
    }

    pub fn read<R>(&self, inspect: impl FnOnce(&T) -> R) -> R {
        inspect(&self.lock().value)
    }

    /// Receives every value written by `publish` or `edit`.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.published.subscribe()
    }
}
