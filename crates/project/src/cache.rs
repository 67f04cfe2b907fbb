//! Per-key memoization with single-flight builds.
//!
//! Each key owns a slot holding either a finished value, the shared future
//! of the build in progress, or nothing. Every caller that arrives while a
//! build is running awaits the same future. Slots carry a generation counter
//! bumped whenever a build starts or the key is invalidated; a finished build
//! is stored only if its generation is still current, so an invalidation that
//! races a build always wins.

use crate::ProjectKey;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};

type SharedBuild<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

enum SlotState<V, E> {
    Empty,
    Building(SharedBuild<V, E>),
    Ready(V),
}

struct Slot<V, E> {
    generation: u64,
    state: SlotState<V, E>,
}

impl<V, E> Default for Slot<V, E> {
    fn default() -> Self {
        Self {
            generation: 0,
            state: SlotState::Empty,
        }
    }
}

pub(crate) struct SingleFlightCache<V, E> {
    slots: DashMap<ProjectKey, Slot<V, E>>,
}

impl<V, E> Default for SingleFlightCache<V, E> {
    fn default() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }
}

impl<V, E> SingleFlightCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// The finished value for `key`, if one is stored.
    pub(crate) fn get(&self, key: &str) -> Option<V> {
        match &self.slots.get(key)?.state {
            SlotState::Ready(value) => Some(value.clone()),
            SlotState::Empty | SlotState::Building(_) => None,
        }
    }

    /// Returns the stored value or joins the running build, starting one with
    /// `build` if neither exists. Failed builds are never stored.
    pub(crate) async fn get_or_build<F>(&self, key: &ProjectKey, build: F) -> Result<V, E>
    where
        F: FnOnce() -> BoxFuture<'static, Result<V, E>>,
    {
        let (generation, future) = {
            let mut entry = self.slots.entry(key.clone()).or_default();
            let slot = entry.value_mut();
            match &slot.state {
                SlotState::Ready(value) => return Ok(value.clone()),
                SlotState::Building(future) => {
                    tracing::trace!(project = %key, "joining in-flight build");
                    (slot.generation, future.clone())
                }
                SlotState::Empty => {
                    slot.generation += 1;
                    let future = build().shared();
                    slot.state = SlotState::Building(future.clone());
                    (slot.generation, future)
                }
            }
        };

        let result = future.await;

        if let Some(mut slot) = self.slots.get_mut(key) {
            if slot.generation == generation && matches!(slot.state, SlotState::Building(_)) {
                slot.state = match &result {
                    Ok(value) => SlotState::Ready(value.clone()),
                    Err(_) => SlotState::Empty,
                };
            }
        }
        result
    }

    /// Drops the value or in-flight build for `key`. Returns whether
    /// anything was dropped.
    pub(crate) fn invalidate(&self, key: &str) -> bool {
        let Some(mut slot) = self.slots.get_mut(key) else {
            return false;
        };
        slot.generation += 1;
        !matches!(
            std::mem::replace(&mut slot.state, SlotState::Empty),
            SlotState::Empty
        )
    }

    pub(crate) fn clear(&self) {
        for mut slot in self.slots.iter_mut() {
            slot.generation += 1;
            slot.state = SlotState::Empty;
        }
    }

    /// Number of keys with a stored value.
    pub(crate) fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot.state, SlotState::Ready(_)))
            .count()
    }
}
