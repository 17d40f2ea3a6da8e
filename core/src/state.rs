//! Normalized request state.
//!
//! [`ResponsesState`] maps `ActionSet::request()` → tag → [`ResponseState`].
//! It is a persistent value: both levels sit behind `Arc`, updates copy only
//! the outer map and the one inner map they touch, and untouched inner maps
//! stay shared between the old and new state.

use crate::action_set::ActionSet;
use crate::outcome::Outcome;
use crate::request_state::RequestState;
use crate::tag::normalize_tag;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Latest known state of one (action set, tag) slot
///
/// A missing slot reads the same as [`ResponseState::cleared`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseState {
    /// Lifecycle state (`None` when never set or reset)
    pub request_state: Option<RequestState>,
    /// Outcome of the request once settled
    pub data: Option<Outcome>,
}

impl ResponseState {
    /// `{ requestState: null, data: null }`
    #[must_use]
    pub const fn cleared() -> Self {
        Self {
            request_state: None,
            data: None,
        }
    }

    /// A slot in the given state
    #[must_use]
    pub const fn new(request_state: RequestState, data: Option<Outcome>) -> Self {
        Self {
            request_state: Some(request_state),
            data,
        }
    }

    /// Whether the slot is in `state`
    #[must_use]
    pub fn is(&self, state: RequestState) -> bool {
        self.request_state == Some(state)
    }
}

/// Slots of one action set, keyed by tag
pub type TagSlots = HashMap<String, ResponseState>;

/// The normalized state of every tracked request
///
/// Cloning is cheap. Two states can be compared for identity with
/// [`ResponsesState::ptr_eq`], which is how a no-op reduction is detected.
#[derive(Debug, Clone, Default)]
pub struct ResponsesState {
    slots: Arc<HashMap<String, Arc<TagSlots>>>,
}

impl ResponsesState {
    /// An empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether both values are the same state (not merely equal)
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.slots, &b.slots)
    }

    /// Look up a slot
    ///
    /// A missing tag reads the `""` slot.
    #[must_use]
    pub fn slot(&self, action_set: &ActionSet, tag: Option<&str>) -> Option<&ResponseState> {
        self.get(action_set.request(), normalize_tag(tag))
    }

    /// Look up a slot by its raw keys
    #[must_use]
    pub fn get(&self, request_key: &str, tag: &str) -> Option<&ResponseState> {
        self.slots.get(request_key)?.get(tag)
    }

    /// All slots of one action set
    #[must_use]
    pub fn tags(&self, action_set: &ActionSet) -> Option<&Arc<TagSlots>> {
        self.slots.get(action_set.request())
    }

    /// Return a new state with one slot replaced
    ///
    /// Every other slot, and every other action set's inner map, is shared
    /// with `self`.
    #[must_use]
    pub fn with_slot(&self, request_key: &str, tag: &str, slot: ResponseState) -> Self {
        let mut tags = self
            .slots
            .get(request_key)
            .map(|existing| TagSlots::clone(existing))
            .unwrap_or_default();
        tags.insert(tag.to_owned(), slot);

        let mut slots = HashMap::clone(&self.slots);
        slots.insert(request_key.to_owned(), Arc::new(tags));

        Self {
            slots: Arc::new(slots),
        }
    }

    /// Number of action sets with at least one slot
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot was ever written
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate over `(request_key, tag, slot)`
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &ResponseState)> {
        self.slots.iter().flat_map(|(request_key, tags)| {
            tags.iter()
                .map(move |(tag, slot)| (request_key.as_str(), tag.as_str(), slot))
        })
    }
}

impl PartialEq for ResponsesState {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || self.slots == other.slots
    }
}

impl Serialize for ResponsesState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.slots.iter().map(|(key, tags)| (key, tags.as_ref())))
    }
}

impl<'de> Deserialize<'de> for ResponsesState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let slots = HashMap::<String, TagSlots>::deserialize(deserializer)?;
        Ok(Self {
            slots: Arc::new(
                slots
                    .into_iter()
                    .map(|(key, tags)| (key, Arc::new(tags)))
                    .collect(),
            ),
        })
    }
}
