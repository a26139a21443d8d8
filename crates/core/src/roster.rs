use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

/// Correlation handle for a message the bot posted and may later edit or
/// delete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageHandle {
    pub channel: String,
    pub ts: String,
}

impl MessageHandle {
    pub fn new(channel: impl Into<String>, ts: impl Into<String>) -> Self {
        Self { channel: channel.into(), ts: ts.into() }
    }
}

/// A user's standing in the current cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Participation {
    Boarded,
    Declined,
    Undecided,
}

/// Current-cycle participation and preference data.
///
/// Shared mutable state: request handlers mutate it concurrently with the
/// scheduler's reads, so every public operation takes the one internal lock
/// and is atomic on its own. User maps are ordered so resolution over a
/// snapshot is deterministic.
#[derive(Debug, Default)]
pub struct TrainRoster {
    state: Mutex<RosterState>,
}

#[derive(Debug, Default)]
struct RosterState {
    participating: BTreeSet<String>,
    not_participating: BTreeSet<String>,
    time_preferences: BTreeMap<String, Vec<String>>,
    restaurant_preferences: BTreeMap<String, Vec<String>>,
    private_messages: BTreeMap<String, MessageHandle>,
}

/// Immutable copy of the roster taken at resolution time. Mutations arriving
/// after the snapshot apply to the next cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RosterSnapshot {
    pub participating: BTreeSet<String>,
    pub time_preferences: BTreeMap<String, Vec<String>>,
    pub restaurant_preferences: BTreeMap<String, Vec<String>>,
}

impl RosterSnapshot {
    pub fn participant_count(&self) -> usize {
        self.participating.len()
    }
}

impl TrainRoster {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RosterState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Puts the user on the train. Idempotent; makes sure empty preference
    /// containers exist so later selection updates have somewhere to land.
    pub fn mark_participating(&self, user: &str) {
        let mut state = self.state();
        state.participating.insert(user.to_owned());
        state.not_participating.remove(user);
        state.time_preferences.entry(user.to_owned()).or_default();
        state.restaurant_preferences.entry(user.to_owned()).or_default();
    }

    /// Takes the user off the train. Existing preference data is kept in
    /// case the user boards again within the same cycle.
    pub fn mark_not_participating(&self, user: &str) {
        let mut state = self.state();
        state.participating.remove(user);
        state.not_participating.insert(user.to_owned());
    }

    pub fn participation(&self, user: &str) -> Participation {
        let state = self.state();
        if state.participating.contains(user) {
            Participation::Boarded
        } else if state.not_participating.contains(user) {
            Participation::Declined
        } else {
            Participation::Undecided
        }
    }

    pub fn add_time_preference(&self, user: &str, time: &str) {
        insert_unique(self.state().time_preferences.entry(user.to_owned()).or_default(), time);
    }

    /// Removes one time preference, or with `None` resets the user's whole
    /// time selection to empty. The reset applies unconditionally, even for
    /// a user the roster has never seen.
    pub fn remove_time_preference(&self, user: &str, time: Option<&str>) {
        remove_or_clear(&mut self.state().time_preferences, user, time);
    }

    pub fn add_restaurant_preference(&self, user: &str, restaurant: &str) {
        insert_unique(
            self.state().restaurant_preferences.entry(user.to_owned()).or_default(),
            restaurant,
        );
    }

    /// Same contract as [`TrainRoster::remove_time_preference`], for
    /// restaurants.
    pub fn remove_restaurant_preference(&self, user: &str, restaurant: Option<&str>) {
        remove_or_clear(&mut self.state().restaurant_preferences, user, restaurant);
    }

    /// Replaces the user's time selection with a complete new checkbox
    /// state, dropping duplicates while keeping first-seen order.
    pub fn replace_time_selection<I, S>(&self, user: &str, times: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.state();
        let slot = state.time_preferences.entry(user.to_owned()).or_default();
        slot.clear();
        for time in times {
            insert_unique(slot, time.as_ref());
        }
    }

    pub fn replace_restaurant_selection<I, S>(&self, user: &str, restaurants: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.state();
        let slot = state.restaurant_preferences.entry(user.to_owned()).or_default();
        slot.clear();
        for restaurant in restaurants {
            insert_unique(slot, restaurant.as_ref());
        }
    }

    /// Remembers the per-user private prompt so it can be edited or deleted
    /// later in the cycle.
    pub fn record_private_message(&self, user: &str, handle: MessageHandle) {
        self.state().private_messages.insert(user.to_owned(), handle);
    }

    /// Explicit not-found lets callers tell "nothing to edit" apart from a
    /// defect in correlation bookkeeping.
    pub fn private_message(&self, user: &str) -> Option<MessageHandle> {
        self.state().private_messages.get(user).cloned()
    }

    /// Wipes all participation, preference, and correlation state. Called
    /// once per cycle, after resolution and announcement.
    pub fn reset_cycle(&self) {
        let mut state = self.state();
        state.participating.clear();
        state.not_participating.clear();
        state.time_preferences.clear();
        state.restaurant_preferences.clear();
        state.private_messages.clear();
    }

    pub fn snapshot(&self) -> RosterSnapshot {
        let state = self.state();
        RosterSnapshot {
            participating: state.participating.clone(),
            time_preferences: state.time_preferences.clone(),
            restaurant_preferences: state.restaurant_preferences.clone(),
        }
    }
}

fn insert_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_owned());
    }
}

fn remove_or_clear(
    preferences: &mut BTreeMap<String, Vec<String>>,
    user: &str,
    value: Option<&str>,
) {
    match value {
        Some(value) => {
            if let Some(list) = preferences.get_mut(user) {
                list.retain(|existing| existing != value);
            }
        }
        None => {
            preferences.insert(user.to_owned(), Vec::new());
        }
    }
}
