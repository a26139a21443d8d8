use std::collections::BTreeMap;

use crate::roster::RosterSnapshot;

/// The value that won one preference kind, with the number of participating
/// users who voted for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Winner {
    pub value: String,
    pub votes: usize,
}

/// Outcome of scoring one roster snapshot. Ephemeral: recomputed each cycle
/// and overwritten by the next one.
///
/// Dissatisfaction lists hold user ids; rendering them as display names is
/// the announcer's job.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrainResolution {
    pub time: Option<Winner>,
    pub restaurant: Option<Winner>,
    pub time_dissatisfied: Vec<String>,
    pub restaurant_dissatisfied: Vec<String>,
}

/// Scores a snapshot and picks one winning time and one winning restaurant.
///
/// The two kinds resolve independently: an empty score map for one leaves
/// that kind unset without blocking the other. Only participating users
/// count, and empty-string placeholder entries never score. Ties break
/// toward the value encountered first while walking participating users in
/// roster order and each user's preferences in insertion order.
pub fn resolve(snapshot: &RosterSnapshot) -> TrainResolution {
    let participant_count = snapshot.participant_count();

    let time = pick_winner(snapshot, &snapshot.time_preferences);
    let restaurant = pick_winner(snapshot, &snapshot.restaurant_preferences);

    let time_dissatisfied = time
        .as_ref()
        .map(|winner| dissatisfied(snapshot, &snapshot.time_preferences, winner, participant_count))
        .unwrap_or_default();
    let restaurant_dissatisfied = restaurant
        .as_ref()
        .map(|winner| {
            dissatisfied(snapshot, &snapshot.restaurant_preferences, winner, participant_count)
        })
        .unwrap_or_default();

    TrainResolution { time, restaurant, time_dissatisfied, restaurant_dissatisfied }
}

fn pick_winner(
    snapshot: &RosterSnapshot,
    preferences: &BTreeMap<String, Vec<String>>,
) -> Option<Winner> {
    // Scores keep first-encounter order so the max scan below is stable.
    let mut scores: Vec<(String, usize)> = Vec::new();
    for user in &snapshot.participating {
        let Some(values) = preferences.get(user) else {
            continue;
        };
        for value in values {
            if value.is_empty() {
                continue;
            }
            match scores.iter_mut().find(|(scored, _)| scored == value) {
                Some((_, count)) => *count += 1,
                None => scores.push((value.clone(), 1)),
            }
        }
    }

    let mut best: Option<&(String, usize)> = None;
    for entry in &scores {
        // Strictly greater keeps the earliest entry on a tie.
        if best.map_or(true, |current| entry.1 > current.1) {
            best = Some(entry);
        }
    }

    best.map(|(value, votes)| Winner { value: value.clone(), votes: *votes })
}

fn dissatisfied(
    snapshot: &RosterSnapshot,
    preferences: &BTreeMap<String, Vec<String>>,
    winner: &Winner,
    participant_count: usize,
) -> Vec<String> {
    if winner.votes >= participant_count {
        return Vec::new();
    }

    snapshot
        .participating
        .iter()
        .filter(|user| {
            preferences
                .get(*user)
                .map_or(true, |values| !values.iter().any(|value| value == &winner.value))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::roster::TrainRoster;

    use super::*;

    fn roster_with(
        participants: &[&str],
        times: &[(&str, &[&str])],
        restaurants: &[(&str, &[&str])],
    ) -> TrainRoster {
        let roster = TrainRoster::new();
        for user in participants {
            roster.mark_participating(user);
        }
        for (user, values) in times {
            for value in *values {
                roster.add_time_preference(user, value);
            }
        }
        for (user, values) in restaurants {
            for value in *values {
                roster.add_restaurant_preference(user, value);
            }
        }
        roster
    }

    #[test]
    fn majority_time_wins_and_minority_is_dissatisfied() {
        let roster = roster_with(
            &["A", "B", "C"],
            &[("A", &["12:00"]), ("B", &["12:00"]), ("C", &["13:00"])],
            &[],
        );

        let resolution = resolve(&roster.snapshot());
        assert_eq!(
            resolution.time,
            Some(Winner { value: "12:00".to_owned(), votes: 2 })
        );
        assert_eq!(resolution.time_dissatisfied, vec!["C".to_owned()]);
    }

    #[test]
    fn kinds_resolve_independently() {
        // Zero restaurant votes must not block the time result.
        let roster = roster_with(&["A", "B"], &[("A", &["12:00"]), ("B", &["12:00"])], &[]);

        let resolution = resolve(&roster.snapshot());
        assert_eq!(
            resolution.time,
            Some(Winner { value: "12:00".to_owned(), votes: 2 })
        );
        assert_eq!(resolution.restaurant, None);
        assert!(resolution.restaurant_dissatisfied.is_empty());
    }

    #[test]
    fn empty_roster_resolves_to_nothing() {
        let resolution = resolve(&TrainRoster::new().snapshot());
        assert_eq!(resolution, TrainResolution::default());
    }

    #[test]
    fn unanimous_winner_leaves_no_one_dissatisfied() {
        let roster = roster_with(
            &["A", "B"],
            &[("A", &["12:00"]), ("B", &["12:00"])],
            &[("A", &["Trattoria"]), ("B", &["Trattoria"])],
        );

        let resolution = resolve(&roster.snapshot());
        assert!(resolution.time_dissatisfied.is_empty());
        assert!(resolution.restaurant_dissatisfied.is_empty());
    }

    #[test]
    fn tie_breaks_toward_first_encountered_value() {
        // Users walk in roster order (A before B), so A's value is scored
        // first and survives the tie.
        let roster =
            roster_with(&["A", "B"], &[("A", &["11:45"]), ("B", &["13:30"])], &[]);

        let resolution = resolve(&roster.snapshot());
        assert_eq!(
            resolution.time,
            Some(Winner { value: "11:45".to_owned(), votes: 1 })
        );
        assert_eq!(
            resolution.time_dissatisfied,
            vec!["B".to_owned()]
        );
    }

    #[test]
    fn placeholder_entries_never_score() {
        let roster = roster_with(&["A", "B"], &[("A", &[""]), ("B", &["", "12:00"])], &[]);

        let resolution = resolve(&roster.snapshot());
        assert_eq!(
            resolution.time,
            Some(Winner { value: "12:00".to_owned(), votes: 1 })
        );
    }

    #[test]
    fn non_participants_do_not_score_or_complain() {
        let roster = roster_with(
            &["A"],
            &[("A", &["12:00"]), ("B", &["13:00"]), ("C", &["13:00"])],
            &[],
        );
        roster.mark_not_participating("B");

        let resolution = resolve(&roster.snapshot());
        assert_eq!(
            resolution.time,
            Some(Winner { value: "12:00".to_owned(), votes: 1 })
        );
        assert!(resolution.time_dissatisfied.is_empty());
    }

    #[test]
    fn participant_without_any_selection_counts_as_dissatisfied() {
        let roster = roster_with(&["A", "B"], &[("A", &["12:00"])], &[]);

        let resolution = resolve(&roster.snapshot());
        assert_eq!(resolution.time_dissatisfied, vec!["B".to_owned()]);
    }
}
