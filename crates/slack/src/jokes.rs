use rand::Rng;

pub const TRAIN_EMOJI: [&str; 7] = [
    ":train2:",
    ":bullettrain_side:",
    ":bullettrain_front:",
    ":light_rail:",
    ":station:",
    ":tram:",
    ":monorail:",
];

pub const FOOD_EMOJI: [&str; 20] = [
    ":poultry_leg:",
    ":hamburger:",
    ":pizza:",
    ":hotdog:",
    ":sandwich:",
    ":taco:",
    ":burrito:",
    ":tamale:",
    ":falafel:",
    ":fried_egg:",
    ":fondue:",
    ":cucumber:",
    ":shallow_pan_of_food:",
    ":spaghetti:",
    ":sushi:",
    ":ramen:",
    ":bento:",
    ":curry:",
    ":panzerotto:",
    ":eggplant:",
];

const SPECIAL_JOKES: [&str; 3] = [
    "Chuck Norris can deadlock a single thread.",
    "Chuck Norris's lunch break blocks the scheduler, not the other way around.",
    "Chuck Norris doesn't vote for a restaurant. The restaurant votes for him.",
];

const ITALIAN_JOKES: [&str; 4] = [
    "Perche' i programmatori confondono Halloween e Natale? Perche' OCT 31 == DEC 25.",
    "Ci sono 10 tipi di persone: chi capisce il binario e chi no.",
    "Il pranzo non e' in ritardo, e' in coda di priorita'.",
    "Un UDP entra in un bar. Nessuno lo ascolta, ma a lui va bene cosi'.",
];

const DEFAULT_JOKES: [&str; 6] = [
    "An SQL query walks into a bar, walks up to two tables and asks: may I join you?",
    "There are only two hard things in computer science: cache invalidation, naming things, and off-by-one errors.",
    "A TCP packet walks into a bar and says: I'd like a beer. The barman replies: you'd like a beer? Yes, I'd like a beer.",
    "Why do programmers prefer dark mode? Because light attracts bugs.",
    "It works on my machine. Then we'll ship your machine.",
    "Real programmers count from 0.",
];

/// Weighted joke categories for the daily prompt: roughly 5% special,
/// 35% secondary-language, 60% default. Content flavor only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JokeCategory {
    Special,
    SecondaryLanguage,
    Default,
}

fn category_for_roll(roll: u8) -> JokeCategory {
    match roll {
        0..=4 => JokeCategory::Special,
        5..=39 => JokeCategory::SecondaryLanguage,
        _ => JokeCategory::Default,
    }
}

pub fn pick_joke<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    let jokes: &[&'static str] = match category_for_roll(rng.gen_range(0..100)) {
        JokeCategory::Special => &SPECIAL_JOKES,
        JokeCategory::SecondaryLanguage => &ITALIAN_JOKES,
        JokeCategory::Default => &DEFAULT_JOKES,
    };
    jokes[rng.gen_range(0..jokes.len())]
}

pub fn pick_food_emoji<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    FOOD_EMOJI[rng.gen_range(0..FOOD_EMOJI.len())]
}

pub fn pick_train_emoji<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    TRAIN_EMOJI[rng.gen_range(0..TRAIN_EMOJI.len())]
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn category_boundaries_follow_the_weighting() {
        assert_eq!(category_for_roll(0), JokeCategory::Special);
        assert_eq!(category_for_roll(4), JokeCategory::Special);
        assert_eq!(category_for_roll(5), JokeCategory::SecondaryLanguage);
        assert_eq!(category_for_roll(39), JokeCategory::SecondaryLanguage);
        assert_eq!(category_for_roll(40), JokeCategory::Default);
        assert_eq!(category_for_roll(99), JokeCategory::Default);
    }

    #[test]
    fn every_pick_lands_in_a_known_table() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let joke = pick_joke(&mut rng);
            let known = SPECIAL_JOKES.contains(&joke)
                || ITALIAN_JOKES.contains(&joke)
                || DEFAULT_JOKES.contains(&joke);
            assert!(known, "unexpected joke `{joke}`");
        }
    }

    #[test]
    fn emoji_picks_come_from_their_tables() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert!(FOOD_EMOJI.contains(&pick_food_emoji(&mut rng)));
            assert!(TRAIN_EMOJI.contains(&pick_train_emoji(&mut rng)));
        }
    }
}
