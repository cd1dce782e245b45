//! Memecoin name generator
//!
//! Produces the synthetic crypto names for each round's catalog.
//! Pattern: {Prefix}{Suffix}, with the ticker derived from the first three
//! letters of each part. Collisions across a round are allowed.

use rand::Rng;

/// Prefixes for coin name generation
const PREFIXES: &[&str] = &[
    // Classic meme lineage
    "Moon", "Doge", "Shiba", "Pepe", "Floki", "Frog", "Cat", "Snek",
    "Ape", "Banana", "Hamster", "Walrus", "Goat", "Pigeon", "Ferret",
    // Degen energy
    "Safe", "Baby", "Giga", "Turbo", "Hyper", "Mega", "Ultra", "Wen",
    "Pump", "Yolo", "Fomo", "Hodl", "Degen", "Chad", "Sigma", "Wagmi",
    // Riches
    "Diamond", "Golden", "Lambo", "Rocket", "Stonk", "Gains", "Tendies",
    "Whale", "Bull", "Laser", "Cosmic", "Quantum", "Infinity", "Galaxy",
];

/// Suffixes for coin name generation
const SUFFIXES: &[&str] = &[
    "Coin", "Token", "Inu", "Rocket", "Moon", "Cash", "Swap", "Chain",
    "Finance", "Protocol", "Pump", "Blast", "Mars", "Lord", "King",
    "Gains", "Bux", "Floor", "Ride", "Zone", "Mania", "Express", "Empire",
];

/// Mood tags for round flavor text. Purely cosmetic.
const MOODS: &[&str] = &[
    "normal", "euphoric", "fearful", "greedy", "volatile", "sleepy",
    "manic", "cautious", "delusional", "feral",
];

fn ticker_part(word: &str) -> String {
    word.chars().take(3).collect::<String>().to_uppercase()
}

/// Generate a random memecoin as (symbol, name), e.g. ("DOGROC", "DogeRocket").
pub fn generate_coin(rng: &mut impl Rng) -> (String, String) {
    let prefix = PREFIXES[rng.gen_range(0..PREFIXES.len())];
    let suffix = SUFFIXES[rng.gen_range(0..SUFFIXES.len())];

    let name = format!("{}{}", prefix, suffix);
    let symbol = format!("{}{}", ticker_part(prefix), ticker_part(suffix));
    (symbol, name)
}

/// Pick a mood tag for a new round.
pub fn pick_mood(rng: &mut impl Rng) -> String {
    MOODS[rng.gen_range(0..MOODS.len())].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_coin_shape() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let (symbol, name) = generate_coin(&mut rng);
            assert!(!name.is_empty());
            assert!(symbol.len() >= 4 && symbol.len() <= 6);
            assert_eq!(symbol, symbol.to_uppercase());
            // The ticker is derivable from the name
            assert!(name.to_uppercase().starts_with(&symbol[..3]));
        }
    }

    #[test]
    fn test_ticker_part_truncates() {
        assert_eq!(ticker_part("Doge"), "DOG");
        assert_eq!(ticker_part("Inu"), "INU");
        assert_eq!(ticker_part("Moonbeam"), "MOO");
    }

    #[test]
    fn test_pick_mood_from_list() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let mood = pick_mood(&mut rng);
            assert!(MOODS.contains(&mood.as_str()));
        }
    }

    #[test]
    fn test_coin_names_vary() {
        let mut rng = rand::thread_rng();
        let mut names = std::collections::HashSet::new();
        for _ in 0..100 {
            names.insert(generate_coin(&mut rng).1);
        }
        // Should have decent variety (collisions allowed, monoculture not)
        assert!(names.len() >= 50);
    }
}
