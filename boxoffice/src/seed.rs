//! Demo catalog: a spread of movies, concerts, conventions and festivals with
//! randomised venues, dates and gating.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde_json::json;
use std::collections::HashSet;

use crate::types::EventDefinition;

const CITIES: &[&str] = &[
    "Seattle, WA",
    "Austin, TX",
    "Redmond, WA",
    "San Jose, CA",
    "New York, NY",
    "Chicago, IL",
    "Denver, CO",
    "Portland, OR",
    "Miami, FL",
    "Boston, MA",
];
const GENRES: &[&str] = &["Pop", "Rock", "Hip-Hop", "EDM", "Country", "Indie", "R&B"];
const ARTISTS: &[&str] = &[
    "Nova Lights",
    "Echo Wave",
    "Violet Horizon",
    "Crimson Beats",
    "Neon Pulse",
    "Stellar Sky",
    "Golden Anthem",
];
const MOVIES: &[&str] = &[
    "Starfall",
    "Quantum Drift",
    "Velvet Shadow",
    "Aurora Rising",
    "Cascade Run",
    "Moonrise City",
    "Harbor Lights",
];
const CONVENTIONS: &[&str] = &["GameDev Expo", "NanoTech Summit", "ComicVerse", "Data & AI World"];
const FESTIVALS: &[&str] = &[
    "Riverlight Fest",
    "Sunset Encore",
    "Aurora Fest",
    "Crimson Carnival",
    "Nimbus Night",
];
const CONCERT_COUNT: usize = 8;
const START_MINUTES: &[u32] = &[0, 10, 15, 20, 30, 40, 45, 50];

/// Build the demo definitions.
///
/// Every event gets a `rows` x `cols` grid. Names are unique; a randomly
/// repeated concert name keeps its first definition.
pub fn demo_definitions<R: Rng + ?Sized>(
    rows: u32,
    cols: u32,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<EventDefinition> {
    let mut definitions = Vec::new();
    let mut seen = HashSet::new();
    let mut push = |definition: EventDefinition| {
        if seen.insert(definition.name.clone()) {
            definitions.push(definition);
        }
    };

    for title in MOVIES {
        let starts_at = future_time(rng, now, (0, 45), (11, 21));
        let trailers_min = rng.gen_range(20..=30);
        let duration_min = rng.gen_range(95..=160);
        let movie_starts = starts_at + Duration::minutes(trailers_min);
        let ends = movie_starts + Duration::minutes(duration_min);

        push(
            EventDefinition::new(format!("{title} (Movie)"), rows, cols)
                .with_category("Movies")
                .with_location(pick(rng, CITIES))
                .starting_at(starts_at)
                .gated(rng.gen_bool(0.4))
                .with_meta(json!({
                    "trailersMin": trailers_min,
                    "estMovieStart": movie_starts,
                    "durationMin": duration_min,
                    "estEnd": ends,
                })),
        );
    }

    for _ in 0..CONCERT_COUNT {
        let artist = pick(rng, ARTISTS);
        let presale = future_time(rng, now, (0, 20), (9, 12));
        let show = future_time(rng, now, (10, 60), (18, 22));

        push(
            EventDefinition::new(format!("{artist} Live"), rows, cols)
                .with_category("Concerts")
                .with_location(pick(rng, CITIES))
                .starting_at(show)
                .gated(rng.gen_bool(0.6))
                .with_meta(json!({
                    "artist": artist,
                    "genre": pick(rng, GENRES),
                    "presale": presale,
                    "generalSale": presale + Duration::days(1),
                })),
        );
    }

    for name in CONVENTIONS {
        push(
            EventDefinition::new(*name, rows, cols)
                .with_category("Conventions")
                .with_location(pick(rng, CITIES))
                .starting_at(future_time(rng, now, (5, 70), (10, 17)))
                .gated(rng.gen_bool(0.3))
                .with_meta(json!({ "days": rng.gen_range(3..=5_u32) })),
        );
    }

    for name in FESTIVALS {
        push(
            EventDefinition::new(*name, rows, cols)
                .with_category("Festivals")
                .with_location(pick(rng, CITIES))
                .starting_at(future_time(rng, now, (7, 90), (12, 20)))
                .gated(rng.gen_bool(0.5))
                .with_meta(json!({ "headliners": [pick(rng, ARTISTS), pick(rng, ARTISTS)] })),
        );
    }

    tracing::debug!(count = definitions.len(), "Built demo catalog");
    definitions
}

fn pick<R: Rng + ?Sized>(rng: &mut R, values: &[&'static str]) -> &'static str {
    values.choose(rng).copied().unwrap_or_default()
}

/// A time between `days.0` and `days.1` days from `now`, at a whole hour in
/// `hours` plus one of the usual start minutes.
fn future_time<R: Rng + ?Sized>(
    rng: &mut R,
    now: DateTime<Utc>,
    days: (i64, i64),
    hours: (u32, u32),
) -> DateTime<Utc> {
    let date = (now + Duration::days(rng.gen_range(days.0..=days.1))).date_naive();
    let hour = rng.gen_range(hours.0..=hours.1);
    let minute = START_MINUTES.choose(rng).copied().unwrap_or(0);

    NaiveTime::from_hms_opt(hour, minute, 0)
        .map_or(now, |time| date.and_time(time).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn demo_catalog_covers_every_category() {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(7);
        let definitions = demo_definitions(12, 15, now, &mut rng);

        for category in ["Movies", "Concerts", "Conventions", "Festivals"] {
            assert!(
                definitions.iter().any(|d| d.category == category),
                "missing {category}"
            );
        }
        assert!(definitions.len() >= MOVIES.len() + CONVENTIONS.len() + FESTIVALS.len() + 1);
    }

    #[test]
    fn demo_definitions_are_valid_and_unique() {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(42);
        let definitions = demo_definitions(4, 5, now, &mut rng);

        let names: HashSet<_> = definitions.iter().map(|d| d.name.clone()).collect();
        assert_eq!(names.len(), definitions.len());
        for definition in &definitions {
            assert!(definition.validate().is_ok());
            assert!(!definition.location.is_empty());
            assert_eq!(definition.capacity(), 20);
            assert!(definition.starts_at.is_some_and(|at| at.date_naive() >= now.date_naive()));
        }
    }
}
