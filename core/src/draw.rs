//! Pure card-draw engine.
//!
//! Selects cards uniformly at random without repetition and assigns each an
//! independent 50/50 reversed flag. No caching, no deterministic seed: two
//! calls over the same catalog produce different selections with high
//! probability.
//!
//! The engine is intentionally permissive about overdraw: asking for more
//! cards than the catalog holds returns the whole catalog (in random order)
//! rather than an error. Callers that require exactly `n` cards must
//! validate the result length themselves.

use crate::model::Card;
use rand::Rng;
use rand::seq::SliceRandom;

/// One card selected by a draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawnCard {
    /// The selected catalog card.
    pub card: Card,
    /// Whether the card came up reversed.
    pub reversed: bool,
}

/// Draw `n` distinct cards from `catalog`.
///
/// Returns `min(n, catalog.len())` cards. The order of the returned vector
/// is the draw order and becomes the 1-based position sequence of a spread.
#[must_use]
pub fn draw(catalog: &[Card], n: usize) -> Vec<DrawnCard> {
    let mut rng = rand::thread_rng();
    catalog
        .choose_multiple(&mut rng, n)
        .map(|card| DrawnCard {
            card: card.clone(),
            reversed: rng.gen_bool(0.5),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Arcana, CardId};
    use std::collections::HashSet;

    fn catalog(size: usize) -> Vec<Card> {
        (0..size)
            .map(|i| Card {
                id: CardId::new(),
                name: format!("card-{i}"),
                arcana: if i < 22 { Arcana::Major } else { Arcana::Minor },
            })
            .collect()
    }

    #[test]
    fn draws_exactly_n_distinct_cards() {
        let cards = catalog(78);
        let drawn = draw(&cards, 10);
        assert_eq!(drawn.len(), 10);
        let ids: HashSet<_> = drawn.iter().map(|d| d.card.id).collect();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn zero_draw_is_empty() {
        let cards = catalog(78);
        assert!(draw(&cards, 0).is_empty());
    }

    #[test]
    fn overdraw_clamps_to_catalog_size() {
        let cards = catalog(3);
        let drawn = draw(&cards, 10);
        assert_eq!(drawn.len(), 3);
        let ids: HashSet<_> = drawn.iter().map(|d| d.card.id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn empty_catalog_draws_nothing() {
        assert!(draw(&[], 5).is_empty());
    }

    #[test]
    fn selections_vary_across_calls() {
        // 20 draws of 5 from 78 cards repeating the identical selection
        // every time is astronomically unlikely with a live RNG.
        let cards = catalog(78);
        let first: Vec<_> = draw(&cards, 5).iter().map(|d| d.card.id).collect();
        let all_same = (0..20).all(|_| {
            let again: Vec<_> = draw(&cards, 5).iter().map(|d| d.card.id).collect();
            again == first
        });
        assert!(!all_same);
    }

    #[test]
    fn reversed_flags_are_not_constant() {
        let cards = catalog(78);
        let flags: Vec<bool> = (0..10)
            .flat_map(|_| draw(&cards, 10))
            .map(|d| d.reversed)
            .collect();
        assert!(flags.iter().any(|f| *f));
        assert!(flags.iter().any(|f| !*f));
    }
}
