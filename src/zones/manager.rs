//! Zone manager for per-owner card piles.
//!
//! Each entity that plays cards owns four ordered piles: deck, hand,
//! discard, exhaust. Piles are `im::Vector`s, so cloning a `ZoneManager`
//! for a checkpoint is cheap.
//!
//! Index 0 of the deck is its top: drawing pops from the front.

use im::{OrdMap, Vector};
use serde::{Deserialize, Serialize};

use crate::core::entity::{CardId, EntityId};
use crate::core::rng::GameRng;

/// One of an owner's piles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Zone {
    Deck,
    Hand,
    Discard,
    Exhaust,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Piles {
    deck: Vector<CardId>,
    hand: Vector<CardId>,
    discard: Vector<CardId>,
    exhaust: Vector<CardId>,
}

impl Piles {
    fn get(&self, zone: Zone) -> &Vector<CardId> {
        match zone {
            Zone::Deck => &self.deck,
            Zone::Hand => &self.hand,
            Zone::Discard => &self.discard,
            Zone::Exhaust => &self.exhaust,
        }
    }

    fn get_mut(&mut self, zone: Zone) -> &mut Vector<CardId> {
        match zone {
            Zone::Deck => &mut self.deck,
            Zone::Hand => &mut self.hand,
            Zone::Discard => &mut self.discard,
            Zone::Exhaust => &mut self.exhaust,
        }
    }
}

/// Tracks every owner's piles.
///
/// ## Usage
///
/// ```
/// use ccg_effects::core::{CardId, EntityId};
/// use ccg_effects::zones::{Zone, ZoneManager};
///
/// let hero = EntityId(0);
/// let mut zones = ZoneManager::new();
/// zones.set_pile(hero, Zone::Deck, [CardId(1), CardId(2)]);
///
/// assert_eq!(zones.pop_front(hero, Zone::Deck), Some(CardId(1)));
/// zones.append(hero, Zone::Hand, CardId(1));
/// assert_eq!(zones.len(hero, Zone::Hand), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneManager {
    piles: OrdMap<EntityId, Piles>,
}

impl ZoneManager {
    /// Create a new empty zone manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a pile's contents. Index 0 is the top.
    pub fn set_pile(
        &mut self,
        owner: EntityId,
        zone: Zone,
        cards: impl IntoIterator<Item = CardId>,
    ) {
        let piles = self.piles.entry(owner).or_insert_with(Piles::default);
        *piles.get_mut(zone) = cards.into_iter().collect();
    }

    /// Cards in a pile, top first. Empty for unknown owners.
    #[must_use]
    pub fn cards(&self, owner: EntityId, zone: Zone) -> Vec<CardId> {
        self.piles
            .get(&owner)
            .map(|p| p.get(zone).iter().copied().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self, owner: EntityId, zone: Zone) -> usize {
        self.piles.get(&owner).map_or(0, |p| p.get(zone).len())
    }

    #[must_use]
    pub fn is_empty(&self, owner: EntityId, zone: Zone) -> bool {
        self.len(owner, zone) == 0
    }

    /// Does this owner have piles at all?
    #[must_use]
    pub fn has_owner(&self, owner: EntityId) -> bool {
        self.piles.contains_key(&owner)
    }

    /// Put a card on top of a pile.
    pub fn push_front(&mut self, owner: EntityId, zone: Zone, card: CardId) {
        self.piles.entry(owner).or_insert_with(Piles::default).get_mut(zone).push_front(card);
    }

    /// Put a card at the bottom of a pile.
    pub fn append(&mut self, owner: EntityId, zone: Zone, card: CardId) {
        self.piles.entry(owner).or_insert_with(Piles::default).get_mut(zone).push_back(card);
    }

    /// Take the top card of a pile.
    pub fn pop_front(&mut self, owner: EntityId, zone: Zone) -> Option<CardId> {
        self.piles.get_mut(&owner)?.get_mut(zone).pop_front()
    }

    /// Take the bottom card of a pile.
    pub fn pop_back(&mut self, owner: EntityId, zone: Zone) -> Option<CardId> {
        self.piles.get_mut(&owner)?.get_mut(zone).pop_back()
    }

    /// Remove a specific card from a pile.
    ///
    /// Returns `false` if the card wasn't there.
    pub fn remove(&mut self, owner: EntityId, zone: Zone, card: CardId) -> bool {
        let Some(pile) = self.piles.get_mut(&owner).map(|p| p.get_mut(zone)) else {
            return false;
        };
        match pile.index_of(&card) {
            Some(idx) => {
                pile.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Move a card between two of an owner's piles, to the bottom of `to`.
    pub fn move_card(&mut self, owner: EntityId, card: CardId, from: Zone, to: Zone) -> bool {
        if self.remove(owner, from, card) {
            self.append(owner, to, card);
            true
        } else {
            false
        }
    }

    /// Shuffle the discard pile and place it under the deck.
    ///
    /// Returns the number of cards moved.
    pub fn reshuffle_discard_into_deck(&mut self, owner: EntityId, rng: &mut GameRng) -> usize {
        let Some(piles) = self.piles.get_mut(&owner) else {
            return 0;
        };
        let mut cards: Vec<CardId> = piles.discard.iter().copied().collect();
        if cards.is_empty() {
            return 0;
        }
        rng.shuffle(&mut cards);
        piles.discard.clear();
        let moved = cards.len();
        piles.deck.extend(cards);
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HERO: EntityId = EntityId(0);

    #[test]
    fn test_push_and_pop() {
        let mut zones = ZoneManager::new();
        zones.append(HERO, Zone::Deck, CardId(1));
        zones.append(HERO, Zone::Deck, CardId(2));
        zones.push_front(HERO, Zone::Deck, CardId(3));

        assert_eq!(zones.cards(HERO, Zone::Deck), vec![CardId(3), CardId(1), CardId(2)]);
        assert_eq!(zones.pop_front(HERO, Zone::Deck), Some(CardId(3)));
        assert_eq!(zones.pop_back(HERO, Zone::Deck), Some(CardId(2)));
        assert_eq!(zones.len(HERO, Zone::Deck), 1);
    }

    #[test]
    fn test_unknown_owner() {
        let mut zones = ZoneManager::new();
        assert_eq!(zones.pop_front(EntityId(9), Zone::Deck), None);
        assert!(zones.is_empty(EntityId(9), Zone::Hand));
        assert!(!zones.has_owner(EntityId(9)));
    }

    #[test]
    fn test_move_card() {
        let mut zones = ZoneManager::new();
        zones.set_pile(HERO, Zone::Hand, [CardId(1), CardId(2)]);

        assert!(zones.move_card(HERO, CardId(1), Zone::Hand, Zone::Discard));
        assert!(!zones.move_card(HERO, CardId(1), Zone::Hand, Zone::Discard));
        assert_eq!(zones.cards(HERO, Zone::Hand), vec![CardId(2)]);
        assert_eq!(zones.cards(HERO, Zone::Discard), vec![CardId(1)]);
    }

    #[test]
    fn test_reshuffle_is_seeded() {
        let mut a = ZoneManager::new();
        a.set_pile(HERO, Zone::Discard, (1..=8).map(CardId));
        let mut b = a.clone();

        assert_eq!(a.reshuffle_discard_into_deck(HERO, &mut GameRng::new(7)), 8);
        assert_eq!(b.reshuffle_discard_into_deck(HERO, &mut GameRng::new(7)), 8);

        assert_eq!(a.cards(HERO, Zone::Deck), b.cards(HERO, Zone::Deck));
        assert!(a.is_empty(HERO, Zone::Discard));
    }

    #[test]
    fn test_reshuffle_empty_discard() {
        let mut zones = ZoneManager::new();
        zones.set_pile(HERO, Zone::Deck, Vec::<CardId>::new());
        assert_eq!(zones.reshuffle_discard_into_deck(HERO, &mut GameRng::new(1)), 0);
    }
}
