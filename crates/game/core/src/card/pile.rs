//! Per-combatant card piles.
//!
//! Every card instance sits in exactly one of deck, hand, discard or exhaust.
//! Nothing here creates or destroys cards, so [`Piles::total`] never changes
//! after construction.

use std::collections::VecDeque;

use crate::card::{CardId, CardRef};
use crate::config::DrawConfig;

/// The four piles a card can be in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PileKind {
    Deck,
    Hand,
    Discard,
    Exhaust,
}

/// Limits that govern drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawRules {
    /// No card is drawn while the hand holds this many.
    pub hand_limit: usize,
    /// Refill an empty deck from the discard pile, keeping its order.
    pub reshuffle: bool,
}

impl From<&DrawConfig> for DrawRules {
    fn from(config: &DrawConfig) -> Self {
        Self {
            hand_limit: config.hand_limit as usize,
            reshuffle: config.reshuffle,
        }
    }
}

/// Why a draw stopped before drawing every requested card.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawStop {
    HandFull,
    OutOfCards,
}

/// Result of a multi-card draw.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrawReport {
    /// Cards moved into the hand, in draw order.
    pub drawn: Vec<CardId>,
    /// Number of times the discard pile was turned into the deck.
    pub reshuffles: u32,
    pub stopped: Option<DrawStop>,
}

/// Deck, hand, discard and exhaust piles of one combatant.
#[derive(Clone, Debug)]
pub struct Piles {
    deck: VecDeque<CardRef>,
    hand: Vec<CardRef>,
    discard: Vec<CardRef>,
    exhaust: Vec<CardRef>,
    rules: DrawRules,
}

impl Piles {
    /// Builds the starting deck.
    ///
    /// Innate cards move to the top, keeping their relative order, and the
    /// rest follow in configured order.
    pub fn new(cards: Vec<CardRef>, rules: DrawRules) -> Self {
        let (innate, rest): (Vec<_>, Vec<_>) = cards.into_iter().partition(|card| card.innate);
        Self {
            deck: innate.into_iter().chain(rest).collect(),
            hand: Vec::new(),
            discard: Vec::new(),
            exhaust: Vec::new(),
            rules,
        }
    }

    // ========================================================================
    // Drawing
    // ========================================================================

    /// Draws up to `count` cards from the top of the deck.
    pub fn draw(&mut self, count: u32) -> DrawReport {
        let mut report = DrawReport::default();

        for _ in 0..count {
            if self.hand.len() >= self.rules.hand_limit {
                report.stopped = Some(DrawStop::HandFull);
                break;
            }

            if self.deck.is_empty() && self.rules.reshuffle && !self.discard.is_empty() {
                self.deck.extend(self.discard.drain(..));
                report.reshuffles += 1;
            }

            let Some(card) = self.deck.pop_front() else {
                report.stopped = Some(DrawStop::OutOfCards);
                break;
            };
            report.drawn.push(card.id.clone());
            self.hand.push(card);
        }

        report
    }

    // ========================================================================
    // Playing and Discarding
    // ========================================================================

    /// Moves the played card at `hand_index` to discard, or to exhaust when
    /// the card is flagged so. Returns the card and its destination.
    pub fn finish_play(&mut self, hand_index: usize) -> Option<(CardRef, PileKind)> {
        if hand_index >= self.hand.len() {
            return None;
        }
        let card = self.hand.remove(hand_index);
        let destination = if card.exhaust {
            self.exhaust.push(card.clone());
            PileKind::Exhaust
        } else {
            self.discard.push(card.clone());
            PileKind::Discard
        };
        Some((card, destination))
    }

    /// Discards every non-retained card in hand order and returns their ids.
    pub fn discard_hand(&mut self) -> Vec<CardId> {
        let (retained, discarded): (Vec<_>, Vec<_>) =
            self.hand.drain(..).partition(|card| card.retain);
        self.hand = retained;

        let ids = discarded.iter().map(|card| card.id.clone()).collect();
        self.discard.extend(discarded);
        ids
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn hand(&self) -> &[CardRef] {
        &self.hand
    }

    pub fn deck(&self) -> impl Iterator<Item = &CardRef> {
        self.deck.iter()
    }

    pub fn discard(&self) -> &[CardRef] {
        &self.discard
    }

    pub fn exhausted(&self) -> &[CardRef] {
        &self.exhaust
    }

    pub fn len(&self, pile: PileKind) -> usize {
        match pile {
            PileKind::Deck => self.deck.len(),
            PileKind::Hand => self.hand.len(),
            PileKind::Discard => self.discard.len(),
            PileKind::Exhaust => self.exhaust.len(),
        }
    }

    /// Total card count across all piles.
    pub fn total(&self) -> usize {
        self.deck.len() + self.hand.len() + self.discard.len() + self.exhaust.len()
    }

    pub fn rules(&self) -> DrawRules {
        self.rules
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::card::EffectKind;
    use crate::card::tests::simple_card;

    fn card(id: &str) -> CardRef {
        Arc::new(simple_card(id, 1, EffectKind::Damage, 1))
    }

    fn rules(hand_limit: usize, reshuffle: bool) -> DrawRules {
        DrawRules {
            hand_limit,
            reshuffle,
        }
    }

    fn ids(cards: &[CardRef]) -> Vec<&str> {
        cards.iter().map(|card| card.id.as_str()).collect()
    }

    #[test]
    fn innate_cards_start_on_top() {
        let mut innate = simple_card("opener", 0, EffectKind::Block, 3);
        innate.innate = true;
        let piles = Piles::new(
            vec![card("a"), Arc::new(innate), card("b")],
            rules(10, true),
        );

        let order: Vec<_> = piles.deck().map(|card| card.id.as_str()).collect();
        assert_eq!(order, ["opener", "a", "b"]);
    }

    #[test]
    fn draw_takes_from_front_in_order() {
        let mut piles = Piles::new(vec![card("a"), card("b"), card("c")], rules(10, true));

        let report = piles.draw(2);

        assert_eq!(report.drawn, vec![CardId::new("a"), CardId::new("b")]);
        assert_eq!(report.stopped, None);
        assert_eq!(ids(piles.hand()), ["a", "b"]);
        assert_eq!(piles.len(PileKind::Deck), 1);
    }

    #[test]
    fn draw_reshuffles_discard_in_existing_order() {
        let mut piles = Piles::new(vec![card("a"), card("b")], rules(10, true));
        piles.draw(2);
        piles.finish_play(1);
        piles.finish_play(0);
        assert_eq!(ids(piles.discard()), ["b", "a"]);

        let report = piles.draw(2);

        assert_eq!(report.reshuffles, 1);
        assert_eq!(ids(piles.hand()), ["b", "a"]);
        assert_eq!(piles.total(), 2);
    }

    #[test]
    fn draw_without_reshuffle_is_a_no_op_on_empty_deck() {
        let mut piles = Piles::new(vec![card("a")], rules(10, false));
        piles.draw(1);
        piles.finish_play(0);

        let report = piles.draw(3);

        assert!(report.drawn.is_empty());
        assert_eq!(report.stopped, Some(DrawStop::OutOfCards));
        assert_eq!(piles.len(PileKind::Discard), 1);
    }

    #[test]
    fn hand_limit_stops_drawing() {
        let mut piles = Piles::new(vec![card("a"), card("b"), card("c")], rules(2, true));

        let report = piles.draw(3);

        assert_eq!(report.drawn.len(), 2);
        assert_eq!(report.stopped, Some(DrawStop::HandFull));
        assert_eq!(piles.len(PileKind::Deck), 1);
    }

    #[test]
    fn exhaust_and_retain_flags() {
        let mut burn = simple_card("burn", 0, EffectKind::Damage, 9);
        burn.exhaust = true;
        let mut keep = simple_card("keep", 0, EffectKind::Block, 2);
        keep.retain = true;
        let mut piles = Piles::new(
            vec![Arc::new(burn), Arc::new(keep), card("plain")],
            rules(10, true),
        );
        piles.draw(3);

        let (played, destination) = piles.finish_play(0).unwrap();
        assert_eq!(played.id.as_str(), "burn");
        assert_eq!(destination, PileKind::Exhaust);

        let discarded = piles.discard_hand();
        assert_eq!(discarded, vec![CardId::new("plain")]);
        assert_eq!(ids(piles.hand()), ["keep"]);
        assert_eq!(ids(piles.exhausted()), ["burn"]);
        assert_eq!(piles.total(), 3);
    }

    #[test]
    fn finish_play_rejects_bad_index() {
        let mut piles = Piles::new(vec![card("a")], rules(10, true));
        assert!(piles.finish_play(0).is_none());
    }
}
