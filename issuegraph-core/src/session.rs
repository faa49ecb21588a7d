//! Idea session tracker: the evolving accepted/discarded state of idea
//! cards across one generation session.
//!
//! Discard policy is hide-and-remember: discarded cards stay in the
//! collection so the next prompt can steer the completion service away
//! from them as well as from the accepted ones.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Stable handle for one card within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeaStatus {
    Accepted,
    Discarded,
}

/// A fully-decoded streamed idea, as it arrives off the wire.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct IdeaDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "sourceIds", default)]
    pub source_ids: Vec<u64>,
}

/// An idea card tracked for the lifetime of one session.
#[derive(Debug, Clone, Serialize)]
pub struct IdeaCard {
    pub id: CardId,
    pub title: String,
    pub description: String,
    pub source_ids: Vec<u64>,
    pub status: IdeaStatus,
}

/// Mutable card collection for one generation session.
#[derive(Debug, Default)]
pub struct IdeaSession {
    cards: Vec<IdeaCard>,
    next_id: u64,
}

impl IdeaSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new card. Rendered cards start accepted; they only
    /// leave that state through [`discard`](Self::discard).
    pub fn add(&mut self, draft: IdeaDraft) -> CardId {
        let id = CardId(self.next_id);
        self.next_id += 1;
        debug!(id = id.0, title = %draft.title, "Idea card added");
        self.cards.push(IdeaCard {
            id,
            title: draft.title,
            description: draft.description,
            source_ids: draft.source_ids,
            status: IdeaStatus::Accepted,
        });
        id
    }

    /// Mark a card discarded. The card is kept, hidden, so it can still
    /// inform the next prompt's exclusion list. Returns false for an
    /// unknown id.
    pub fn discard(&mut self, id: CardId) -> bool {
        match self.cards.iter_mut().find(|c| c.id == id) {
            Some(card) => {
                card.status = IdeaStatus::Discarded;
                true
            }
            None => false,
        }
    }

    /// Look up a card by id.
    pub fn card(&self, id: CardId) -> Option<&IdeaCard> {
        self.cards.iter().find(|c| c.id == id)
    }

    /// All cards not marked discarded, in insertion order.
    pub fn accepted(&self) -> impl Iterator<Item = &IdeaCard> {
        self.cards
            .iter()
            .filter(|c| c.status == IdeaStatus::Accepted)
    }

    /// All discarded cards, in insertion order.
    pub fn discarded(&self) -> impl Iterator<Item = &IdeaCard> {
        self.cards
            .iter()
            .filter(|c| c.status == IdeaStatus::Discarded)
    }

    /// Clear all cards for a fresh session.
    pub fn reset(&mut self) {
        self.cards.clear();
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

// ── Tests ───────────────────────────────────────────────────────────
