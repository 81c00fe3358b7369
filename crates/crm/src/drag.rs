use uuid::Uuid;

use crate::{board::StageCard, stage::transition, Stage, Transition};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NoOpReason {
    /// Dropped outside any column or onto something that is not on the board.
    UnresolvedTarget,
    /// The dragged card is not on the board.
    UnknownCard,
    /// Dropped on the column the card already sits in.
    SameStage,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DropResolution {
    Move { id: Uuid, from: Stage, to: Stage },
    NoOp(NoOpReason),
}

/// Translate a drag-and-drop gesture into a stage move.
///
/// `over` is the identifier of whatever the card was released on: a column id
/// (the stage key) or another card's id, in which case the card's stage is the
/// target.
pub fn resolve_drop<T: StageCard>(cards: &[T], dragged: Uuid, over: Option<&str>) -> DropResolution {
    let Some(card) = cards.iter().find(|c| c.card_id() == dragged) else {
        return DropResolution::NoOp(NoOpReason::UnknownCard);
    };
    let Some(over) = over else {
        return DropResolution::NoOp(NoOpReason::UnresolvedTarget);
    };
    let target = match Stage::from_key(over) {
        Some(stage) => Some(stage),
        None => Uuid::parse_str(over.trim()).ok().and_then(|over_id| {
            cards
                .iter()
                .find(|c| c.card_id() == over_id)
                .map(|c| c.card_stage().unwrap_or(Stage::INITIAL))
        }),
    };
    let Some(target) = target else {
        return DropResolution::NoOp(NoOpReason::UnresolvedTarget);
    };
    let current = card.card_stage().unwrap_or(Stage::INITIAL);
    match transition(current, target) {
        Transition::Unchanged => DropResolution::NoOp(NoOpReason::SameStage),
        Transition::Move { from, to } => DropResolution::Move {
            id: dragged,
            from,
            to,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Card(Uuid, Stage);

    impl StageCard for Card {
        fn card_id(&self) -> Uuid {
            self.0
        }

        fn card_stage(&self) -> Option<Stage> {
            Some(self.1)
        }

        fn card_value_cents(&self) -> i64 {
            0
        }
    }

    fn board() -> Vec<Card> {
        vec![
            Card(Uuid::new_v4(), Stage::Pending),
            Card(Uuid::new_v4(), Stage::Signed),
        ]
    }

    #[test]
    fn drop_on_column_moves_to_that_stage() {
        let cards = board();
        let id = cards[0].0;
        assert_eq!(
            resolve_drop(&cards, id, Some("contacted")),
            DropResolution::Move {
                id,
                from: Stage::Pending,
                to: Stage::Contacted
            }
        );
    }

    #[test]
    fn drop_on_card_takes_that_cards_stage() {
        let cards = board();
        let id = cards[0].0;
        let over = cards[1].0.to_string();
        assert_eq!(
            resolve_drop(&cards, id, Some(&over)),
            DropResolution::Move {
                id,
                from: Stage::Pending,
                to: Stage::Signed
            }
        );
    }

    #[test]
    fn drop_on_own_column_is_noop() {
        let cards = board();
        let id = cards[1].0;
        assert_eq!(
            resolve_drop(&cards, id, Some("signed")),
            DropResolution::NoOp(NoOpReason::SameStage)
        );
        let own = id.to_string();
        assert_eq!(
            resolve_drop(&cards, id, Some(&own)),
            DropResolution::NoOp(NoOpReason::SameStage)
        );
    }

    #[test]
    fn unresolvable_targets_are_noops() {
        let cards = board();
        let id = cards[0].0;
        let stranger = Uuid::new_v4().to_string();
        for over in [None, Some("trash"), Some(stranger.as_str())] {
            assert_eq!(
                resolve_drop(&cards, id, over),
                DropResolution::NoOp(NoOpReason::UnresolvedTarget)
            );
        }
        assert_eq!(
            resolve_drop(&cards, Uuid::new_v4(), Some("signed")),
            DropResolution::NoOp(NoOpReason::UnknownCard)
        );
    }
}
