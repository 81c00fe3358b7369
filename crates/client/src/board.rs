use std::future::Future;

use crm::{resolve_drop, Board, DropResolution, NoOpReason, Stage};
use uuid::Uuid;

use crate::{ClientError, Prospect};

/// What the board needs from the backend.
pub trait ProspectApi {
    fn board(&self) -> impl Future<Output = Result<Vec<Prospect>, ClientError>> + Send;

    fn move_stage(
        &self,
        id: Uuid,
        stage: Stage,
    ) -> impl Future<Output = Result<Prospect, ClientError>> + Send;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropOutcome {
    /// Nothing was sent to the server.
    Ignored(NoOpReason),
    /// The server accepted the move; the card now mirrors the server record.
    Moved(Prospect),
}

/// Local board state plus drag-and-drop handling.
///
/// Moves are applied optimistically: the card changes column at once, is
/// replaced by the server record on success and restored on failure.
pub struct BoardController<A> {
    api: A,
    cards: Vec<Prospect>,
}

impl<A: ProspectApi> BoardController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            cards: Vec::new(),
        }
    }

    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        self.cards = self.api.board().await?;
        Ok(())
    }

    pub fn cards(&self) -> &[Prospect] {
        &self.cards
    }

    pub fn board(&self) -> Result<Board<Prospect>, ClientError> {
        Ok(crm::partition(self.cards.iter().cloned())?)
    }

    pub async fn drop_card(
        &mut self,
        dragged: Uuid,
        over: Option<&str>,
    ) -> Result<DropOutcome, ClientError> {
        let (id, to) = match resolve_drop(&self.cards, dragged, over) {
            DropResolution::NoOp(reason) => return Ok(DropOutcome::Ignored(reason)),
            DropResolution::Move { id, to, .. } => (id, to),
        };
        let Some(index) = self.cards.iter().position(|c| c.id == id) else {
            return Ok(DropOutcome::Ignored(NoOpReason::UnknownCard));
        };

        let snapshot = self.cards[index].clone();
        self.cards[index].stage = to;
        match self.api.move_stage(id, to).await {
            Ok(saved) => {
                self.cards[index] = saved.clone();
                Ok(DropOutcome::Moved(saved))
            }
            Err(err) => {
                tracing::warn!(prospect_id = %id, error = %err, "stage move failed, card restored");
                self.cards[index] = snapshot;
                Err(err)
            }
        }
    }
}
