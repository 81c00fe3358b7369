use serde::Serialize;
use uuid::Uuid;

use crate::{money, CrmResult, Stage};

/// Anything that can sit on the pipeline board.
pub trait StageCard {
    fn card_id(&self) -> Uuid;
    /// `None` for records that never had a stage; they land in the first column.
    fn card_stage(&self) -> Option<Stage>;
    fn card_value_cents(&self) -> i64;
}

#[derive(Clone, Debug, Serialize)]
pub struct Column<T> {
    pub stage: Stage,
    pub cards: Vec<T>,
    pub count: usize,
    pub total_value_cents: i64,
}

impl<T> Column<T> {
    fn empty(stage: Stage) -> Self {
        Self {
            stage,
            cards: Vec::new(),
            count: 0,
            total_value_cents: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Board<T> {
    pub columns: Vec<Column<T>>,
}

impl<T> Board<T> {
    pub fn column(&self, stage: Stage) -> &Column<T> {
        &self.columns[stage.index()]
    }

    pub fn total_count(&self) -> usize {
        self.columns.iter().map(|c| c.count).sum()
    }

    pub fn total_value_cents(&self) -> CrmResult<i64> {
        money::sum("board", self.columns.iter().map(|c| c.total_value_cents))
    }
}

/// Stable partition of `records` into one column per stage, in column order.
///
/// Fails only when a column total does not fit in an `i64`.
pub fn partition<T, I>(records: I) -> CrmResult<Board<T>>
where
    T: StageCard,
    I: IntoIterator<Item = T>,
{
    let mut columns: Vec<Column<T>> = Stage::ALL.iter().map(|s| Column::empty(*s)).collect();
    for record in records {
        let stage = record.card_stage().unwrap_or(Stage::INITIAL);
        let column = &mut columns[stage.index()];
        column.count += 1;
        column.total_value_cents =
            money::add("column", column.total_value_cents, record.card_value_cents())?;
        column.cards.push(record);
    }
    Ok(Board { columns })
}
