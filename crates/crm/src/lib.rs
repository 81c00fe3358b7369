//! Domain rules for the BPO back office.
//!
//! Everything here is pure: no I/O, no clocks, no database. The API crate and
//! the board client both build on these types so the pipeline behaves the same
//! on either side of the wire.

mod board;
mod drag;
mod error;
pub mod finance;
pub mod money;
pub mod onboarding;
mod plan;
pub mod prospect;
mod stage;

pub use board::{partition, Board, Column, StageCard};
pub use drag::{resolve_drop, DropResolution, NoOpReason};
pub use error::{CrmError, CrmResult};
pub use plan::{Plan, PlanTerms, ServiceArea};
pub use stage::{transition, Stage, Transition};
