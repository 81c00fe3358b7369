use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::CrmError;

/// Pipeline stage of a prospect. The set is closed; boards, filters and
/// persistence all branch on it exhaustively.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(
    feature = "graphql",
    derive(async_graphql::Enum),
    graphql(name = "ProspectStage")
)]
pub enum Stage {
    #[default]
    Pending,
    Contacted,
    ContractSent,
    Signed,
    Rejected,
}

impl Stage {
    /// Board column order.
    pub const ALL: [Stage; 5] = [
        Stage::Pending,
        Stage::Contacted,
        Stage::ContractSent,
        Stage::Signed,
        Stage::Rejected,
    ];

    pub const INITIAL: Stage = Stage::Pending;

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Pending => "pending",
            Stage::Contacted => "contacted",
            Stage::ContractSent => "contract_sent",
            Stage::Signed => "signed",
            Stage::Rejected => "rejected",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Pending => "Pendente",
            Stage::Contacted => "Contatado",
            Stage::ContractSent => "Contrato enviado",
            Stage::Signed => "Assinado",
            Stage::Rejected => "Recusado",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Stage::Pending => 0,
            Stage::Contacted => 1,
            Stage::ContractSent => 2,
            Stage::Signed => 3,
            Stage::Rejected => 4,
        }
    }

    pub fn from_key(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Stage::Pending),
            "contacted" => Some(Stage::Contacted),
            "contract_sent" => Some(Stage::ContractSent),
            "signed" => Some(Stage::Signed),
            "rejected" => Some(Stage::Rejected),
            _ => None,
        }
    }

    /// Signed prospects are clients; they stay on record.
    pub fn is_locked(self) -> bool {
        matches!(self, Stage::Signed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::from_key(s).ok_or_else(|| CrmError::UnknownStage(s.to_string()))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Transition {
    Unchanged,
    Move { from: Stage, to: Stage },
}

/// Any stage may be reached from any other in a single step so an operator can
/// reclassify a prospect at any time.
pub fn transition(from: Stage, to: Stage) -> Transition {
    if from == to {
        Transition::Unchanged
    } else {
        Transition::Move { from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_from_key() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_key(stage.as_str()), Some(stage));
        }
        assert_eq!(Stage::from_key(" Contract_Sent "), Some(Stage::ContractSent));
        assert!("won".parse::<Stage>().is_err());
    }

    #[test]
    fn index_matches_column_order() {
        for (idx, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), idx);
        }
    }

    #[test]
    fn every_pair_of_distinct_stages_is_a_move() {
        for from in Stage::ALL {
            for to in Stage::ALL {
                let expected = if from == to {
                    Transition::Unchanged
                } else {
                    Transition::Move { from, to }
                };
                assert_eq!(transition(from, to), expected);
            }
        }
    }

    #[test]
    fn serde_uses_snake_case_keys() {
        let json = serde_json::to_string(&Stage::ContractSent).unwrap();
        assert_eq!(json, "\"contract_sent\"");
        let back: Stage = serde_json::from_str("\"signed\"").unwrap();
        assert_eq!(back, Stage::Signed);
    }
}
