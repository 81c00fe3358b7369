use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::CrmError;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(
    feature = "graphql",
    derive(async_graphql::Enum),
    graphql(name = "PlanTier")
)]
pub enum Plan {
    #[default]
    Controle,
    Gerencial,
    Avancado,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "graphql", derive(async_graphql::Enum))]
pub enum ServiceArea {
    ContasPagar,
    ContasReceber,
    ConciliacaoBancaria,
    FluxoCaixa,
    Dre,
    RelatoriosGerenciais,
    Orcamento,
    Indicadores,
}

/// Tiers take a growing prefix of this list, so every tier includes the areas
/// of the tiers below it.
const AREAS: [ServiceArea; 8] = [
    ServiceArea::ContasPagar,
    ServiceArea::ContasReceber,
    ServiceArea::ConciliacaoBancaria,
    ServiceArea::FluxoCaixa,
    ServiceArea::Dre,
    ServiceArea::RelatoriosGerenciais,
    ServiceArea::Orcamento,
    ServiceArea::Indicadores,
];

impl ServiceArea {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceArea::ContasPagar => "contas_pagar",
            ServiceArea::ContasReceber => "contas_receber",
            ServiceArea::ConciliacaoBancaria => "conciliacao_bancaria",
            ServiceArea::FluxoCaixa => "fluxo_caixa",
            ServiceArea::Dre => "dre",
            ServiceArea::RelatoriosGerenciais => "relatorios_gerenciais",
            ServiceArea::Orcamento => "orcamento",
            ServiceArea::Indicadores => "indicadores",
        }
    }
}

/// Everything a plan tier determines about a prospect.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PlanTerms {
    pub plan: Plan,
    pub areas: &'static [ServiceArea],
    pub monthly_value_cents: i64,
}

impl PlanTerms {
    pub fn area_keys(&self) -> Vec<String> {
        self.areas.iter().map(|a| a.as_str().to_string()).collect()
    }
}

impl Plan {
    pub const ALL: [Plan; 3] = [Plan::Controle, Plan::Gerencial, Plan::Avancado];

    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Controle => "controle",
            Plan::Gerencial => "gerencial",
            Plan::Avancado => "avancado",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Plan::Controle => "Controle",
            Plan::Gerencial => "Gerencial",
            Plan::Avancado => "Avançado",
        }
    }

    pub fn from_key(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "controle" => Some(Plan::Controle),
            "gerencial" => Some(Plan::Gerencial),
            "avancado" | "avançado" => Some(Plan::Avancado),
            _ => None,
        }
    }

    pub fn terms(self) -> PlanTerms {
        let (area_count, monthly_value_cents) = match self {
            Plan::Controle => (4, 95_000),
            Plan::Gerencial => (6, 130_000),
            Plan::Avancado => (8, 170_000),
        };
        PlanTerms {
            plan: self,
            areas: &AREAS[..area_count],
            monthly_value_cents,
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Plan::from_key(s).ok_or_else(|| CrmError::UnknownPlan(s.to_string()))
    }
}
