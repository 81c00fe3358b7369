//! Financial registers, reconciliation and cash movements.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    money,
    prospect::{optional, required},
    CrmError, CrmResult,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterKind {
    Payable,
    Receivable,
}

/// Which actor category created a record.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Bpo,
    Client,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Pix,
    Boleto,
    Transferencia,
    CartaoCredito,
    CartaoDebito,
    Dinheiro,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    Once,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RegisterForm {
    pub kind: RegisterKind,
    pub description: String,
    pub value_cents: i64,
    pub due_date: Option<NaiveDate>,
    pub issue_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub recurrence: Recurrence,
    pub counterparty: Option<String>,
}

/// A register form that passed validation; `due_date` is guaranteed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidRegister {
    pub kind: RegisterKind,
    pub description: String,
    pub value_cents: i64,
    pub due_date: NaiveDate,
    pub issue_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    pub recurrence: Recurrence,
    pub counterparty: Option<String>,
}

impl RegisterForm {
    pub fn validate(self) -> CrmResult<ValidRegister> {
        let description = required("description", &self.description, 255)?;
        if self.value_cents <= 0 {
            return Err(CrmError::invalid("value", "must be greater than zero"));
        }
        let value_cents = money::bounded("value", self.value_cents)?;
        let due_date = self.due_date.ok_or(CrmError::Required { field: "due_date" })?;
        if let Some(issue_date) = self.issue_date {
            if due_date < issue_date {
                return Err(CrmError::invalid("due_date", "must not be before issue_date"));
            }
        }
        Ok(ValidRegister {
            kind: self.kind,
            description,
            value_cents,
            due_date,
            issue_date: self.issue_date,
            payment_method: self.payment_method,
            recurrence: self.recurrence,
            counterparty: optional(self.counterparty),
        })
    }
}

/// Once the BPO team validated a register only the BPO side may touch it.
pub fn ensure_register_editable(validated: bool, editor: Side) -> CrmResult<()> {
    match (validated, editor) {
        (true, Side::Client) => Err(CrmError::RegisterLocked),
        _ => Ok(()),
    }
}

/// Names of groups, categories and bank accounts.
pub fn chart_name(value: &str) -> CrmResult<String> {
    required("name", value, 120)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Inflow,
    Outflow,
}

impl MovementKind {
    pub fn signed(self, amount_cents: i64) -> i64 {
        match self {
            MovementKind::Inflow => amount_cents,
            MovementKind::Outflow => amount_cents.saturating_neg(),
        }
    }
}

pub fn validate_movement_amount(amount_cents: i64) -> CrmResult<i64> {
    if amount_cents <= 0 {
        return Err(CrmError::invalid("amount", "must be greater than zero"));
    }
    money::bounded("amount", amount_cents)
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CashSummary {
    pub opening_balance_cents: i64,
    pub inflow_cents: i64,
    pub outflow_cents: i64,
    pub balance_cents: i64,
}

pub fn summarize<I>(opening_balance_cents: i64, movements: I) -> CrmResult<CashSummary>
where
    I: IntoIterator<Item = (MovementKind, i64)>,
{
    let mut summary = CashSummary {
        opening_balance_cents,
        balance_cents: opening_balance_cents,
        ..Default::default()
    };
    for (kind, amount) in movements {
        match kind {
            MovementKind::Inflow => {
                summary.inflow_cents = money::add("inflow", summary.inflow_cents, amount)?
            }
            MovementKind::Outflow => {
                summary.outflow_cents = money::add("outflow", summary.outflow_cents, amount)?
            }
        }
        summary.balance_cents = money::add("balance", summary.balance_cents, kind.signed(amount))?;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn form() -> RegisterForm {
        RegisterForm {
            kind: RegisterKind::Payable,
            description: " Aluguel ".into(),
            value_cents: 350_000,
            due_date: Some(date(2025, 3, 10)),
            issue_date: Some(date(2025, 3, 1)),
            payment_method: Some(PaymentMethod::Boleto),
            recurrence: Recurrence::Monthly,
            counterparty: Some("Imobiliária Centro".into()),
        }
    }

    #[test]
    fn valid_form_is_trimmed() {
        let valid = form().validate().unwrap();
        assert_eq!(valid.description, "Aluguel");
        assert_eq!(valid.due_date, date(2025, 3, 10));
    }

    #[test]
    fn required_fields_block_submission() {
        let mut f = form();
        f.due_date = None;
        assert_eq!(f.validate().unwrap_err(), CrmError::Required { field: "due_date" });

        let mut f = form();
        f.value_cents = 0;
        assert!(f.validate().is_err());

        let mut f = form();
        f.issue_date = Some(date(2025, 4, 1));
        assert!(f.validate().is_err());

        let mut f = form();
        f.value_cents = money::MAX_MONEY_CENTS + 1;
        assert!(matches!(f.validate(), Err(CrmError::Invalid { field: "value", .. })));
    }

    #[test]
    fn movement_amounts_are_bounded() {
        assert_eq!(validate_movement_amount(1), Ok(1));
        assert!(validate_movement_amount(0).is_err());
        assert!(validate_movement_amount(i64::MAX).is_err());
    }

    #[test]
    fn summary_reports_overflow_instead_of_wrapping() {
        let err = summarize(
            0,
            vec![(MovementKind::Inflow, i64::MAX), (MovementKind::Inflow, 1)],
        )
        .unwrap_err();
        assert_eq!(err, CrmError::TotalOutOfRange { field: "inflow" });
        assert!(summarize(i64::MIN, vec![(MovementKind::Outflow, 1)]).is_err());
    }

    #[test]
    fn validated_registers_are_locked_for_clients() {
        assert!(ensure_register_editable(false, Side::Client).is_ok());
        assert!(ensure_register_editable(true, Side::Bpo).is_ok());
        assert_eq!(
            ensure_register_editable(true, Side::Client),
            Err(CrmError::RegisterLocked)
        );
    }

    #[test]
    fn chart_names_are_trimmed_and_required() {
        assert_eq!(chart_name("  Receitas ").unwrap(), "Receitas");
        assert_eq!(chart_name(" ").unwrap_err(), CrmError::Required { field: "name" });
    }

    #[test]
    fn summary_tracks_both_directions() {
        let summary = summarize(
            10_000,
            vec![
                (MovementKind::Inflow, 5_000),
                (MovementKind::Outflow, 2_500),
                (MovementKind::Inflow, 1_000),
            ],
        )
        .unwrap();
        assert_eq!(
            summary,
            CashSummary {
                opening_balance_cents: 10_000,
                inflow_cents: 6_000,
                outflow_cents: 2_500,
                balance_cents: 13_500,
            }
        );
    }
}
