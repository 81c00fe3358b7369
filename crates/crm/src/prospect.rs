//! Prospect form rules.

use serde::{Deserialize, Serialize};

use crate::{money, CrmError, CrmResult, Plan, PlanTerms, ServiceArea, Stage};

const MAX_NAME: usize = 160;
const MAX_NOTES: usize = 10_000;

/// Fields a user fills in on the prospect form.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProspectForm {
    pub contact_name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_role: Option<String>,
    pub company_name: String,
    pub tax_id: Option<String>,
    pub segment: Option<String>,
    pub origin: Option<String>,
    pub notes: Option<String>,
}

impl ProspectForm {
    /// Trim, normalize and check required fields. Runs before any write.
    pub fn validate(self) -> CrmResult<ProspectForm> {
        Ok(ProspectForm {
            contact_name: required("contact_name", &self.contact_name, MAX_NAME)?,
            contact_email: optional(self.contact_email)
                .map(|email| normalize_email(&email))
                .transpose()?,
            contact_phone: optional(self.contact_phone),
            contact_role: optional(self.contact_role),
            company_name: required("company_name", &self.company_name, MAX_NAME)?,
            tax_id: optional(self.tax_id)
                .map(|id| normalize_tax_id(&id))
                .transpose()?,
            segment: optional(self.segment),
            origin: optional(self.origin),
            notes: match optional(self.notes) {
                Some(notes) if notes.chars().count() > MAX_NOTES => {
                    return Err(CrmError::TooLong {
                        field: "notes",
                        max: MAX_NOTES,
                    })
                }
                other => other,
            },
        })
    }
}

/// How an update touches the plan-derived fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PricingUpdate {
    Untouched,
    /// A plan was chosen: its terms replace value and areas wholesale.
    FromPlan(PlanTerms),
    Manual {
        monthly_value_cents: Option<i64>,
        service_areas: Option<Vec<String>>,
    },
}

/// A plan in the update always wins over manual value/area edits sent with it.
pub fn pricing_update(
    plan: Option<Plan>,
    monthly_value_cents: Option<i64>,
    service_areas: Option<Vec<String>>,
) -> CrmResult<PricingUpdate> {
    if let Some(plan) = plan {
        return Ok(PricingUpdate::FromPlan(plan.terms()));
    }
    if monthly_value_cents.is_none() && service_areas.is_none() {
        return Ok(PricingUpdate::Untouched);
    }
    if let Some(value) = monthly_value_cents {
        if value < 0 {
            return Err(CrmError::invalid("monthly_value", "must not be negative"));
        }
        money::bounded("monthly_value", value)?;
    }
    let service_areas = service_areas
        .map(|areas| {
            areas
                .into_iter()
                .map(|area| {
                    let key = area.trim().to_ascii_lowercase();
                    known_area(&key)
                        .map(|a| a.as_str().to_string())
                        .ok_or_else(|| CrmError::invalid("service_areas", format!("unknown area {area}")))
                })
                .collect::<CrmResult<Vec<_>>>()
        })
        .transpose()?;
    Ok(PricingUpdate::Manual {
        monthly_value_cents,
        service_areas,
    })
}

fn known_area(key: &str) -> Option<ServiceArea> {
    Plan::Avancado
        .terms()
        .areas
        .iter()
        .copied()
        .find(|a| a.as_str() == key)
}

pub fn ensure_deletable(stage: Stage) -> CrmResult<()> {
    if stage.is_locked() {
        Err(CrmError::SignedProspectLocked)
    } else {
        Ok(())
    }
}

/// CPF (11 digits) or CNPJ (14 digits); punctuation is dropped.
pub fn normalize_tax_id(value: &str) -> CrmResult<String> {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        11 | 14 => Ok(digits),
        _ => Err(CrmError::invalid("tax_id", "expected a CPF or CNPJ")),
    }
}

pub fn normalize_email(value: &str) -> CrmResult<String> {
    let trimmed = value.trim().to_lowercase();
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(trimmed),
        _ => Err(CrmError::invalid("email", "not an email address")),
    }
}

pub(crate) fn required(field: &'static str, value: &str, max: usize) -> CrmResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CrmError::Required { field });
    }
    if trimmed.chars().count() > max {
        return Err(CrmError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ProspectForm {
        ProspectForm {
            contact_name: "  Maria Souza ".into(),
            contact_email: Some("Maria@Padaria.com.br".into()),
            company_name: "Padaria Pão Quente".into(),
            tax_id: Some("12.345.678/0001-90".into()),
            notes: Some("   ".into()),
            ..Default::default()
        }
    }

    #[test]
    fn validate_normalizes_fields() {
        let valid = form().validate().unwrap();
        assert_eq!(valid.contact_name, "Maria Souza");
        assert_eq!(valid.contact_email.as_deref(), Some("maria@padaria.com.br"));
        assert_eq!(valid.tax_id.as_deref(), Some("12345678000190"));
        assert_eq!(valid.notes, None);
    }

    #[test]
    fn validate_rejects_missing_company() {
        let mut f = form();
        f.company_name = "  ".into();
        assert_eq!(
            f.validate().unwrap_err(),
            CrmError::Required {
                field: "company_name"
            }
        );
    }

    #[test]
    fn validate_rejects_bad_tax_id() {
        let mut f = form();
        f.tax_id = Some("123".into());
        assert!(matches!(
            f.validate(),
            Err(CrmError::Invalid { field: "tax_id", .. })
        ));
    }

    #[test]
    fn plan_overrides_manual_pricing() {
        let update = pricing_update(
            Some(Plan::Gerencial),
            Some(1),
            Some(vec!["dre".into()]),
        )
        .unwrap();
        assert_eq!(update, PricingUpdate::FromPlan(Plan::Gerencial.terms()));
    }

    #[test]
    fn manual_pricing_is_checked() {
        assert_eq!(pricing_update(None, None, None).unwrap(), PricingUpdate::Untouched);
        assert!(pricing_update(None, Some(-5), None).is_err());
        assert!(pricing_update(None, Some(i64::MAX), None).is_err());
        assert!(pricing_update(None, Some(crate::money::MAX_MONEY_CENTS), None).is_ok());
        assert!(pricing_update(None, None, Some(vec!["payroll".into()])).is_err());
        assert_eq!(
            pricing_update(None, Some(100_000), Some(vec![" DRE ".into()])).unwrap(),
            PricingUpdate::Manual {
                monthly_value_cents: Some(100_000),
                service_areas: Some(vec!["dre".into()]),
            }
        );
    }

    #[test]
    fn only_signed_prospects_are_locked() {
        for stage in Stage::ALL {
            assert_eq!(ensure_deletable(stage).is_err(), stage == Stage::Signed);
        }
    }
}
