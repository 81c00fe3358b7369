//! Client onboarding checklist.

use serde::Serialize;

use crate::{CrmError, CrmResult, Stage};

/// Steps every new client goes through, in display order.
pub const CHECKLIST: [(&str, &str); 7] = [
    ("contrato_assinado", "Contrato assinado e arquivado"),
    ("acesso_bancario", "Acesso aos extratos bancários"),
    ("plano_de_contas", "Plano de contas definido"),
    ("cadastro_fornecedores", "Cadastro de fornecedores"),
    ("cadastro_clientes", "Cadastro de clientes"),
    ("saldos_iniciais", "Saldos iniciais conferidos"),
    ("treinamento", "Treinamento do cliente no portal"),
];

pub fn item_label(key: &str) -> Option<&'static str> {
    CHECKLIST
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| *label)
}

/// Only signed prospects are clients with a checklist.
pub fn ensure_client(stage: Stage) -> CrmResult<()> {
    match stage {
        Stage::Signed => Ok(()),
        other => Err(CrmError::invalid(
            "client",
            format!("prospect is {other}, onboarding starts once signed"),
        )),
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    pub percent: u8,
}

pub fn progress<I>(flags: I) -> Progress
where
    I: IntoIterator<Item = bool>,
{
    let (done, total) = flags
        .into_iter()
        .fold((0, 0), |(done, total), flag| (done + usize::from(flag), total + 1));
    let percent = if total == 0 {
        0
    } else {
        ((done * 100) / total) as u8
    };
    Progress {
        done,
        total,
        percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checklist_keys_are_unique() {
        for (idx, (key, _)) in CHECKLIST.iter().enumerate() {
            assert!(CHECKLIST[..idx].iter().all(|(k, _)| k != key));
        }
        assert_eq!(item_label("treinamento"), Some("Treinamento do cliente no portal"));
        assert_eq!(item_label("unknown"), None);
    }

    #[test]
    fn progress_rounds_down() {
        assert_eq!(
            progress([true, false, false]),
            Progress {
                done: 1,
                total: 3,
                percent: 33
            }
        );
        assert_eq!(progress(Vec::new()).percent, 0);
        assert_eq!(progress([true, true]).percent, 100);
    }

    #[test]
    fn onboarding_requires_signed_stage() {
        assert!(ensure_client(Stage::Signed).is_ok());
        assert!(ensure_client(Stage::ContractSent).is_err());
    }
}
