//! sea-orm models for the BPO back office.
//!
//! Every tenant-owned table carries `org_id`; the services scope each query
//! with it. Persisted enums convert to and from their `crm` counterparts.

pub mod cash_movement;
pub mod financial_account;
pub mod financial_category;
pub mod financial_group;
pub mod financial_register;
pub mod onboarding_item;
pub mod org;
pub mod prospect;
pub mod prospect_stage_history;
pub mod user;
pub mod user_role;
pub mod user_secret;
