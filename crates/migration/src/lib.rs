pub use sea_orm_migration::prelude::*;

mod m20251020_000001_tenancy_auth;
mod m20251020_000002_prospects;
mod m20251020_000003_finance;
mod m20251020_000004_onboarding;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251020_000001_tenancy_auth::Migration),
            Box::new(m20251020_000002_prospects::Migration),
            Box::new(m20251020_000003_finance::Migration),
            Box::new(m20251020_000004_onboarding::Migration),
        ]
    }
}
