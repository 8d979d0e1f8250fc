//! Tenant Service

use kernel::id::TenantId;
use std::sync::Arc;

use crate::domain::entity::{Tenant, TenantPatch};
use crate::domain::repository::TenantRepository;
use crate::domain::value_object::{Page, TenantLookup};
use crate::error::{IamError, IamResult};

/// Create tenant input
pub struct CreateTenantInput {
    pub name: String,
    pub document: String,
}

/// Tenant CRUD; authorization happens before these calls
pub struct TenantService<R>
where
    R: TenantRepository,
{
    repo: Arc<R>,
}

impl<R> TenantService<R>
where
    R: TenantRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, input: CreateTenantInput) -> IamResult<Tenant> {
        let tenant = Tenant::new(&input.name, &input.document)?;
        self.repo.create_tenant(&tenant).await?;

        tracing::info!(tenant_id = %tenant.id, "Tenant created");
        Ok(tenant)
    }

    pub async fn find(&self, lookup: &TenantLookup) -> IamResult<Tenant> {
        self.repo
            .find_tenant(lookup)
            .await?
            .ok_or(IamError::TenantNotFound)
    }

    pub async fn list(&self, page: Page) -> IamResult<Vec<Tenant>> {
        self.repo.list_tenants(page).await
    }

    pub async fn update(&self, id: TenantId, patch: TenantPatch) -> IamResult<Tenant> {
        if patch.is_empty() {
            return Err(IamError::invalid("no fields to update"));
        }

        let mut tenant = self.find(&TenantLookup::Id(id)).await?;
        tenant.apply(patch)?;
        self.repo.update_tenant(&tenant).await?;

        tracing::info!(tenant_id = %tenant.id, "Tenant updated");
        Ok(tenant)
    }

    pub async fn delete(&self, lookup: &TenantLookup) -> IamResult<Tenant> {
        let tenant = self.find(lookup).await?;
        if !self.repo.delete_tenant(tenant.id).await? {
            return Err(IamError::TenantNotFound);
        }

        tracing::info!(tenant_id = %tenant.id, "Tenant deleted");
        Ok(tenant)
    }
}
