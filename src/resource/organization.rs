//! `sentry_organization`

use super::id::{self, decode};
use super::validate::ValidationError;
use super::{absent_on_not_found, Applied, Resource, ResourceKind};
use crate::error::Result;
use crate::sentry::client::SentryClient;
use crate::sentry::organizations::{self as api, CreateOrganizationParams, UpdateOrganizationParams};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Organization {
    pub name: String,
    /// Derived from `name` by Sentry when unset
    #[serde(default)]
    pub slug: Option<String>,
    /// Create only; required by sentry.io, ignored by self-hosted servers
    #[serde(default)]
    pub agree_terms: Option<bool>,
    #[serde(default)]
    pub internal_id: Option<String>,
}

pub fn expand_create(org: &Organization) -> CreateOrganizationParams {
    CreateOrganizationParams {
        name: org.name.clone(),
        slug: org.slug.clone(),
        agree_terms: org.agree_terms,
    }
}

pub fn expand_update(org: &Organization) -> UpdateOrganizationParams {
    UpdateOrganizationParams {
        name: Some(org.name.clone()),
        slug: org.slug.clone(),
    }
}

pub fn flatten_organization(org: api::Organization) -> Organization {
    Organization {
        name: org.name,
        slug: Some(org.slug),
        agree_terms: None,
        internal_id: Some(org.id),
    }
}

fn single(id: &str) -> Result<String> {
    let mut parts = decode(id, ResourceKind::Organization.id_shape().parts())?;
    Ok(parts.remove(0))
}

pub struct OrganizationResource;

#[async_trait]
impl Resource for OrganizationResource {
    type Model = Organization;

    const KIND: ResourceKind = ResourceKind::Organization;

    fn validate(org: &Organization) -> Result<(), ValidationError> {
        if org.name.trim().is_empty() {
            return Err(ValidationError {
                field: "name".into(),
                value: org.name.clone(),
                allowed: "a non-empty name".into(),
            });
        }
        Ok(())
    }

    async fn create_remote(client: &SentryClient, org: &Organization) -> Result<Applied<Organization>> {
        tracing::info!(name = %org.name, slug = ?org.slug, "Creating organization");
        let created = api::create_organization(client, &expand_create(org)).await?;
        Ok(Applied {
            id: id::encode(&[created.slug.as_str()])?,
            state: flatten_organization(created),
        })
    }

    async fn read(client: &SentryClient, id: &str) -> Result<Option<Organization>> {
        let slug = single(id)?;
        tracing::debug!(%slug, "Reading organization");
        let org = absent_on_not_found(Self::KIND, id, api::get_organization(client, &slug).await)?;
        Ok(org.map(flatten_organization))
    }

    async fn update_remote(client: &SentryClient, id: &str, org: &Organization) -> Result<Applied<Organization>> {
        let slug = single(id)?;
        tracing::debug!(%slug, "Updating organization");
        let updated = api::update_organization(client, &slug, &expand_update(org)).await?;
        Ok(Applied {
            id: id::encode(&[updated.slug.as_str()])?,
            state: flatten_organization(updated),
        })
    }

    async fn delete_remote(client: &SentryClient, id: &str) -> Result<()> {
        let slug = single(id)?;
        tracing::debug!(%slug, "Deleting organization");
        api::delete_organization(client, &slug).await
    }

    fn keep_write_only(declared: &Organization, state: &mut Organization) {
        state.agree_terms = declared.agree_terms;
    }
}

/// Data source: look up an organization by slug.
pub async fn lookup(client: &SentryClient, slug: &str) -> Result<Applied<Organization>> {
    tracing::debug!(%slug, "Reading organization data source");
    let org = api::get_organization(client, slug).await?;
    Ok(Applied {
        id: id::encode(&[org.slug.as_str()])?,
        state: flatten_organization(org),
    })
}
