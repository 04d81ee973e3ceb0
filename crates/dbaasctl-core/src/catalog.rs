//! Catalog lookups
//!
//! The create-cluster call needs opaque type and flavor ids. These are resolved
//! from human selectors (a version string, a flavor name) by listing the catalog
//! and taking the first entry whose selector field matches.

use tracing::{debug, info};

use crate::client::DbaasClient;
use crate::error::{CoreError, Result};
use crate::models::{ClusterType, Flavor, Listing};
use crate::step::Step;

/// Catalog reader on an authorized client
pub struct CatalogLookup {
    client: DbaasClient,
}

impl CatalogLookup {
    pub fn new(client: DbaasClient) -> Self {
        Self { client }
    }

    /// `GET /api/types`
    pub async fn list_types(&self) -> Result<Vec<ClusterType>> {
        let listing: Listing<ClusterType> = self
            .client
            .get_json(Step::ResolveCatalog, "/api/types")
            .await?;
        Ok(listing.into_vec())
    }

    /// `GET /api/flavors`
    pub async fn list_flavors(&self) -> Result<Vec<Flavor>> {
        let listing: Listing<Flavor> = self
            .client
            .get_json(Step::ResolveCatalog, "/api/flavors")
            .await?;
        Ok(listing.into_vec())
    }

    /// Id of the first cluster type whose `version` equals `version`
    pub async fn resolve_type_id(&self, version: &str) -> Result<String> {
        let types = self.list_types().await?;
        debug!("Scanning {} cluster types for version '{}'", types.len(), version);
        let id = find_id(&types, "cluster type", version, |t| &t.version, |t| &t.id)?;
        info!("Resolved cluster type '{}' to {}", version, id);
        Ok(id)
    }

    /// Id of the first flavor whose `name` equals `name`
    pub async fn resolve_flavor_id(&self, name: &str) -> Result<String> {
        let flavors = self.list_flavors().await?;
        debug!("Scanning {} flavors for name '{}'", flavors.len(), name);
        let id = find_id(&flavors, "flavor", name, |f| &f.name, |f| &f.id)?;
        info!("Resolved flavor '{}' to {}", name, id);
        Ok(id)
    }
}

/// Linear scan for the first record whose selector equals `target`
///
/// A match with an empty id counts as a miss so no caller ever proceeds with an
/// empty identifier.
pub fn find_id<T>(
    records: &[T],
    kind: &'static str,
    target: &str,
    selector: impl Fn(&T) -> &String,
    id: impl Fn(&T) -> &String,
) -> Result<String> {
    records
        .iter()
        .find(|record| selector(*record) == target)
        .map(|record| id(record).clone())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CoreError::CatalogMiss {
            kind,
            target: target.to_string(),
        })
}
