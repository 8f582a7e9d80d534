use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    target::{LifecycleState, Target},
};

/// Source of fleet membership.
pub trait Inventory {
    /// Lists the members of `fleet` in `region`.
    ///
    /// # Errors
    /// Returns [`Error::FleetNotFound`] when no such fleet exists and
    /// [`Error::Inventory`] when the inventory cannot be read.
    fn members(&self, fleet: &str, region: &str) -> Result<Vec<Target>>;
}

#[derive(Debug, Deserialize)]
struct InventoryDocument {
    #[serde(default)]
    fleets: Vec<FleetRecord>,
}

#[derive(Debug, Deserialize)]
struct FleetRecord {
    name: String,
    region: String,
    #[serde(default)]
    members: Vec<MemberRecord>,
}

#[derive(Debug, Deserialize)]
struct MemberRecord {
    identity: String,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    lifecycle_state: LifecycleState,
    created_at: DateTime<Utc>,
}

/// [`Inventory`] read from a JSON document on disk.
///
/// ```json
/// { "fleets": [ { "name": "web", "region": "eu-west-2", "members": [
///     { "identity": "i-1", "address": "10.0.0.1",
///       "lifecycle_state": "running", "created_at": "2024-05-01T10:00:00Z" } ] } ] }
/// ```
///
/// Members without an address cannot be probed and are left out.
#[derive(Debug, Clone)]
pub struct JsonInventory {
    path: PathBuf,
}

impl JsonInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<InventoryDocument> {
        let raw = std::fs::read_to_string(&self.path).map_err(|err| {
            Error::Inventory(format!("failed to read {}: {}", self.path.display(), err))
        })?;
        serde_json::from_str(&raw).map_err(|err| {
            Error::Inventory(format!("failed to parse {}: {}", self.path.display(), err))
        })
    }
}

impl Inventory for JsonInventory {
    fn members(&self, fleet: &str, region: &str) -> Result<Vec<Target>> {
        let document = self.load()?;
        let record = document
            .fleets
            .into_iter()
            .find(|record| record.name == fleet && record.region == region)
            .ok_or_else(|| Error::FleetNotFound {
                fleet: fleet.to_string(),
                region: region.to_string(),
            })?;

        let targets: Vec<Target> = record
            .members
            .into_iter()
            .filter_map(|member| match member.address {
                Some(address) if !address.is_empty() => Some(Target {
                    identity: member.identity,
                    address,
                    lifecycle_state: member.lifecycle_state,
                    created_at: member.created_at,
                }),
                _ => {
                    debug!("{} has no address, leaving it out", member.identity);
                    None
                }
            })
            .collect();
        debug!("fleet {} in {} has {} members", fleet, region, targets.len());
        Ok(targets)
    }
}
