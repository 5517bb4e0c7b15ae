//! Build a run plan from configuration.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::core::{build_exclusions, ExclusionSet, MaintenanceError, Policy, ResourceClient};

/// Everything selection needs, resolved once before any work starts.
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Resources to visit, in visiting order.
    pub resources: Vec<String>,
    /// Effective exclusions.
    pub exclusions: ExclusionSet,
    /// Selection policy.
    pub policy: Policy,
}

/// Resolve resources, exclusions, and policy for `cfg`.
///
/// Explicit resources are used as given; otherwise they are discovered
/// through `client`. Repeated names are visited once, at their first
/// position.
///
/// # Errors
///
/// [`MaintenanceError::Config`] if `cfg` is invalid, and
/// [`MaintenanceError::Startup`] if discovery fails or finds nothing.
pub async fn build_plan<C: ResourceClient>(
    cfg: &RunConfig,
    client: &C,
) -> Result<RunPlan, MaintenanceError> {
    cfg.validate().map_err(MaintenanceError::Config)?;

    let mut resources = if cfg.resources.is_empty() {
        let discovered = client
            .list_resources()
            .await
            .map_err(|e| MaintenanceError::Startup(format!("could not list databases: {e}")))?;
        if discovered.is_empty() {
            return Err(MaintenanceError::Startup(
                "no databases to vacuum, aborting".into(),
            ));
        }
        info!(count = discovered.len(), "discovered resources");
        discovered
    } else {
        cfg.resources.clone()
    };

    let listed = resources.len();
    let mut seen = HashSet::with_capacity(listed);
    resources.retain(|name| seen.insert(name.clone()));
    if resources.len() < listed {
        warn!(
            dropped = listed - resources.len(),
            "duplicate database names ignored"
        );
    }

    let exclusions = build_exclusions(cfg.exclude_items.iter().cloned(), cfg.exclude_scoped.clone());
    let policy = cfg.policy();
    debug!(resources = ?resources, policy = ?policy, "run plan built");

    Ok(RunPlan {
        resources,
        exclusions,
        policy,
    })
}
