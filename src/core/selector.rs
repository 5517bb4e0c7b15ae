//! Candidate selection across resources.

use tracing::{debug, warn};

use crate::core::client::ResourceClient;
use crate::core::deadline::InterruptListener;
use crate::core::exclusion::ExclusionSet;
use crate::core::model::{CandidateMap, ItemName};
use crate::core::policy::Policy;
use crate::util::report::Reporter;

/// Select ranked candidates for every resource, serially, one connection
/// per resource.
///
/// An unreachable or failing resource is reported and skipped. Selection
/// stops early, returning what it has, if `interrupt` is raised.
pub async fn select_candidates<C: ResourceClient>(
    client: &C,
    resources: &[String],
    exclusions: &ExclusionSet,
    policy: &Policy,
    reporter: &Reporter,
    interrupt: &InterruptListener,
) -> CandidateMap {
    let mut selected = CandidateMap::new();
    for resource in resources {
        if interrupt.is_raised() {
            debug!("selection interrupted");
            break;
        }
        let items = select_for_resource(client, resource, exclusions, policy, reporter).await;
        debug!(resource = %resource, found = items.len(), "looked for eligible items");
        selected.insert(resource.clone(), items);
    }
    debug!(
        resources = selected.resource_count(),
        candidates = selected.total(),
        "selection complete"
    );
    selected
}

/// Ranked candidates of one resource; empty if the resource fails.
pub async fn select_for_resource<C: ResourceClient>(
    client: &C,
    resource: &str,
    exclusions: &ExclusionSet,
    policy: &Policy,
    reporter: &Reporter,
) -> Vec<ItemName> {
    reporter.verbose(format!("finding tables in database {resource}"));

    let mut conn = match client.connect(resource).await {
        Ok(conn) => conn,
        Err(e) => {
            warn!(resource = %resource, error = %e, "skipping resource");
            reporter.emit(format!("skipping database {resource} (couldn't connect: {e})"));
            return Vec::new();
        }
    };

    let excluded = exclusions.for_resource(resource);
    debug!(resource = %resource, excluded = ?excluded, "effective exclusions");
    let fetched = client.candidates(&mut conn, policy, &excluded).await;
    client.close(conn).await;

    let mut candidates = match fetched {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!(resource = %resource, error = %e, "candidate query failed");
            reporter.emit(format!("skipping database {resource} (candidate query failed: {e})"));
            return Vec::new();
        }
    };

    candidates.retain(|candidate| !exclusions.is_excluded(resource, &candidate.name));
    policy.rank(&mut candidates);
    candidates.into_iter().map(|candidate| candidate.name).collect()
}
