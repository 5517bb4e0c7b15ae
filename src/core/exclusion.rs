//! Global and per-resource item exclusions.

use std::collections::{BTreeSet, HashMap};

use crate::core::error::MaintenanceError;
use crate::core::model::ItemName;

/// Per-resource item denylist.
///
/// The effective set for a resource is the global set united with that
/// resource's overrides. An entry matches an item by its display name
/// (`orders`, `audit.events`) or its qualified name (`public.orders`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    global: BTreeSet<String>,
    scoped: HashMap<String, BTreeSet<String>>,
}

/// Build the exclusion set from the global list and per-resource overrides.
pub fn build_exclusions<G, S>(global: G, scoped: HashMap<String, S>) -> ExclusionSet
where
    G: IntoIterator,
    G::Item: Into<String>,
    S: IntoIterator,
    S::Item: Into<String>,
{
    ExclusionSet {
        global: global.into_iter().map(Into::into).collect(),
        scoped: scoped
            .into_iter()
            .map(|(resource, items)| (resource, items.into_iter().map(Into::into).collect()))
            .collect(),
    }
}

/// Parse repeated `RESOURCE.ITEM` arguments into per-resource overrides.
///
/// # Errors
///
/// Returns [`MaintenanceError::Config`] for any argument that does not split
/// into exactly two non-empty parts on `.`.
pub fn parse_scoped_excludes<I, A>(args: I) -> Result<HashMap<String, BTreeSet<String>>, MaintenanceError>
where
    I: IntoIterator<Item = A>,
    A: AsRef<str>,
{
    let mut scoped: HashMap<String, BTreeSet<String>> = HashMap::new();
    for arg in args {
        let arg = arg.as_ref();
        let parts: Vec<&str> = arg.split('.').collect();
        let [resource, item] = parts.as_slice() else {
            return Err(invalid_scoped(arg));
        };
        if resource.is_empty() || item.is_empty() {
            return Err(invalid_scoped(arg));
        }
        scoped
            .entry((*resource).to_string())
            .or_default()
            .insert((*item).to_string());
    }
    Ok(scoped)
}

fn invalid_scoped(arg: &str) -> MaintenanceError {
    MaintenanceError::Config(format!(
        "invalid argument '{arg}' to flag --exclude-table-in-database: argument must be of the form DATABASE.TABLE"
    ))
}

impl ExclusionSet {
    /// Effective excluded names for `resource`, sorted.
    #[must_use]
    pub fn for_resource(&self, resource: &str) -> Vec<String> {
        let mut names: BTreeSet<&String> = self.global.iter().collect();
        if let Some(scoped) = self.scoped.get(resource) {
            names.extend(scoped.iter());
        }
        names.into_iter().cloned().collect()
    }

    /// Whether `item` is excluded within `resource`.
    #[must_use]
    pub fn is_excluded(&self, resource: &str, item: &ItemName) -> bool {
        let display = item.to_string();
        let qualified = item.qualified();
        let hit = |set: &BTreeSet<String>| set.contains(&display) || set.contains(&qualified);
        hit(&self.global) || self.scoped.get(resource).is_some_and(hit)
    }

    /// Whether nothing is excluded anywhere.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.scoped.values().all(BTreeSet::is_empty)
    }
}
