//! Processing order of entity types.
//!
//! Export and deploy both walk the registry so that every type is handled
//! after all the types it may reference. On deploy this guarantees that a
//! referenced entity already has its ID registered by the time a referrer
//! is resolved.

use crate::entity::registry::{self, EntityKind, EntityType, Product};
use crate::error::Error;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Registered types belonging to `selected`, in dependency order.
///
/// Types of unselected products are skipped; references to them can only be
/// resolved from names registered some other way.
///
/// # Errors
///
/// Returns an error if the registry's references form a cycle.
pub fn plan_order(selected: &[Product]) -> Result<Vec<&'static EntityType>, Error> {
    let types = registry::all_types();
    let nodes: Vec<(EntityKind, &[EntityKind])> =
        types.iter().map(|t| (t.kind, t.references)).collect();

    Ok(topological_sort(&nodes)?
        .into_iter()
        .map(|i| &types[i])
        .filter(|t| selected.contains(&t.product))
        .collect())
}

/// Registered types outside `selected`, in dependency order. Export and
/// deploy read their local files to know names the run itself does not
/// produce.
///
/// # Errors
///
/// Returns an error if the registry's references form a cycle.
pub fn unselected_types(selected: &[Product]) -> Result<Vec<&'static EntityType>, Error> {
    Ok(registry::all_types_in_dependency_order()?
        .into_iter()
        .filter(|t| !selected.contains(&t.product))
        .collect())
}

/// One row of a rendered plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlanStep {
    pub position: usize,
    pub entity_type: String,
    pub product: Product,
    pub file: String,
    pub references: Vec<String>,
}

/// Describes the plan for `selected` for display.
///
/// # Errors
///
/// Returns an error if the registry's references form a cycle.
pub fn describe_plan(selected: &[Product]) -> Result<Vec<PlanStep>, Error> {
    Ok(plan_order(selected)?
        .into_iter()
        .enumerate()
        .map(|(i, t)| PlanStep {
            position: i + 1,
            entity_type: t.kind.to_string(),
            product: t.product,
            file: t.relative_path(),
            references: t.references.iter().map(ToString::to_string).collect(),
        })
        .collect())
}

/// Kahn's algorithm over `(kind, references)` nodes.
///
/// Among types that are ready at the same time the one listed first wins, so
/// the result is deterministic and matches the listing whenever the listing
/// is already valid.
fn topological_sort(nodes: &[(EntityKind, &[EntityKind])]) -> Result<Vec<usize>, Error> {
    let index: HashMap<EntityKind, usize> =
        nodes.iter().enumerate().map(|(i, (kind, _))| (*kind, i)).collect();

    // Edges point from a referenced type to its referrers
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut in_degree = vec![0usize; nodes.len()];
    for (i, (_, references)) in nodes.iter().enumerate() {
        for referenced in *references {
            // References to unlisted kinds impose no ordering
            if let Some(&dep) = index.get(referenced) {
                if dep != i {
                    dependents[dep].push(i);
                    in_degree[i] += 1;
                }
            }
        }
    }

    let mut ready: BTreeSet<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(nodes.len());
    while let Some(node) = ready.pop_first() {
        order.push(node);
        for &next in &dependents[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.insert(next);
            }
        }
    }

    if order.len() != nodes.len() {
        let stuck: Vec<String> = (0..nodes.len())
            .filter(|&i| in_degree[i] > 0)
            .map(|i| nodes[i].0.to_string())
            .collect();
        return Err(Error::dependency_cycle(&stuck));
    }

    Ok(order)
}
