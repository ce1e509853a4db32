//! Cycle analysis over a schema store.
//!
//! Marks every named type that can reach itself through any composition of
//! record-field, array-item, map-value, or union-member edges. The visited
//! set travels *by value* down each path (cloned at every fork), so sibling
//! branches of the same record never contaminate each other, and a path can
//! revisit a name at most once before the walk stops descending — which is
//! also what guarantees termination.

use std::collections::BTreeSet;

use crate::schema::{SchemaNode, is_primitive_name};
use crate::store::SchemaStore;

pub type CycleSet = BTreeSet<String>;

/// Compute the set of cycle-starting names for one store snapshot.
pub fn analyze(store: &SchemaStore) -> CycleSet {
    let mut cyclic = CycleSet::new();
    for (name, node) in store.entries() {
        let mut visited = BTreeSet::new();
        visited.insert(name.to_string());
        walk(store, node, Some(name), visited, &mut cyclic);
    }
    cyclic
}

fn walk(
    store: &SchemaStore,
    node: &SchemaNode,
    context: Option<&str>,
    visited: BTreeSet<String>,
    cyclic: &mut CycleSet,
) {
    match node {
        SchemaNode::Name(name) => {
            if is_primitive_name(name) {
                return;
            }
            if visited.contains(name) {
                cyclic.insert(name.clone());
                return;
            }
            // Unresolvable references are left for synthesis to report.
            let Ok(resolved) = store.load(name, context) else {
                return;
            };
            let mut visited = visited;
            visited.insert(name.clone());
            walk(store, &resolved, Some(name), visited, cyclic);
        }
        SchemaNode::Union(branches) => {
            for branch in branches {
                walk(store, branch, context, visited.clone(), cyclic);
            }
        }
        SchemaNode::Definition(def) => {
            let mut visited = visited;
            if let Some(name) = &def.name {
                if visited.contains(name) {
                    cyclic.insert(name.clone());
                    return;
                }
                visited.insert(name.clone());
            }
            for field in &def.fields {
                walk(store, &field.schema, context, visited.clone(), cyclic);
            }
            if let Some(items) = &def.items {
                walk(store, items, context, visited.clone(), cyclic);
            }
            if let Some(values) = &def.values {
                walk(store, values, context, visited.clone(), cyclic);
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
