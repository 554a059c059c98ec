use crate::model::{Catalog, Database, ResourceRef};
use crate::util::{Error, Result};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::HashMap;

/// `before` must be reconciled, in either direction, before `after` is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub before: ResourceRef,
    pub after: ResourceRef,
}

/// Ordering edge from a database to the catalog role named as its owner, if there is one.
///
/// The owner is a soft reference: a database whose owner is not declared gets no
/// edge and is left for the server to accept or reject.
pub fn owner_dependency(catalog: &Catalog, database: &Database) -> Option<Dependency> {
    let owner = database.owner.as_ref()?;
    if !catalog.roles.contains_key(owner) {
        return None;
    }
    Some(Dependency {
        before: ResourceRef::Role(owner.clone()),
        after: ResourceRef::Database(database.name.clone()),
    })
}

pub fn link_dependencies(catalog: &Catalog) -> Vec<Dependency> {
    catalog
        .databases
        .values()
        .filter_map(|database| owner_dependency(catalog, database))
        .collect()
}

/// The order in which a catalog's resources are reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    pub order: Vec<ResourceRef>,
    pub dependencies: Vec<Dependency>,
}

impl ExecutionPlan {
    /// Resources that must complete before `resource`.
    pub fn prerequisites<'a>(
        &'a self,
        resource: &'a ResourceRef,
    ) -> impl Iterator<Item = &'a ResourceRef> + 'a {
        self.dependencies
            .iter()
            .filter(move |dependency| &dependency.after == resource)
            .map(|dependency| &dependency.before)
    }
}

/// Orders every resource of the catalog so that each comes after its prerequisites.
pub fn plan_execution(catalog: &Catalog) -> Result<ExecutionPlan> {
    let mut graph: DiGraph<ResourceRef, ()> = DiGraph::new();
    let mut nodes: HashMap<ResourceRef, NodeIndex> = HashMap::new();

    let resources = catalog
        .roles
        .keys()
        .map(|name| ResourceRef::Role(name.clone()))
        .chain(
            catalog
                .databases
                .keys()
                .map(|name| ResourceRef::Database(name.clone())),
        );
    for resource in resources {
        let index = graph.add_node(resource.clone());
        nodes.insert(resource, index);
    }

    let dependencies = link_dependencies(catalog);
    for dependency in &dependencies {
        graph.add_edge(nodes[&dependency.before], nodes[&dependency.after], ());
    }

    let sorted = toposort(&graph, None).map_err(|cycle| Error::Cycle {
        resource: graph[cycle.node_id()].to_string(),
    })?;

    Ok(ExecutionPlan {
        order: sorted.into_iter().map(|index| graph[index].clone()).collect(),
        dependencies,
    })
}
