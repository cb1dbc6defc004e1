//! Table dependency DAG and load-order validation.
//!
//! Dependencies are derived automatically from FK expressions (each edge
//! runs from a referenced dimension to the table referencing it), so a
//! declared load order can be checked statically before any extraction
//! begins, and a referential cycle among dimensions is caught instead of
//! silently mis-ordered.

use crate::error::{CoreError, CoreResult};
use crate::schema::CompiledMap;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};

/// A directed acyclic graph of target-table dependencies.
#[derive(Debug)]
pub struct TableDag {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl TableDag {
    /// Build the DAG from a compiled schema map and validate it is acyclic.
    pub fn from_map(map: &CompiledMap) -> CoreResult<Self> {
        let mut dag = Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        };

        for table in map.tables() {
            dag.add_table(table.name());
        }
        for table in map.tables() {
            for col in table.fk_columns() {
                if let Some(dim) = col.expr.referenced_dimension() {
                    // Self-reference would always violate load order; the
                    // cycle check reports it as a one-node cycle.
                    dag.add_dependency(table.name(), dim);
                }
            }
        }

        dag.validate()?;
        Ok(dag)
    }

    fn add_table(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(name) {
            idx
        } else {
            let idx = self.graph.add_node(name.to_string());
            self.node_map.insert(name.to_string(), idx);
            idx
        }
    }

    /// Add a dependency edge (`from` depends on `to`).
    fn add_dependency(&mut self, from: &str, to: &str) {
        let from_idx = self.add_table(from);
        let to_idx = self.add_table(to);
        // Edge goes from dependency to dependent (to -> from), so a
        // topological sort yields dependencies first.
        self.graph.add_edge(to_idx, from_idx, ());
    }

    /// Validate the DAG has no cycles.
    pub fn validate(&self) -> CoreResult<()> {
        match toposort(&self.graph, None) {
            Ok(_) => Ok(()),
            Err(cycle) => Err(CoreError::CircularDependency {
                cycle: self.find_cycle_path(cycle.node_id()),
            }),
        }
    }

    /// Find a cycle path starting from a node for error reporting.
    fn find_cycle_path(&self, start: NodeIndex) -> String {
        let mut path: Vec<String> = vec![self.graph[start].clone()];
        let mut current = start;
        let mut visited = HashSet::new();
        visited.insert(current);

        while let Some(edge) = self.graph.edges(current).next() {
            let target = edge.target();
            path.push(self.graph[target].clone());

            if target == start || visited.contains(&target) {
                break;
            }

            visited.insert(target);
            current = target;
        }

        path.join(" -> ")
    }

    /// Tables in topological order (dimensions before their referencers).
    pub fn topological_order(&self) -> CoreResult<Vec<String>> {
        match toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .into_iter()
                .map(|idx| self.graph[idx].clone())
                .collect()),
            Err(cycle) => Err(CoreError::CircularDependency {
                cycle: self.find_cycle_path(cycle.node_id()),
            }),
        }
    }

    /// Direct dependencies of a table (the dimensions it FK-references).
    pub fn dependencies(&self, table: &str) -> Vec<String> {
        if let Some(&idx) = self.node_map.get(table) {
            self.graph
                .edges_directed(idx, petgraph::Direction::Incoming)
                .map(|e| self.graph[e.source()].clone())
                .collect()
        } else {
            Vec::new()
        }
    }

    pub fn contains(&self, table: &str) -> bool {
        self.node_map.contains_key(table)
    }

    /// Check a declared load order against the dependency graph.
    ///
    /// Requires: every order entry is a mapped table, every mapped table
    /// appears exactly once, and every FK target comes strictly earlier
    /// than its referencing table.
    pub fn validate_order(&self, order: &[String]) -> CoreResult<()> {
        let mut position: HashMap<&str, usize> = HashMap::new();
        for (i, name) in order.iter().enumerate() {
            if !self.contains(name) {
                return Err(CoreError::UnknownTableInOrder {
                    table: name.clone(),
                });
            }
            if position.insert(name.as_str(), i).is_some() {
                return Err(CoreError::DuplicateTable { name: name.clone() });
            }
        }
        for table in self.node_map.keys() {
            if !position.contains_key(table.as_str()) {
                return Err(CoreError::TableNotInOrder {
                    table: table.clone(),
                });
            }
        }

        for (table, &pos) in &position {
            for dim in self.dependencies(table) {
                if position[dim.as_str()] >= pos {
                    return Err(CoreError::LoadOrderViolation {
                        table: (*table).to_string(),
                        dimension: dim,
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "dag_test.rs"]
mod tests;
