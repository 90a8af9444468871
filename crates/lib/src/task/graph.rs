//! Task dependency graph.
//!
//! Tasks are nodes; an edge runs from a prerequisite to the task that needs
//! it. The graph is validated when it is built, so resolution later on
//! cannot meet an unknown name or a cycle.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, Reversed};

use super::Task;
use crate::error::TaskError;

/// Validated, acyclic set of tasks.
#[derive(Debug)]
pub struct TaskGraph {
  graph: DiGraph<Task, ()>,
  nodes: HashMap<&'static str, NodeIndex>,
}

impl TaskGraph {
  /// Register `tasks` and link each to its prerequisites.
  ///
  /// # Errors
  ///
  /// Returns `DuplicateTask` if a name is registered twice,
  /// `UnknownDependency` if a task needs an unregistered name and
  /// `CycleDetected` if the prerequisites form a cycle.
  pub fn new(tasks: impl IntoIterator<Item = Task>) -> Result<Self, TaskError> {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    for task in tasks {
      if nodes.contains_key(task.name) {
        return Err(TaskError::DuplicateTask(task.name.to_string()));
      }
      let name = task.name;
      nodes.insert(name, graph.add_node(task));
    }

    let indices: Vec<NodeIndex> = graph.node_indices().collect();
    for idx in indices {
      let task = graph[idx];
      for dependency in task.needs {
        let dep_idx = *nodes.get(dependency).ok_or_else(|| TaskError::UnknownDependency {
          task: task.name.to_string(),
          dependency: dependency.to_string(),
        })?;
        graph.add_edge(dep_idx, idx, ());
      }
    }

    toposort(&graph, None).map_err(|_| TaskError::CycleDetected)?;

    Ok(Self { graph, nodes })
  }

  pub fn get(&self, name: &str) -> Option<&Task> {
    self.nodes.get(name).map(|idx| &self.graph[*idx])
  }

  /// All tasks in registration order.
  pub fn tasks(&self) -> impl Iterator<Item = &Task> {
    self.graph.node_indices().map(move |idx| &self.graph[idx])
  }

  /// `name`'s transitive prerequisites followed by `name` itself, each
  /// after everything it needs.
  ///
  /// # Errors
  ///
  /// Returns `UnknownTask` if `name` is not registered.
  pub fn plan(&self, name: &str) -> Result<Vec<&Task>, TaskError> {
    let target = *self
      .nodes
      .get(name)
      .ok_or_else(|| TaskError::UnknownTask(name.to_string()))?;

    let reversed = Reversed(&self.graph);
    let mut required = HashSet::new();
    let mut dfs = Dfs::new(reversed, target);
    while let Some(idx) = dfs.next(reversed) {
      required.insert(idx);
    }

    let order = toposort(&self.graph, None).map_err(|_| TaskError::CycleDetected)?;

    Ok(
      order
        .into_iter()
        .filter(|idx| required.contains(idx))
        .map(|idx| &self.graph[idx])
        .collect(),
    )
  }
}
