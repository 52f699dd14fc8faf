use std::collections::HashMap;

use crate::link::{LinkTable, Successor};
use crate::workflow::Workflow;

/// Step-level control-flow graph for analysis.
///
/// Edges come from resolved links. Barrier and chain successors expand to
/// the head steps of the target level. A `continue` tail gets an implicit
/// edge to every head of the next level.
#[derive(Debug, Clone)]
pub struct LinkGraph {
  /// Step ids in traversal order.
  order: Vec<String>,
  /// Adjacency list: step_id -> list of downstream step_ids.
  adjacency: HashMap<String, Vec<String>>,
  /// Reverse adjacency: step_id -> list of upstream step_ids.
  reverse_adjacency: HashMap<String, Vec<String>>,
}

impl LinkGraph {
  pub fn new(workflow: &Workflow, links: &LinkTable) -> Self {
    let mut order = Vec::new();
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut reverse_adjacency: HashMap<String, Vec<String>> = HashMap::new();

    for step in workflow.steps() {
      order.push(step.step_id.clone());
      adjacency.entry(step.step_id.clone()).or_default();
      reverse_adjacency.entry(step.step_id.clone()).or_default();
    }

    for level in &workflow.levels {
      for thread in &level.threads {
        for step in &thread.steps {
          let Some(link) = links.get(&step.step_id) else {
            continue;
          };
          for successor in link.successors() {
            for target in successor_heads(workflow, level.level_id, successor) {
              adjacency
                .entry(step.step_id.clone())
                .or_default()
                .push(target.clone());
              reverse_adjacency
                .entry(target)
                .or_default()
                .push(step.step_id.clone());
            }
          }
        }
      }
    }

    Self {
      order,
      adjacency,
      reverse_adjacency,
    }
  }

  /// Steps with no incoming edges, in traversal order.
  pub fn entry_points(&self) -> Vec<&str> {
    self
      .order
      .iter()
      .filter(|id| self.upstream(id).is_empty())
      .map(String::as_str)
      .collect()
  }

  pub fn downstream(&self, step_id: &str) -> &[String] {
    self
      .adjacency
      .get(step_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  pub fn upstream(&self, step_id: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(step_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Check if a step has multiple incoming edges.
  pub fn is_join_point(&self, step_id: &str) -> bool {
    self.upstream(step_id).len() > 1
  }

  /// All join points, in traversal order.
  pub fn join_points(&self) -> Vec<&str> {
    self
      .order
      .iter()
      .filter(|id| self.is_join_point(id))
      .map(String::as_str)
      .collect()
  }

  /// Find one cycle, returned as the step ids along it.
  pub fn find_cycle(&self) -> Option<Vec<String>> {
    // 0 = unvisited, 1 = on the current path, 2 = done
    let mut color: HashMap<&str, u8> = self.order.iter().map(|id| (id.as_str(), 0u8)).collect();
    let mut path: Vec<&str> = Vec::new();

    fn dfs<'a>(
      node: &'a str,
      graph: &'a LinkGraph,
      color: &mut HashMap<&'a str, u8>,
      path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
      color.insert(node, 1);
      path.push(node);

      for neighbor in graph.downstream(node) {
        match color.get(neighbor.as_str()) {
          Some(1) => {
            // Back edge: the cycle is the path suffix starting at neighbor
            let start = path.iter().position(|id| *id == neighbor.as_str())?;
            return Some(path[start..].iter().map(|id| id.to_string()).collect());
          }
          Some(0) => {
            if let Some(cycle) = dfs(neighbor, graph, color, path) {
              return Some(cycle);
            }
          }
          _ => {}
        }
      }

      path.pop();
      color.insert(node, 2);
      None
    }

    for step_id in &self.order {
      if color.get(step_id.as_str()) == Some(&0)
        && let Some(cycle) = dfs(step_id, self, &mut color, &mut path)
      {
        return Some(cycle);
      }
    }

    None
  }
}

/// Step ids a successor leads to from a step in `level_id`.
fn successor_heads(workflow: &Workflow, level_id: i64, successor: &Successor) -> Vec<String> {
  let heads_of = |target_level: i64| -> Vec<String> {
    workflow
      .level(target_level)
      .map(|level| {
        level
          .threads
          .iter()
          .filter_map(|thread| thread.head())
          .map(|step| step.step_id.clone())
          .collect()
      })
      .unwrap_or_default()
  };

  match successor {
    Successor::Step { step_id, .. } => vec![step_id.clone()],
    Successor::Level { level_id } => heads_of(*level_id),
    Successor::Thread {
      level_id,
      thread_id,
    } => workflow
      .level(*level_id)
      .and_then(|level| level.threads.iter().find(|t| &t.thread_id == thread_id))
      .and_then(|thread| thread.head())
      .map(|step| vec![step.step_id.clone()])
      .unwrap_or_default(),
    Successor::Continue => level_id.checked_add(1).map(heads_of).unwrap_or_default(),
    Successor::End => Vec::new(),
  }
}
