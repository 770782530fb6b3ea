//! Assembly dependency graph with cycle detection and topological ordering.
//!
//! The graph tracks which loaded assembly depends on which, keyed by
//! [`AssemblyIdentity`]. It backs the acyclicity invariant of a
//! [`crate::LoadContext`]: an edge that would close a cycle is detected before the
//! depending assembly becomes visible to other threads.

use std::collections::{hash_map::Entry, HashMap, HashSet, VecDeque};
use std::sync::RwLock;

use dashmap::DashMap;

use crate::{metadata::identity::AssemblyIdentity, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Color {
    White, // Unvisited
    Gray,  // On the current DFS path
    Black, // Completely processed
}

/// Thread-safe dependency graph between assemblies.
///
/// # Architecture
///
/// - **Dependencies**: Forward edges (A depends on B)
/// - **Dependents**: Reverse edges (B is depended on by A)
/// - **Cached order**: The last computed topological order, invalidated on every change
///
/// Every assembly added to the graph is a node, even if it has no edges, so the loading
/// order also covers leaf assemblies.
///
/// # Examples
///
/// ```rust
/// use assemblymeta::metadata::dependencies::AssemblyDependencyGraph;
/// use assemblymeta::metadata::identity::AssemblyIdentity;
///
/// let core = AssemblyIdentity::parse("Core, Version=1.0.0.0")?;
/// let app = AssemblyIdentity::parse("App, Version=1.0.0.0")?;
///
/// let graph = AssemblyDependencyGraph::new();
/// graph.add_dependency(app.clone(), core.clone());
///
/// assert!(graph.find_cycles().is_none());
/// assert_eq!(graph.topological_order()?, vec![core, app]);
/// # Ok::<(), assemblymeta::Error>(())
/// ```
///
/// # Thread Safety
///
/// All methods take `&self`. Edges live in [`DashMap`]s; the cached order sits behind a
/// [`RwLock`] whose poisoning surfaces as [`Error::LockError`].
pub struct AssemblyDependencyGraph {
    /// Forward mapping: assembly -> assemblies it depends on
    dependencies: DashMap<AssemblyIdentity, Vec<AssemblyIdentity>>,

    /// Reverse mapping: assembly -> assemblies depending on it
    dependents: DashMap<AssemblyIdentity, Vec<AssemblyIdentity>>,

    /// Cached topological ordering, `None` when it has to be recomputed
    cached_topology: RwLock<Option<Vec<AssemblyIdentity>>>,
}

impl AssemblyDependencyGraph {
    /// Create a new empty dependency graph
    #[must_use]
    pub fn new() -> Self {
        Self {
            dependencies: DashMap::new(),
            dependents: DashMap::new(),
            cached_topology: RwLock::new(None),
        }
    }

    /// Add an assembly without any dependencies. Adding a known assembly is a no-op.
    pub fn add_assembly(&self, identity: AssemblyIdentity) {
        if let dashmap::mapref::entry::Entry::Vacant(entry) = self.dependencies.entry(identity) {
            entry.insert(Vec::new());
            self.invalidate_caches();
        }
    }

    /// Record that `source` depends on `target`.
    ///
    /// Both assemblies become nodes of the graph. Recording an edge twice is a no-op.
    /// No cycle check happens here, see [`AssemblyDependencyGraph::find_cycles`].
    pub fn add_dependency(&self, source: AssemblyIdentity, target: AssemblyIdentity) {
        self.add_assembly(target.clone());

        {
            let mut forward = self.dependencies.entry(source.clone()).or_default();
            if forward.contains(&target) {
                return;
            }
            forward.push(target.clone());
        }

        self.dependents.entry(target).or_default().push(source);
        self.invalidate_caches();
    }

    /// Remove an assembly together with all edges from and to it.
    ///
    /// Returns `false` if the assembly was not part of the graph.
    pub fn remove_assembly(&self, identity: &AssemblyIdentity) -> bool {
        let Some((_, targets)) = self.dependencies.remove(identity) else {
            return false;
        };

        for target in &targets {
            if let Some(mut sources) = self.dependents.get_mut(target) {
                sources.retain(|source| source != identity);
            }
        }

        if let Some((_, sources)) = self.dependents.remove(identity) {
            for source in &sources {
                if let Some(mut forward) = self.dependencies.get_mut(source) {
                    forward.retain(|target| target != identity);
                }
            }
        }

        self.invalidate_caches();
        true
    }

    /// Assemblies `assembly` directly depends on
    #[must_use]
    pub fn get_dependencies(&self, assembly: &AssemblyIdentity) -> Vec<AssemblyIdentity> {
        self.dependencies
            .get(assembly)
            .map(|deps| deps.clone())
            .unwrap_or_default()
    }

    /// Assemblies directly depending on `assembly`
    #[must_use]
    pub fn get_dependents(&self, assembly: &AssemblyIdentity) -> Vec<AssemblyIdentity> {
        self.dependents
            .get(assembly)
            .map(|deps| deps.clone())
            .unwrap_or_default()
    }

    /// Whether `identity` is a node of the graph
    #[must_use]
    pub fn contains_assembly(&self, identity: &AssemblyIdentity) -> bool {
        self.dependencies.contains_key(identity)
    }

    /// All assemblies tracked in the graph, in no particular order
    #[must_use]
    pub fn all_assemblies(&self) -> Vec<AssemblyIdentity> {
        self.dependencies
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Number of assemblies in the graph
    #[must_use]
    pub fn assembly_count(&self) -> usize {
        self.dependencies.len()
    }

    /// Number of dependency edges in the graph
    #[must_use]
    pub fn dependency_count(&self) -> usize {
        self.dependencies
            .iter()
            .map(|entry| entry.value().len())
            .sum()
    }

    /// Whether the graph has no assemblies
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Remove all assemblies and edges
    pub fn clear(&self) {
        self.dependencies.clear();
        self.dependents.clear();
        self.invalidate_caches();
    }

    /// Whether `to` can be reached from `from` by following one or more dependency edges
    #[must_use]
    pub fn reaches(&self, from: &AssemblyIdentity, to: &AssemblyIdentity) -> bool {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<AssemblyIdentity> = self.get_dependencies(from).into();

        while let Some(current) = queue.pop_front() {
            if &current == to {
                return true;
            }

            if visited.insert(current.clone()) {
                queue.extend(self.get_dependencies(&current));
            }
        }

        false
    }

    /// Detect circular dependencies.
    ///
    /// Uses a depth-first search with three-color marking; an edge to a node on the
    /// current path closes a cycle. The returned path starts and ends with the same
    /// assembly.
    #[must_use]
    pub fn find_cycles(&self) -> Option<Vec<AssemblyIdentity>> {
        let mut colors: HashMap<AssemblyIdentity, Color> = self
            .all_assemblies()
            .into_iter()
            .map(|node| (node, Color::White))
            .collect();
        let mut path: Vec<AssemblyIdentity> = Vec::new();

        for node in self.sorted_assemblies() {
            if colors.get(&node) == Some(&Color::White) {
                if let Some(cycle) = self.dfs_visit(&node, &mut colors, &mut path) {
                    return Some(cycle);
                }
            }
        }

        None
    }

    /// Order all assemblies so that every assembly comes after its dependencies.
    ///
    /// Uses Kahn's algorithm; ties are broken by display name so the order is stable.
    /// The result is cached until the graph changes.
    ///
    /// # Errors
    /// Returns [`Error::CircularDependency`] if the graph contains a cycle, and
    /// [`Error::LockError`] if the cache lock is poisoned.
    pub fn topological_order(&self) -> Result<Vec<AssemblyIdentity>> {
        {
            let cached = self.cached_topology.read().map_err(|_| Error::LockError)?;
            if let Some(order) = cached.as_ref() {
                return Ok(order.clone());
            }
        }

        let nodes = self.sorted_assemblies();
        let mut pending: HashMap<AssemblyIdentity, usize> = nodes
            .iter()
            .map(|node| (node.clone(), self.get_dependencies(node).len()))
            .collect();

        let mut ready: VecDeque<AssemblyIdentity> = nodes
            .iter()
            .filter(|node| pending.get(*node) == Some(&0))
            .cloned()
            .collect();

        let mut order = Vec::with_capacity(nodes.len());
        while let Some(node) = ready.pop_front() {
            let mut unlocked = Vec::new();
            for dependent in self.get_dependents(&node) {
                if let Entry::Occupied(mut remaining) = pending.entry(dependent.clone()) {
                    *remaining.get_mut() -= 1;
                    if *remaining.get() == 0 {
                        unlocked.push(dependent);
                    }
                }
            }
            unlocked.sort_by_key(AssemblyIdentity::display_name);
            ready.extend(unlocked);
            order.push(node);
        }

        if order.len() != nodes.len() {
            let cycle = self
                .find_cycles()
                .map(|cycle| format_cycle(&cycle))
                .unwrap_or_default();
            return Err(Error::CircularDependency(cycle));
        }

        let mut cache = self.cached_topology.write().map_err(|_| Error::LockError)?;
        *cache = Some(order.clone());

        Ok(order)
    }

    fn sorted_assemblies(&self) -> Vec<AssemblyIdentity> {
        let mut nodes = self.all_assemblies();
        nodes.sort_by_key(AssemblyIdentity::display_name);
        nodes
    }

    fn invalidate_caches(&self) {
        // Best effort, a poisoned cache is reported by the next read
        if let Ok(mut cache) = self.cached_topology.write() {
            *cache = None;
        }
    }

    fn dfs_visit(
        &self,
        node: &AssemblyIdentity,
        colors: &mut HashMap<AssemblyIdentity, Color>,
        path: &mut Vec<AssemblyIdentity>,
    ) -> Option<Vec<AssemblyIdentity>> {
        colors.insert(node.clone(), Color::Gray);
        path.push(node.clone());

        // Cloned so no shard lock is held across the recursion
        for target in self.get_dependencies(node) {
            match colors.get(&target).copied().unwrap_or(Color::White) {
                Color::Gray => {
                    if let Some(start) = path.iter().position(|id| *id == target) {
                        let mut cycle = path[start..].to_vec();
                        cycle.push(target);
                        return Some(cycle);
                    }
                }
                Color::White => {
                    if let Some(cycle) = self.dfs_visit(&target, colors, path) {
                        return Some(cycle);
                    }
                }
                Color::Black => {}
            }
        }

        colors.insert(node.clone(), Color::Black);
        path.pop();
        None
    }
}

impl Default for AssemblyDependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a cycle path as `A -> B -> A`
fn format_cycle(cycle: &[AssemblyIdentity]) -> String {
    cycle
        .iter()
        .map(|identity| identity.name.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}
