//! Resource manager — central registry, pool orchestration, and dependency ordering.

use std::any::Any;
use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use dashmap::DashMap;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::guard::Guard;
use crate::pool::{Pool, PoolConfig};
use crate::resource::Resource;

// ---------------------------------------------------------------------------
// DependencyGraph
// ---------------------------------------------------------------------------

/// Dependency graph for managing resource initialization order.
///
/// Resources are identified by plain string keys (matching `Resource::id()`).
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// resource key -> list of dependencies (what this resource depends on)
    dependencies: HashMap<String, Vec<String>>,
    /// resource key -> list of dependents (what depends on this resource)
    dependents: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    #[must_use]
    pub fn new() -> Self {
        Self {
            dependencies: HashMap::new(),
            dependents: HashMap::new(),
        }
    }

    /// Add a dependency relationship: `resource` depends on `depends_on`
    ///
    /// # Errors
    /// Returns error if adding this dependency would create a cycle
    pub fn add_dependency(
        &mut self,
        resource: impl Into<String>,
        depends_on: impl Into<String>,
    ) -> Result<()> {
        let resource = resource.into();
        let depends_on = depends_on.into();

        // Don't allow self-dependency
        if resource == depends_on {
            return Err(Error::CircularDependency {
                cycle: format!("{resource} -> {resource}"),
            });
        }

        // Skip if this edge already exists
        let deps = self.dependencies.entry(resource.clone()).or_default();
        if deps.contains(&depends_on) {
            return Ok(());
        }

        // Add to dependencies map
        deps.push(depends_on.clone());

        // Add to dependents map
        self.dependents
            .entry(depends_on.clone())
            .or_default()
            .push(resource.clone());

        // Check for cycles after adding
        if let Some(cycle) = self.detect_cycle() {
            // Rollback the changes
            self.remove_dependency(&resource, &depends_on);
            return Err(Error::CircularDependency {
                cycle: cycle.join(" -> "),
            });
        }

        Ok(())
    }

    /// Remove a single dependency relationship.
    fn remove_dependency(&mut self, resource: &str, depends_on: &str) {
        if let Some(deps) = self.dependencies.get_mut(resource) {
            deps.retain(|d| d != depends_on);
        }
        if let Some(deps) = self.dependents.get_mut(depends_on) {
            deps.retain(|d| d != resource);
        }
    }

    /// Remove all dependency edges involving `resource` (both as source and target).
    ///
    /// Used when re-registering a resource to ensure a clean slate.
    pub fn remove_all_for(&mut self, resource: &str) {
        // Remove edges where `resource` is the dependent (resource -> X)
        if let Some(deps) = self.dependencies.remove(resource) {
            for dep in &deps {
                if let Some(rev) = self.dependents.get_mut(dep.as_str()) {
                    rev.retain(|d| d != resource);
                }
            }
        }
        // Remove edges where `resource` is the dependency (X -> resource)
        if let Some(dependents) = self.dependents.remove(resource) {
            for dep in &dependents {
                if let Some(fwd) = self.dependencies.get_mut(dep.as_str()) {
                    fwd.retain(|d| d != resource);
                }
            }
        }
    }

    /// Get all dependencies for a resource
    #[must_use]
    pub fn get_dependencies(&self, resource: &str) -> Vec<String> {
        self.dependencies.get(resource).cloned().unwrap_or_default()
    }

    /// Get all dependents of a resource (what depends on this resource)
    #[must_use]
    pub fn get_dependents(&self, resource: &str) -> Vec<String> {
        self.dependents.get(resource).cloned().unwrap_or_default()
    }

    /// Detect if there's a cycle in the dependency graph
    ///
    /// # Returns
    /// `Some(cycle_path)` if a cycle is detected, None otherwise
    #[must_use]
    pub fn detect_cycle(&self) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for node in self.dependencies.keys() {
            if !visited.contains(node.as_str())
                && let Some(cycle) =
                    self.detect_cycle_dfs(node, &mut visited, &mut rec_stack, &mut path)
            {
                return Some(cycle);
            }
        }

        None
    }

    /// DFS-based cycle detection helper
    fn detect_cycle_dfs(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        rec_stack: &mut HashSet<String>,
        path: &mut Vec<String>,
    ) -> Option<Vec<String>> {
        visited.insert(node.to_string());
        rec_stack.insert(node.to_string());
        path.push(node.to_string());

        let result = self.check_deps_for_cycle(node, visited, rec_stack, path);

        rec_stack.remove(node);
        path.pop();
        result
    }

    /// Check each dependency of `node` for cycles.
    fn check_deps_for_cycle(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        rec_stack: &mut HashSet<String>,
        path: &mut Vec<String>,
    ) -> Option<Vec<String>> {
        let deps = self.dependencies.get(node)?;
        for dep in deps {
            if !visited.contains(dep.as_str()) {
                let cycle = self.detect_cycle_dfs(dep, visited, rec_stack, path);
                if cycle.is_some() {
                    return cycle;
                }
            } else if rec_stack.contains(dep.as_str()) {
                let cycle_start = path
                    .iter()
                    .position(|p| p == dep)
                    .expect("Cycle detected but start node not found in path - this is a bug in cycle detection logic");
                return Some(path[cycle_start..].to_vec());
            }
        }
        None
    }

    /// Perform topological sort to get initialization order
    ///
    /// # Returns
    /// Ordered list of resource keys where dependencies come before dependents
    ///
    /// # Errors
    /// Returns error if there's a cycle in the graph
    pub fn topological_sort(&self) -> Result<Vec<String>> {
        // Use Kahn's algorithm
        let mut in_degree: HashMap<String, usize> = HashMap::new();
        let mut all_nodes = HashSet::new();

        // Collect all nodes and calculate in-degrees
        for (node, deps) in &self.dependencies {
            all_nodes.insert(node.clone());
            in_degree.entry(node.clone()).or_insert(0);

            for dep in deps {
                all_nodes.insert(dep.clone());
                in_degree.entry(dep.clone()).or_insert(0);
                *in_degree.entry(node.clone()).or_insert(0) += 1;
            }
        }

        // Find all nodes with no incoming edges
        let mut queue: VecDeque<String> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(node, _)| node.clone())
            .collect();

        // Add nodes that have no dependencies at all
        for node in &all_nodes {
            if !in_degree.contains_key(node) {
                queue.push_back(node.clone());
                in_degree.insert(node.clone(), 0);
            }
        }

        let mut sorted = Vec::new();

        while let Some(node) = queue.pop_front() {
            sorted.push(node.clone());

            let Some(deps) = self.dependents.get(&node) else {
                continue;
            };
            for dependent in deps {
                let Some(degree) = in_degree.get_mut(dependent) else {
                    continue;
                };
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(dependent.clone());
                }
            }
        }

        // If we haven't sorted all nodes, there's a cycle
        if sorted.len() != all_nodes.len()
            && let Some(cycle) = self.detect_cycle()
        {
            return Err(Error::CircularDependency {
                cycle: cycle.join(" -> "),
            });
        }

        Ok(sorted)
    }

    /// Get the initialization order for a specific resource and its dependencies
    pub fn get_init_order(&self, resource: &str) -> Result<Vec<String>> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();

        self.build_init_order(resource, &mut visited, &mut order)?;

        Ok(order)
    }

    /// Recursively build initialization order using DFS
    fn build_init_order(
        &self,
        resource: &str,
        visited: &mut HashSet<String>,
        order: &mut Vec<String>,
    ) -> Result<()> {
        if visited.contains(resource) {
            return Ok(());
        }

        visited.insert(resource.to_string());

        // Visit dependencies first
        if let Some(deps) = self.dependencies.get(resource) {
            for dep in deps {
                self.build_init_order(dep, visited, order)?;
            }
        }

        // Add this resource after its dependencies
        order.push(resource.to_string());

        Ok(())
    }

    /// Get all transitive dependencies of a resource
    #[must_use]
    pub fn get_all_dependencies(&self, resource: &str) -> HashSet<String> {
        let mut all_deps = HashSet::new();
        self.collect_dependencies(resource, &mut all_deps);
        all_deps
    }

    /// Recursively collect all dependencies
    fn collect_dependencies(&self, resource: &str, collected: &mut HashSet<String>) {
        if let Some(deps) = self.dependencies.get(resource) {
            for dep in deps {
                if collected.insert(dep.clone()) {
                    self.collect_dependencies(dep, collected);
                }
            }
        }
    }

    /// Check if resource A depends on resource B (directly or transitively)
    #[must_use]
    pub fn depends_on(&self, resource: &str, depends_on: &str) -> bool {
        let all_deps = self.get_all_dependencies(resource);
        all_deps.contains(depends_on)
    }
}

// ---------------------------------------------------------------------------
// Type-erased guard
// ---------------------------------------------------------------------------

/// Trait for type-erased resource guards.
///
/// Provides `&dyn Any` access to the inner instance while the concrete
/// `TypedGuard<R>` holds the real `Guard` that returns the instance
/// to the pool on drop.
pub trait AnyGuardTrait: Send {
    /// Access the inner instance as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Access the inner instance as `&mut dyn Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Type-erased guard returned by [`Manager::acquire`].
///
/// When dropped, the underlying `Guard` returns the instance
/// to the pool. Use [`as_any`](AnyGuardTrait::as_any) and
/// `downcast_ref` to access the concrete instance.
pub type AnyGuard = Box<dyn AnyGuardTrait>;

/// Concrete guard wrapping a typed `Guard`.
struct TypedGuard<R: Resource> {
    guard: Guard<R::Instance>,
}

impl<R: Resource> AnyGuardTrait for TypedGuard<R>
where
    R::Instance: Any,
{
    fn as_any(&self) -> &dyn Any {
        &*self.guard
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut *self.guard
    }
}

// ---------------------------------------------------------------------------
// Type-erased pool wrapper
// ---------------------------------------------------------------------------

/// Type-erased pool interface so the manager can store pools of different
/// resource types in a single map.
trait AnyPool: Send + Sync {
    /// Acquire a type-erased instance.
    fn acquire_any<'a>(
        &'a self,
        ctx: &'a Context,
    ) -> Pin<Box<dyn Future<Output = Result<AnyGuard>> + Send + 'a>>;

    /// Shut down the pool.
    fn shutdown(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Concrete adapter from `Pool<R>` to `AnyPool`.
struct TypedPool<R: Resource> {
    pool: Pool<R>,
}

impl<R: Resource> AnyPool for TypedPool<R>
where
    R::Instance: Any,
{
    fn acquire_any<'a>(
        &'a self,
        ctx: &'a Context,
    ) -> Pin<Box<dyn Future<Output = Result<AnyGuard>> + Send + 'a>> {
        Box::pin(async move {
            let guard = self.pool.acquire(ctx).await?;
            Ok(Box::new(TypedGuard::<R> { guard }) as AnyGuard)
        })
    }

    fn shutdown(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move { self.pool.shutdown().await })
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Central manager for resource pools and dependency ordering.
///
/// Pools are keyed by the resource's string ID (`Resource::id()`), allowing
/// multiple pools of the same resource type with different IDs.
#[derive(Default)]
pub struct Manager {
    /// Pools indexed by resource ID string.
    pools: DashMap<String, Arc<dyn AnyPool>>,
    /// Dependency graph for initialization ordering.
    deps: parking_lot::RwLock<DependencyGraph>,
}

impl Manager {
    /// Create a new empty resource manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource with its config and pool settings.
    ///
    /// The pool is keyed by `resource.id()`. Registering a second resource
    /// with the same ID replaces the previous one (including its dependencies).
    pub fn register<R: Resource>(
        &self,
        resource: R,
        config: R::Config,
        pool_config: PoolConfig,
    ) -> Result<()>
    where
        R::Instance: Any,
    {
        let id = resource.id().to_string();
        let new_deps: Vec<String> = resource
            .dependencies()
            .into_iter()
            .map(Into::into)
            .collect();

        // Create pool first — if this fails, nothing is modified.
        let pool = Pool::new(resource, config, pool_config)?;

        // Validate all new deps on a clone before touching the real graph.
        // This ensures the mutation is all-or-nothing.
        {
            let mut deps = self.deps.write();
            let mut candidate = deps.clone();
            candidate.remove_all_for(&id);
            for dep in &new_deps {
                candidate.add_dependency(&id, dep)?;
            }
            // Validation passed — swap in the new graph.
            *deps = candidate;
        }

        let any_pool: Arc<dyn AnyPool> = Arc::new(TypedPool { pool });
        self.pools.insert(id.clone(), any_pool);

        #[cfg(feature = "tracing")]
        tracing::debug!(resource_id = %id, "Registered resource");

        Ok(())
    }

    /// Acquire a resource instance by resource ID.
    ///
    /// Returns an [`AnyGuard`] that provides `&dyn Any` access to the
    /// instance. When the guard is dropped, the instance is returned to
    /// the pool.
    pub async fn acquire(&self, resource_id: &str, ctx: &Context) -> Result<AnyGuard> {
        // Clone the Arc to release the DashMap shard lock before awaiting.
        // Without this, the Ref<> from get() holds a read lock across the
        // potentially long-running acquire_any().await (up to acquire_timeout).
        let pool = self
            .pools
            .get(resource_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::Unavailable {
                resource_id: resource_id.to_string(),
                reason: "Resource not registered".to_string(),
                retryable: false,
            })?;

        pool.acquire_any(ctx).await.inspect(|_guard| {
            #[cfg(feature = "tracing")]
            tracing::debug!(resource_id, "Acquired resource instance");
        })
    }

    /// Get the initialization order based on dependency graph.
    pub fn initialization_order(&self) -> Result<Vec<String>> {
        self.deps.read().topological_sort()
    }

    /// Shut down all registered pools.
    pub async fn shutdown(&self) -> Result<()> {
        let pools: Vec<Arc<dyn AnyPool>> = self
            .pools
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        for pool in pools {
            pool.shutdown().await?;
        }

        self.pools.clear();
        Ok(())
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("pool_count", &self.pools.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
