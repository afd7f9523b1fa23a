use std::collections::HashMap;
use std::fmt;

use crate::queue::{DrainPolicy, DrainReport, FrozenQueue, OpResult, Operation, OperationQueue};
use crate::refs::ReferenceTable;
use crate::surface::Surface;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HostError {
    #[error("surface '{0}' is not mounted")]
    UnknownSurface(SurfaceId),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub String);

impl SurfaceId {
    pub fn new(id: impl Into<String>) -> Self {
        SurfaceId(id.into())
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct Mounted<S> {
    surface: S,
    refs: ReferenceTable,
}

/// Owns mounted surfaces together with their reference tables.
///
/// Draining needs `&mut self`, so a surface never sees two queues at once.
pub struct SurfaceHost<S> {
    surfaces: HashMap<SurfaceId, Mounted<S>>,
    policy: DrainPolicy,
}

impl<S: Surface> SurfaceHost<S> {
    pub fn new(policy: DrainPolicy) -> Self {
        Self {
            surfaces: HashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> DrainPolicy {
        self.policy
    }

    /// Mounts `surface` with an empty reference table; an existing surface
    /// with the same id is retired and returned.
    pub fn mount(&mut self, id: SurfaceId, surface: S) -> Option<S> {
        tracing::debug!(surface = %id, "surface mounted");
        self.surfaces
            .insert(
                id,
                Mounted {
                    surface,
                    refs: ReferenceTable::new(),
                },
            )
            .map(|previous| previous.surface)
    }

    /// Tears the surface down along with every reference it held.
    pub fn retire(&mut self, id: &SurfaceId) -> Option<S> {
        let mounted = self.surfaces.remove(id)?;
        tracing::debug!(
            surface = %id,
            references = mounted.refs.len(),
            "surface retired"
        );
        Some(mounted.surface)
    }

    pub fn is_mounted(&self, id: &SurfaceId) -> bool {
        self.surfaces.contains_key(id)
    }

    pub fn surface(&self, id: &SurfaceId) -> Option<&S> {
        self.surfaces.get(id).map(|mounted| &mounted.surface)
    }

    pub fn surface_mut(&mut self, id: &SurfaceId) -> Option<&mut S> {
        self.surfaces.get_mut(id).map(|mounted| &mut mounted.surface)
    }

    pub fn refs(&self, id: &SurfaceId) -> Option<&ReferenceTable> {
        self.surfaces.get(id).map(|mounted| &mounted.refs)
    }

    /// Drains a frozen queue against the surface mounted under `id`.
    pub fn drain(&mut self, id: &SurfaceId, queue: FrozenQueue) -> Result<DrainReport, HostError> {
        let policy = self.policy;
        let mounted = self
            .surfaces
            .get_mut(id)
            .ok_or_else(|| HostError::UnknownSurface(id.clone()))?;
        Ok(queue.drain(&mut mounted.surface, &mut mounted.refs, policy))
    }

    /// Runs `ops` in order; one result per submitted operation.
    pub fn submit(
        &mut self,
        id: &SurfaceId,
        ops: Vec<Operation>,
    ) -> Result<Vec<OpResult>, HostError> {
        let queue: OperationQueue = ops.into_iter().collect();
        self.drain(id, queue.freeze())
            .map(DrainReport::into_results)
    }
}
