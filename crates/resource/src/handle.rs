//! Type-erased handle returned to callers outside the resource crate.

use std::any::Any;

use crate::manager::AnyGuard;

/// Owning handle to an acquired resource instance.
///
/// Wraps an [`AnyGuard`] so callers across crate boundaries (actions,
/// the engine) can hold a resource without depending on the concrete
/// `Resource` implementation. Access the instance via [`get`](Self::get) /
/// [`get_mut`](Self::get_mut); the instance returns to its pool when the
/// handle is dropped.
pub struct ResourceHandle {
    guard: AnyGuard,
}

impl ResourceHandle {
    /// Wrap an acquired [`AnyGuard`].
    #[must_use]
    pub fn new(guard: AnyGuard) -> Self {
        Self { guard }
    }

    /// Downcast the instance to a concrete type.
    #[must_use]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.guard.as_any().downcast_ref::<T>()
    }

    /// Downcast the instance to a concrete mutable type.
    #[must_use]
    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.guard.as_any_mut().downcast_mut::<T>()
    }
}

impl std::fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandle").finish_non_exhaustive()
    }
}
