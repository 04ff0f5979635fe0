//! Lookup from body handle to grab behavior

use crate::config::GrabConfig;
use crate::session::GrabInteractable;
use kinesketch_physics::{ArticulationBackend, BodyHandle};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

/// All grabbable bodies in a scene
#[derive(Debug, Default)]
pub struct Interactables {
    items: FxHashMap<BodyHandle, GrabInteractable>,
}

impl Interactables {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `body` grabbable, replacing any previous registration
    ///
    /// A grab held through the previous registration is ended first so the
    /// body gets its pre-grab drives back.
    pub fn register(
        &mut self,
        backend: &mut dyn ArticulationBackend,
        body: BodyHandle,
        config: GrabConfig,
    ) -> &mut GrabInteractable {
        match self.items.entry(body) {
            Entry::Occupied(mut entry) => {
                if entry.get_mut().stop_grab(backend) {
                    tracing::debug!("Interactables: re-registering {:?} ended its grab", body);
                }
                entry.insert(GrabInteractable::new(backend, body, config));
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(GrabInteractable::new(backend, body, config)),
        }
    }

    /// Remove a registration, ending any grab in progress
    pub fn unregister(
        &mut self,
        backend: &mut dyn ArticulationBackend,
        body: BodyHandle,
    ) -> Option<GrabInteractable> {
        let mut interactable = self.items.remove(&body)?;
        interactable.stop_grab(backend);
        Some(interactable)
    }

    /// Whether `body` is registered
    pub fn contains(&self, body: BodyHandle) -> bool {
        self.items.contains_key(&body)
    }

    /// Look up a registration
    pub fn get(&self, body: BodyHandle) -> Option<&GrabInteractable> {
        self.items.get(&body)
    }

    /// Look up a registration mutably
    pub fn get_mut(&mut self, body: BodyHandle) -> Option<&mut GrabInteractable> {
        self.items.get_mut(&body)
    }

    /// Number of registrations
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of bodies currently held
    pub fn grabbed_count(&self) -> usize {
        self.items.values().filter(|i| i.is_grabbed()).count()
    }

    /// Iterate registrations (arbitrary order)
    pub fn iter(&self) -> impl Iterator<Item = &GrabInteractable> {
        self.items.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::GrabberId;
    use kinesketch_physics::{
        ArticulationBody, ArticulationDrive, DofLock, DofLocks, DriveAxis, DriveType, MemoryBackend, Pose,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_register_and_unregister() {
        let mut backend = MemoryBackend::new();
        let body = backend.add_body(ArticulationBody::root(Pose::IDENTITY)).unwrap();
        let mut registry = Interactables::new();

        registry
            .register(&mut backend, body, GrabConfig::default())
            .start_grab(&mut backend, GrabberId(0), &Pose::IDENTITY);
        assert_eq!(registry.grabbed_count(), 1);

        let removed = registry.unregister(&mut backend, body).unwrap();
        assert!(!removed.is_grabbed());
        assert!(registry.is_empty());
        assert!(registry.unregister(&mut backend, body).is_none());
    }

    #[test]
    fn test_reregister_while_grabbed_restores() {
        let mut backend = MemoryBackend::new();
        let base = backend
            .add_body(ArticulationBody::root(Pose::IDENTITY).immovable())
            .unwrap();
        let arm = backend
            .add_body(
                ArticulationBody::revolute(base, Pose::IDENTITY)
                    .with_locks(DofLocks::swing_y(DofLock::Free))
                    .with_x_drive(ArticulationDrive::target(0.3)),
            )
            .unwrap();
        let mut registry = Interactables::new();

        let ended = Arc::new(AtomicUsize::new(0));
        let counter = ended.clone();
        let interactable = registry.register(&mut backend, arm, GrabConfig::default());
        interactable.listeners_mut().on_ended(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(interactable.start_grab(&mut backend, GrabberId(0), &Pose::IDENTITY));
        assert_eq!(
            backend.drive(arm, DriveAxis::X).unwrap().drive_type,
            DriveType::Velocity
        );

        let replaced = registry.register(&mut backend, arm, GrabConfig::default());
        assert!(!replaced.is_grabbed());
        assert_eq!(registry.len(), 1);
        assert_eq!(ended.load(Ordering::SeqCst), 1);

        let drive = backend.drive(arm, DriveAxis::X).unwrap();
        assert_eq!(drive.drive_type, DriveType::Target);
        assert_eq!(drive.target, 0.3);
    }
}
