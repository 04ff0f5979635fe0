//! Grab start/end notifications

use kinesketch_physics::BodyHandle;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Handle returned when subscribing, used to unsubscribe
    pub struct ListenerId;
}

/// Identifies the controller holding a body
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GrabberId(pub u32);

/// Event kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrabEventKind {
    /// A grab began
    Started,
    /// A grab ended
    Ended,
}

/// Emitted once per grab start and once per grab end
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrabEvent {
    /// Start or end
    pub kind: GrabEventKind,
    /// Grabbed body
    pub body: BodyHandle,
    /// Controller that held it
    pub grabber: GrabberId,
}

type Callback = Box<dyn FnMut(&GrabEvent) + Send + Sync>;

/// Subscribers for one interactable's grab events
#[derive(Default)]
pub struct GrabListeners {
    listeners: SlotMap<ListenerId, (GrabEventKind, Callback)>,
    /// Subscription order; slot order changes once keys are reused
    order: SmallVec<[ListenerId; 4]>,
}

impl GrabListeners {
    /// Create an empty listener set
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to grab starts
    pub fn on_started<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&GrabEvent) + Send + Sync + 'static,
    {
        self.subscribe(GrabEventKind::Started, Box::new(callback))
    }

    /// Subscribe to grab ends
    pub fn on_ended<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&GrabEvent) + Send + Sync + 'static,
    {
        self.subscribe(GrabEventKind::Ended, Box::new(callback))
    }

    fn subscribe(&mut self, kind: GrabEventKind, callback: Callback) -> ListenerId {
        let id = self.listeners.insert((kind, callback));
        self.order.push(id);
        id
    }

    /// Unsubscribe; returns whether the listener existed
    pub fn remove(&mut self, id: ListenerId) -> bool {
        if self.listeners.remove(id).is_none() {
            return false;
        }
        self.order.retain(|other| *other != id);
        true
    }

    /// Number of subscribers
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether there are no subscribers
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver an event to every subscriber of its kind, in subscription order
    pub fn emit(&mut self, event: &GrabEvent) {
        for id in &self.order {
            if let Some((kind, callback)) = self.listeners.get_mut(*id) {
                if *kind == event.kind {
                    callback(event);
                }
            }
        }
    }
}

impl std::fmt::Debug for GrabListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrabListeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn event(kind: GrabEventKind) -> GrabEvent {
        GrabEvent {
            kind,
            body: BodyHandle::from(KeyData::from_ffi(1)),
            grabber: GrabberId(0),
        }
    }

    #[test]
    fn test_emit_by_kind() {
        let started = Arc::new(AtomicUsize::new(0));
        let ended = Arc::new(AtomicUsize::new(0));
        let mut listeners = GrabListeners::new();

        let s = started.clone();
        listeners.on_started(move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });
        let e = ended.clone();
        let id = listeners.on_ended(move |_| {
            e.fetch_add(1, Ordering::SeqCst);
        });

        listeners.emit(&event(GrabEventKind::Started));
        listeners.emit(&event(GrabEventKind::Ended));
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(ended.load(Ordering::SeqCst), 1);

        assert!(listeners.remove(id));
        assert!(!listeners.remove(id));
        listeners.emit(&event(GrabEventKind::Ended));
        assert_eq!(ended.load(Ordering::SeqCst), 1);
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn test_emit_in_subscription_order_after_remove() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = GrabListeners::new();

        let record = |name: &'static str| {
            let calls = calls.clone();
            move |_: &GrabEvent| calls.lock().unwrap().push(name)
        };
        let first = listeners.on_started(record("first"));
        listeners.on_started(record("second"));
        listeners.remove(first);
        // reuses the freed slot
        listeners.on_started(record("third"));

        listeners.emit(&event(GrabEventKind::Started));
        assert_eq!(*calls.lock().unwrap(), vec!["second", "third"]);
    }
}
