//! Notification center
//!
//! Typed publish/subscribe keyed by (event kind, optional sender), owned by
//! the engine and passed explicitly to whoever needs it. Key principles:
//! - Key-value arguments (no order dependency)
//! - Registration system (only interested observers are called)
//! - Registration order is delivery order
//! - Deferred delivery for timers, drained once per frame

use crate::foundation::math::Vec3;
use crate::scene::EntityId;
use std::collections::HashMap;

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A node's local transform was mutated
    TransformChanged,
    /// An animation component reported completion
    AnimationFinished,
    /// The narrow phase confirmed and resolved a contact
    Collision,
    /// A posted timer fired
    Timer,
    /// Application-defined event
    Custom(u32),
}

/// Variant for type-safe event arguments
#[derive(Debug, Clone, PartialEq)]
pub enum EventArg {
    /// Another entity involved in the event
    Entity(EntityId),
    /// A vector quantity (normal, delta, position)
    Vector(Vec3),
    /// A scalar quantity (depth, duration)
    Scalar(f32),
    /// A boolean flag
    Flag(bool),
    /// Free-form label
    Text(String),
}

/// Event with kind, optional sender and key-value arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Kind of event
    pub kind: EventKind,
    /// Entity that emitted the event, if any
    pub sender: Option<EntityId>,
    args: HashMap<&'static str, EventArg>,
}

impl Event {
    /// Create a new event without a sender
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            sender: None,
            args: HashMap::new(),
        }
    }

    /// Create a new event emitted by `sender`
    pub fn from_sender(kind: EventKind, sender: EntityId) -> Self {
        Self {
            sender: Some(sender),
            ..Self::new(kind)
        }
    }

    /// Add an argument to the event (builder pattern)
    pub fn with_arg(mut self, key: &'static str, value: EventArg) -> Self {
        self.args.insert(key, value);
        self
    }

    /// Get an argument by key
    pub fn get_arg(&self, key: &str) -> Option<&EventArg> {
        self.args.get(key)
    }

    /// Get an entity argument if present
    pub fn get_entity(&self, key: &str) -> Option<EntityId> {
        match self.get_arg(key) {
            Some(EventArg::Entity(id)) => Some(*id),
            _ => None,
        }
    }

    /// Get a vector argument if present
    pub fn get_vector(&self, key: &str) -> Option<Vec3> {
        match self.get_arg(key) {
            Some(EventArg::Vector(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get a scalar argument if present
    pub fn get_scalar(&self, key: &str) -> Option<f32> {
        match self.get_arg(key) {
            Some(EventArg::Scalar(v)) => Some(*v),
            _ => None,
        }
    }
}

/// Receives notifications it registered for
pub trait Observer {
    /// Handle a delivered event
    fn on_notify(&mut self, event: &Event);
}

impl<F> Observer for F
where
    F: FnMut(&Event),
{
    fn on_notify(&mut self, event: &Event) {
        self(event);
    }
}

/// Opaque registration token returned by [`NotificationCenter::observe`]
///
/// Tokens are minted from a monotonic counter and never reused, so removing
/// one registration never invalidates another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverToken(u64);

struct Registration {
    token: ObserverToken,
    sender: Option<EntityId>,
    observer: Box<dyn Observer>,
}

/// Registry of observers plus a deferred (timer) queue
pub struct NotificationCenter {
    observers: HashMap<EventKind, Vec<Registration>>,
    next_token: u64,
    deferred: Vec<(f64, Event)>,
    current_time: f64,
}

impl NotificationCenter {
    /// Create a new empty notification center
    pub fn new() -> Self {
        Self {
            observers: HashMap::new(),
            next_token: 0,
            deferred: Vec::new(),
            current_time: 0.0,
        }
    }

    /// Register `observer` for `kind`, optionally filtered to one sender
    pub fn observe(
        &mut self,
        kind: EventKind,
        sender: Option<EntityId>,
        observer: impl Observer + 'static,
    ) -> ObserverToken {
        let token = ObserverToken(self.next_token);
        self.next_token += 1;
        self.observers.entry(kind).or_default().push(Registration {
            token,
            sender,
            observer: Box::new(observer),
        });
        token
    }

    /// Remove a registration; returns false if the token is unknown
    pub fn unobserve(&mut self, token: ObserverToken) -> bool {
        for registrations in self.observers.values_mut() {
            if let Some(position) = registrations.iter().position(|r| r.token == token) {
                // `remove`, not `swap_remove`: delivery order must survive
                registrations.remove(position);
                return true;
            }
        }
        false
    }

    /// Deliver `event` to every matching observer in registration order
    ///
    /// Returns how many observers were called. An event nobody listens to
    /// is a no-op.
    pub fn notify(&mut self, event: &Event) -> usize {
        let Some(registrations) = self.observers.get_mut(&event.kind) else {
            return 0;
        };
        let mut delivered = 0;
        for registration in registrations.iter_mut() {
            if registration.sender.is_none() || registration.sender == event.sender {
                registration.observer.on_notify(event);
                delivered += 1;
            }
        }
        delivered
    }

    /// Number of observers registered for `kind`
    pub fn observer_count(&self, kind: EventKind) -> usize {
        self.observers.get(&kind).map_or(0, Vec::len)
    }

    /// Queue `event` for delivery once `delay` seconds have elapsed
    pub fn post_after(&mut self, delay: f32, event: Event) {
        let due = self.current_time + f64::from(delay.max(0.0));
        self.deferred.push((due, event));
    }

    /// Number of deferred events not yet delivered
    pub fn pending_timers(&self) -> usize {
        self.deferred.len()
    }

    /// Advance the timer clock
    pub fn advance_time(&mut self, delta: f32) {
        self.current_time += f64::from(delta);
    }

    /// Deliver every deferred event whose time has come, in posting order
    pub fn dispatch_due(&mut self) -> usize {
        let now = self.current_time;
        let (due, pending): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.deferred).into_iter().partition(|(at, _)| *at <= now);
        self.deferred = pending;
        for (_, event) in &due {
            self.notify(event);
        }
        due.len()
    }

    /// Drop all queued timers (used by the deferred reset)
    pub fn clear_timers(&mut self) {
        self.deferred.clear();
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Box<dyn FnMut(&Event)>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let shared = Rc::clone(&log);
        let make = move |tag: &'static str| {
            let log = Rc::clone(&shared);
            Box::new(move |_: &Event| log.borrow_mut().push(tag)) as Box<dyn FnMut(&Event)>
        };
        (log, make)
    }

    #[test]
    fn test_notify_without_observers_is_noop() {
        let mut center = NotificationCenter::new();
        assert_eq!(center.notify(&Event::new(EventKind::Collision)), 0);
    }

    #[test]
    fn test_registration_order_is_delivery_order() {
        let mut center = NotificationCenter::new();
        let (log, make) = recorder();
        center.observe(EventKind::Timer, None, make("first"));
        center.observe(EventKind::Timer, None, make("second"));
        center.observe(EventKind::Collision, None, make("other-kind"));

        assert_eq!(center.notify(&Event::new(EventKind::Timer)), 2);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_sender_filter() {
        let mut center = NotificationCenter::new();
        let (log, make) = recorder();
        center.observe(EventKind::AnimationFinished, Some(EntityId::new(1)), make("one"));
        center.observe(EventKind::AnimationFinished, None, make("any"));

        center.notify(&Event::from_sender(EventKind::AnimationFinished, EntityId::new(2)));
        assert_eq!(*log.borrow(), vec!["any"]);

        log.borrow_mut().clear();
        center.notify(&Event::from_sender(EventKind::AnimationFinished, EntityId::new(1)));
        assert_eq!(*log.borrow(), vec!["one", "any"]);
    }

    #[test]
    fn test_tokens_survive_earlier_removal() {
        let mut center = NotificationCenter::new();
        let (log, make) = recorder();
        let a = center.observe(EventKind::Timer, None, make("a"));
        let b = center.observe(EventKind::Timer, None, make("b"));
        let c = center.observe(EventKind::Timer, None, make("c"));

        assert!(center.unobserve(a));
        // Removing `a` first must not shift `c` onto `b`'s identity.
        assert!(center.unobserve(c));
        assert!(!center.unobserve(a));

        center.notify(&Event::new(EventKind::Timer));
        assert_eq!(*log.borrow(), vec!["b"]);
        assert!(center.unobserve(b));
        assert_eq!(center.observer_count(EventKind::Timer), 0);
    }

    #[test]
    fn test_deferred_dispatch() {
        let mut center = NotificationCenter::new();
        let (log, make) = recorder();
        center.observe(EventKind::Timer, None, make("fired"));
        center.post_after(1.0, Event::new(EventKind::Timer));

        center.advance_time(0.5);
        assert_eq!(center.dispatch_due(), 0);
        assert_eq!(center.pending_timers(), 1);

        center.advance_time(0.5);
        assert_eq!(center.dispatch_due(), 1);
        assert_eq!(center.pending_timers(), 0);
        assert_eq!(*log.borrow(), vec!["fired"]);
    }

    #[test]
    fn test_event_args() {
        let event = Event::new(EventKind::Collision)
            .with_arg("other", EventArg::Entity(EntityId::new(4)))
            .with_arg("depth", EventArg::Scalar(0.25));
        assert_eq!(event.get_entity("other"), Some(EntityId::new(4)));
        assert_eq!(event.get_scalar("depth"), Some(0.25));
        assert_eq!(event.get_vector("depth"), None);
    }
}
