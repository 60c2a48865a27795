// SPDX-License-Identifier: MIT OR Apache-2.0
//! Publish/subscribe bus with cancelable hooks.
//!
//! Listeners are called synchronously in registration order. A cancelable
//! hook vetoes the pending change by returning `false`; the trigger result
//! is `false` if any listener vetoed, but every listener still runs.
//!
//! Dispatch works on a snapshot of the listener list, so listeners may
//! subscribe, unsubscribe or re-enter the context they are handed.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::events::{EventKind, EventPayload};

/// Handle returned by `on`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub Uuid);

impl ListenerId {
    /// Create a new random listener ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener callback. Returning `false` vetoes on cancelable channels.
pub type Handler<C> = Rc<dyn Fn(&mut C, &EventPayload) -> bool>;

/// Listeners captured for one dispatch
pub struct Listeners<C> {
    kind: EventKind,
    handlers: Vec<Handler<C>>,
}

impl<C> Listeners<C> {
    /// Call every listener with `ctx`; `false` if any of them vetoed.
    ///
    /// A payload of the wrong shape for the channel is refused without
    /// calling anyone.
    pub fn dispatch(&self, ctx: &mut C, payload: &EventPayload) -> bool {
        if !self.kind.accepts(payload) {
            tracing::error!("Payload {:?} does not match channel {}", payload, self.kind);
            return false;
        }

        let mut allowed = true;
        for handler in &self.handlers {
            if !handler(ctx, payload) {
                allowed = false;
            }
        }

        if !allowed && !self.kind.is_cancelable() {
            // Vetoes only mean something on cancelable channels
            return true;
        }
        allowed
    }

    /// Number of captured listeners
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no listener was captured
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Event bus over the fixed channel catalog.
///
/// `C` is the context handed to listeners alongside the payload.
pub struct Emitter<C> {
    channels: IndexMap<EventKind, Vec<(ListenerId, Handler<C>)>>,
}

impl<C: 'static> Emitter<C> {
    /// Create a bus with an empty listener list per channel
    pub fn new() -> Self {
        Self {
            channels: EventKind::ALL.into_iter().map(|k| (k, Vec::new())).collect(),
        }
    }

    /// Subscribe an informational listener
    pub fn on(&mut self, kind: EventKind, f: impl Fn(&mut C, &EventPayload) + 'static) -> ListenerId {
        self.subscribe(
            kind,
            Rc::new(move |ctx: &mut C, payload: &EventPayload| {
                f(ctx, payload);
                true
            }),
        )
    }

    /// Subscribe a listener that may veto by returning `false`
    pub fn on_cancelable(
        &mut self,
        kind: EventKind,
        f: impl Fn(&mut C, &EventPayload) -> bool + 'static,
    ) -> ListenerId {
        self.subscribe(kind, Rc::new(f))
    }

    fn subscribe(&mut self, kind: EventKind, handler: Handler<C>) -> ListenerId {
        let id = ListenerId::new();
        self.channels.entry(kind).or_default().push((id, handler));
        id
    }

    /// Unsubscribe a listener. Returns false if it was not registered on `kind`.
    pub fn off(&mut self, kind: EventKind, id: ListenerId) -> bool {
        let Some(listeners) = self.channels.get_mut(&kind) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(listener, _)| *listener != id);
        listeners.len() != before
    }

    /// Remove every listener on `kind`
    pub fn off_all(&mut self, kind: EventKind) {
        if let Some(listeners) = self.channels.get_mut(&kind) {
            listeners.clear();
        }
    }

    /// Number of listeners on `kind`
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.channels.get(&kind).map_or(0, Vec::len)
    }

    /// Snapshot the listeners currently registered on `kind`
    pub fn listeners(&self, kind: EventKind) -> Listeners<C> {
        let handlers = self
            .channels
            .get(&kind)
            .map(|list| list.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default();
        Listeners { kind, handlers }
    }

    /// Dispatch `payload` on `kind` with a context that does not own this bus
    pub fn trigger(&self, ctx: &mut C, kind: EventKind, payload: &EventPayload) -> bool {
        self.listeners(kind).dispatch(ctx, payload)
    }
}

impl<C: 'static> Default for Emitter<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Emitter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (kind, listeners) in &self.channels {
            map.entry(&kind.name(), &listeners.len());
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIME: EventPayload = EventPayload::Time { time: 1.0 };

    #[test]
    fn test_listeners_run_in_registration_order() {
        let mut bus: Emitter<Vec<&'static str>> = Emitter::new();
        bus.on(EventKind::AfterSetTime, |log, _| log.push("first"));
        bus.on(EventKind::AfterSetTime, |log, _| log.push("second"));
        bus.on(EventKind::Play, |log, _| log.push("other channel"));

        let mut log = Vec::new();
        assert!(bus.trigger(&mut log, EventKind::AfterSetTime, &TIME));
        assert_eq!(log, vec!["first", "second"]);
    }

    #[test]
    fn test_veto_still_runs_every_listener() {
        let mut bus: Emitter<u32> = Emitter::new();
        bus.on_cancelable(EventKind::BeforeSetTime, |calls, _| {
            *calls += 1;
            false
        });
        bus.on_cancelable(EventKind::BeforeSetTime, |calls, _| {
            *calls += 1;
            true
        });

        let mut calls = 0;
        assert!(!bus.trigger(&mut calls, EventKind::BeforeSetTime, &TIME));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_veto_ignored_on_informational_channel() {
        let mut bus: Emitter<()> = Emitter::new();
        bus.on_cancelable(EventKind::AfterSetTime, |_, _| false);
        assert!(bus.trigger(&mut (), EventKind::AfterSetTime, &TIME));
    }

    #[test]
    fn test_empty_channel_allows() {
        let bus: Emitter<()> = Emitter::new();
        assert!(bus.trigger(&mut (), EventKind::BeforeSetPlayRate, &EventPayload::Rate { rate: 2.0 }));
    }

    #[test]
    fn test_off_removes_only_that_listener() {
        let mut bus: Emitter<Vec<u8>> = Emitter::new();
        let first = bus.on(EventKind::Ended, |log, _| log.push(1));
        bus.on(EventKind::Ended, |log, _| log.push(2));
        assert_eq!(bus.listener_count(EventKind::Ended), 2);

        assert!(bus.off(EventKind::Ended, first));
        assert!(!bus.off(EventKind::Ended, first));
        assert!(!bus.off(EventKind::Play, ListenerId::new()));

        let mut log = Vec::new();
        bus.trigger(&mut log, EventKind::Ended, &EventPayload::State);
        assert_eq!(log, vec![2]);

        bus.off_all(EventKind::Ended);
        assert_eq!(bus.listener_count(EventKind::Ended), 0);
    }

    #[test]
    fn test_mismatched_payload_is_refused() {
        let mut bus: Emitter<u32> = Emitter::new();
        bus.on(EventKind::Play, |calls, _| *calls += 1);

        let mut calls = 0;
        assert!(!bus.trigger(&mut calls, EventKind::Play, &TIME));
        assert_eq!(calls, 0);

        assert!(bus.trigger(&mut calls, EventKind::Play, &EventPayload::State));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_subscriptions() {
        let mut bus: Emitter<Vec<u8>> = Emitter::new();
        bus.on(EventKind::Paused, |log, _| log.push(1));
        let snapshot = bus.listeners(EventKind::Paused);
        bus.on(EventKind::Paused, |log, _| log.push(2));

        let mut log = Vec::new();
        snapshot.dispatch(&mut log, &EventPayload::State);
        assert_eq!(log, vec![1]);
        assert_eq!(snapshot.len(), 1);
    }
}
