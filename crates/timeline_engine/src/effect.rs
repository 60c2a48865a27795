// SPDX-License-Identifier: MIT OR Apache-2.0
//! Effects: the lifecycle handlers actions are bound to.
//!
//! The engine only decides *when* a hook runs. What a hook does (drive a
//! renderer, start an audio clip, ...) belongs to the [`EffectSource`]
//! implementation supplied by the caller.

use std::borrow::Borrow;
use std::fmt;
use std::rc::Rc;

use crate::action::TimelineAction;
use crate::engine::TimelineEngine;

/// Identifier of an effect
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(pub String);

impl EffectId {
    /// Create an effect ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EffectId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EffectId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for EffectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Lifecycle hook of an effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleHook {
    /// Playback started while the action is active
    Start,
    /// The action became active
    Enter,
    /// Per-frame update while active
    Update,
    /// The action stopped being active
    Leave,
    /// Playback paused while the action is active
    Stop,
}

impl LifecycleHook {
    /// All hooks
    pub const ALL: [LifecycleHook; 5] = [
        LifecycleHook::Start,
        LifecycleHook::Enter,
        LifecycleHook::Update,
        LifecycleHook::Leave,
        LifecycleHook::Stop,
    ];

    /// Get the hook name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Enter => "enter",
            Self::Update => "update",
            Self::Leave => "leave",
            Self::Stop => "stop",
        }
    }
}

/// Arguments passed to every lifecycle hook
pub struct EffectContext<'a> {
    /// Time the hook refers to
    pub time: f64,
    /// Whether the engine is playing
    pub is_playing: bool,
    /// The action being dispatched
    pub action: &'a TimelineAction,
    /// The effect the action is bound to
    pub effect: &'a TimelineEffect,
    /// The engine dispatching the hook
    pub engine: &'a TimelineEngine,
}

/// Lifecycle capability of an effect.
///
/// Every hook defaults to a no-op. Implementors that hold state use interior
/// mutability since hooks run while the engine is borrowed.
pub trait EffectSource {
    /// Whether `hook` does anything. The engine skips hooks reported absent.
    fn handles(&self, hook: LifecycleHook) -> bool {
        let _ = hook;
        true
    }

    /// Playback started while the action is active
    fn start(&self, ctx: &EffectContext<'_>) {
        let _ = ctx;
    }

    /// The action became active
    fn enter(&self, ctx: &EffectContext<'_>) {
        let _ = ctx;
    }

    /// Per-frame update
    fn update(&self, ctx: &EffectContext<'_>) {
        let _ = ctx;
    }

    /// The action stopped being active
    fn leave(&self, ctx: &EffectContext<'_>) {
        let _ = ctx;
    }

    /// Playback paused while the action is active
    fn stop(&self, ctx: &EffectContext<'_>) {
        let _ = ctx;
    }
}

/// Invoke the hook method matching `hook`
pub(crate) fn invoke(source: &dyn EffectSource, hook: LifecycleHook, ctx: &EffectContext<'_>) {
    match hook {
        LifecycleHook::Start => source.start(ctx),
        LifecycleHook::Enter => source.enter(ctx),
        LifecycleHook::Update => source.update(ctx),
        LifecycleHook::Leave => source.leave(ctx),
        LifecycleHook::Stop => source.stop(ctx),
    }
}

type HookFn = Box<dyn Fn(&EffectContext<'_>)>;

/// Effect source assembled from optional closures
#[derive(Default)]
pub struct CallbackSource {
    start: Option<HookFn>,
    enter: Option<HookFn>,
    update: Option<HookFn>,
    leave: Option<HookFn>,
    stop: Option<HookFn>,
}

impl CallbackSource {
    /// Create a source with no hooks
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `start` hook
    pub fn on_start(mut self, f: impl Fn(&EffectContext<'_>) + 'static) -> Self {
        self.start = Some(Box::new(f));
        self
    }

    /// Set the `enter` hook
    pub fn on_enter(mut self, f: impl Fn(&EffectContext<'_>) + 'static) -> Self {
        self.enter = Some(Box::new(f));
        self
    }

    /// Set the `update` hook
    pub fn on_update(mut self, f: impl Fn(&EffectContext<'_>) + 'static) -> Self {
        self.update = Some(Box::new(f));
        self
    }

    /// Set the `leave` hook
    pub fn on_leave(mut self, f: impl Fn(&EffectContext<'_>) + 'static) -> Self {
        self.leave = Some(Box::new(f));
        self
    }

    /// Set the `stop` hook
    pub fn on_stop(mut self, f: impl Fn(&EffectContext<'_>) + 'static) -> Self {
        self.stop = Some(Box::new(f));
        self
    }

    fn hook(&self, hook: LifecycleHook) -> Option<&HookFn> {
        match hook {
            LifecycleHook::Start => self.start.as_ref(),
            LifecycleHook::Enter => self.enter.as_ref(),
            LifecycleHook::Update => self.update.as_ref(),
            LifecycleHook::Leave => self.leave.as_ref(),
            LifecycleHook::Stop => self.stop.as_ref(),
        }
    }

    fn call(&self, hook: LifecycleHook, ctx: &EffectContext<'_>) {
        if let Some(f) = self.hook(hook) {
            f(ctx);
        }
    }
}

impl EffectSource for CallbackSource {
    fn handles(&self, hook: LifecycleHook) -> bool {
        self.hook(hook).is_some()
    }

    fn start(&self, ctx: &EffectContext<'_>) {
        self.call(LifecycleHook::Start, ctx);
    }

    fn enter(&self, ctx: &EffectContext<'_>) {
        self.call(LifecycleHook::Enter, ctx);
    }

    fn update(&self, ctx: &EffectContext<'_>) {
        self.call(LifecycleHook::Update, ctx);
    }

    fn leave(&self, ctx: &EffectContext<'_>) {
        self.call(LifecycleHook::Leave, ctx);
    }

    fn stop(&self, ctx: &EffectContext<'_>) {
        self.call(LifecycleHook::Stop, ctx);
    }
}

impl fmt::Debug for CallbackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks: Vec<_> = LifecycleHook::ALL
            .into_iter()
            .filter(|h| self.handles(*h))
            .map(|h| h.name())
            .collect();
        f.debug_struct("CallbackSource").field("hooks", &hooks).finish()
    }
}

/// A named effect that actions refer to by ID
#[derive(Clone)]
pub struct TimelineEffect {
    /// Effect ID
    pub id: EffectId,
    /// Display name
    pub name: Option<String>,
    /// Lifecycle handlers; `None` means actions using this effect get no calls
    pub source: Option<Rc<dyn EffectSource>>,
}

impl TimelineEffect {
    /// Create an effect without a source
    pub fn new(id: impl Into<EffectId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            source: None,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the lifecycle handlers
    pub fn with_source(mut self, source: impl EffectSource + 'static) -> Self {
        self.source = Some(Rc::new(source));
        self
    }

    /// Share an existing source
    pub fn with_shared_source(mut self, source: Rc<dyn EffectSource>) -> Self {
        self.source = Some(source);
        self
    }
}

impl fmt::Debug for TimelineEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineEffect")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_source_reports_present_hooks() {
        let source = CallbackSource::new().on_enter(|_| {}).on_leave(|_| {});
        assert!(source.handles(LifecycleHook::Enter));
        assert!(source.handles(LifecycleHook::Leave));
        assert!(!source.handles(LifecycleHook::Start));
        assert!(!source.handles(LifecycleHook::Update));
        assert!(!source.handles(LifecycleHook::Stop));
    }

    #[test]
    fn test_trait_defaults_handle_everything() {
        struct Silent;
        impl EffectSource for Silent {}

        for hook in LifecycleHook::ALL {
            assert!(Silent.handles(hook));
        }
    }

    #[test]
    fn test_effect_builder() {
        let effect = TimelineEffect::new("fx")
            .with_name("Flash")
            .with_source(CallbackSource::new());
        assert_eq!(effect.id.as_str(), "fx");
        assert_eq!(effect.name.as_deref(), Some("Flash"));
        assert!(effect.source.is_some());
        assert!(TimelineEffect::new("bare").source.is_none());
    }
}
