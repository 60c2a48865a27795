// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline playback engine.
//!
//! The engine keeps actions sorted by start time and a list of the actions
//! whose range contains the current time (the active set). Every time change
//! reconciles the active set in two passes:
//!
//! - leave: walk the active set and drop actions no longer in range
//! - enter: walk the sorted actions from the scan cursor, activating every
//!   action in range, until the first action that starts in the future
//!
//! Leave hooks therefore always run before enter hooks within one change.
//! The scan cursor restarts at 0 on every time change.
//!
//! Playback is driven by a [`FrameClock`]: the engine requests one frame at a
//! time and the host hands it back through [`TimelineEngine::on_frame`].

use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;

use crate::action::{ActionId, TimelineAction, TimelineRow};
use crate::clock::{FrameClock, FrameHandle, RealtimeClock};
use crate::config::EngineConfig;
use crate::effect::{self, EffectContext, EffectId, LifecycleHook, TimelineEffect};
use crate::emitter::{Emitter, ListenerId};
use crate::error::{validate_play_rate, EngineError};
use crate::events::{EventKind, EventPayload};

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    /// Clock is stopped
    #[default]
    Paused,
    /// Clock advances on every frame
    Playing,
}

/// Options for [`TimelineEngine::play`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayOptions {
    /// Stop when the clock reaches this time. Takes priority over `auto_end`.
    pub to_time: Option<f64>,
    /// Stop once every action has been passed and none is active
    pub auto_end: bool,
}

impl PlayOptions {
    /// Play until paused
    pub fn new() -> Self {
        Self::default()
    }

    /// Play until `time`
    pub fn until(time: f64) -> Self {
        Self {
            to_time: Some(time),
            auto_end: false,
        }
    }

    /// Stop after the last action
    pub fn auto_end(mut self, auto_end: bool) -> Self {
        self.auto_end = auto_end;
        self
    }
}

/// Timeline player. Runs independently from any editor.
pub struct TimelineEngine {
    config: EngineConfig,
    events: Emitter<TimelineEngine>,
    clock: Box<dyn FrameClock>,
    /// Outstanding frame request, present exactly while playing
    pending_frame: Option<FrameHandle>,
    /// Timestamp of the previous frame
    prev_timestamp: Option<f64>,
    run: PlayOptions,
    play_rate: f64,
    current_time: f64,
    play_state: PlayState,
    effects: IndexMap<EffectId, TimelineEffect>,
    actions: IndexMap<ActionId, TimelineAction>,
    /// Action IDs ordered by start time
    sorted_ids: Vec<ActionId>,
    /// Scan cursor into `sorted_ids`
    next: usize,
    /// Actions whose range contains the current time, in entry order
    active_ids: Vec<ActionId>,
}

impl TimelineEngine {
    /// Create an engine driven by a 60 Hz real-time clock
    pub fn new() -> Self {
        Self::with_clock(RealtimeClock::default())
    }

    /// Create an engine driven by a real-time clock refreshing at
    /// `config.frame_interval_ms`
    pub fn from_config(config: EngineConfig) -> Result<Self, EngineError> {
        let clock = RealtimeClock::new(config.frame_interval_ms);
        Self::with_config(config, clock)
    }

    /// Create an engine driven by `clock`
    pub fn with_clock(clock: impl FrameClock + 'static) -> Self {
        Self::build(EngineConfig::default(), Box::new(clock))
    }

    /// Create an engine with a validated config
    pub fn with_config(config: EngineConfig, clock: impl FrameClock + 'static) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self::build(config, Box::new(clock)))
    }

    fn build(config: EngineConfig, clock: Box<dyn FrameClock>) -> Self {
        Self {
            play_rate: config.initial_play_rate,
            config,
            events: Emitter::new(),
            clock,
            pending_frame: None,
            prev_timestamp: None,
            run: PlayOptions::default(),
            current_time: 0.0,
            play_state: PlayState::Paused,
            effects: IndexMap::new(),
            actions: IndexMap::new(),
            sorted_ids: Vec::new(),
            next: 0,
            active_ids: Vec::new(),
        }
    }

    // ========== State ==========

    /// Whether the clock is running
    pub fn is_playing(&self) -> bool {
        self.play_state == PlayState::Playing
    }

    /// Whether the clock is stopped
    pub fn is_paused(&self) -> bool {
        self.play_state == PlayState::Paused
    }

    /// Current playback state
    pub fn play_state(&self) -> PlayState {
        self.play_state
    }

    /// Current time in seconds
    pub fn time(&self) -> f64 {
        self.current_time
    }

    /// Current play rate
    pub fn play_rate(&self) -> f64 {
        self.play_rate
    }

    /// Options of the current (or last) playback
    pub fn play_options(&self) -> PlayOptions {
        self.run
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// IDs of the active actions, in the order they became active
    pub fn active_action_ids(&self) -> &[ActionId] {
        &self.active_ids
    }

    /// Action IDs sorted by start time
    pub fn sorted_action_ids(&self) -> &[ActionId] {
        &self.sorted_ids
    }

    /// Loaded actions, sorted by start time
    pub fn actions(&self) -> impl Iterator<Item = &TimelineAction> + '_ {
        self.sorted_ids.iter().filter_map(|id| self.actions.get(id))
    }

    /// Look up a loaded action
    pub fn action(&self, id: &str) -> Option<&TimelineAction> {
        self.actions.get(id)
    }

    /// Look up an effect
    pub fn effect(&self, id: &str) -> Option<&TimelineEffect> {
        self.effects.get(id)
    }

    /// Position of the scan cursor in the sorted action list
    pub fn scan_cursor(&self) -> usize {
        self.next
    }

    /// Whether a frame request is outstanding
    pub fn has_pending_frame(&self) -> bool {
        self.pending_frame.is_some()
    }

    // ========== Events ==========

    /// Subscribe an informational listener
    pub fn on(
        &mut self,
        kind: EventKind,
        f: impl Fn(&mut TimelineEngine, &EventPayload) + 'static,
    ) -> ListenerId {
        self.events.on(kind, f)
    }

    /// Subscribe a listener that can veto a change by returning `false`.
    /// Only [`EventKind::is_cancelable`] channels honor the veto.
    pub fn on_cancelable(
        &mut self,
        kind: EventKind,
        f: impl Fn(&mut TimelineEngine, &EventPayload) -> bool + 'static,
    ) -> ListenerId {
        self.events.on_cancelable(kind, f)
    }

    /// Unsubscribe a listener
    pub fn off(&mut self, kind: EventKind, id: ListenerId) -> bool {
        self.events.off(kind, id)
    }

    /// Unsubscribe every listener on `kind`
    pub fn off_all(&mut self, kind: EventKind) {
        self.events.off_all(kind);
    }

    /// Number of listeners on `kind`
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.events.listener_count(kind)
    }

    fn trigger(&mut self, kind: EventKind, payload: EventPayload) -> bool {
        let listeners = self.events.listeners(kind);
        listeners.dispatch(self, &payload)
    }

    // ========== Data ==========

    /// Replace the effect map. Takes effect at the next dispatch.
    pub fn set_effects<I, K>(&mut self, effects: I)
    where
        I: IntoIterator<Item = (K, TimelineEffect)>,
        K: Into<EffectId>,
    {
        self.effects = effects.into_iter().map(|(id, effect)| (id.into(), effect)).collect();
    }

    /// Replace the dataset.
    ///
    /// Pauses playback, drains the previous active set (calling `leave` for
    /// every action still present in the new data) and reconciles at the
    /// current time.
    pub fn set_data(&mut self, rows: &[TimelineRow]) {
        if self.is_playing() {
            self.pause();
        }
        self.load_actions(rows);
        self.clear_active();
        let time = self.current_time;
        self.enter_actions(time);
    }

    fn load_actions(&mut self, rows: &[TimelineRow]) {
        let mut sorted: Vec<&TimelineAction> = rows.iter().flat_map(|row| &row.actions).collect();
        sorted.sort_by(|a, b| start_key(a.start).total_cmp(&start_key(b.start)));

        let mut actions = IndexMap::with_capacity(sorted.len());
        let mut sorted_ids = Vec::with_capacity(sorted.len());
        for action in sorted {
            if actions.contains_key(&action.id) {
                tracing::warn!("Duplicate action id {}, keeping the first occurrence", action.id);
                continue;
            }
            if action.start.is_nan() || action.end.is_nan() || action.end < action.start {
                tracing::warn!(
                    "Action {} has an empty or invalid range [{}, {})",
                    action.id,
                    action.start,
                    action.end
                );
            }
            sorted_ids.push(action.id.clone());
            actions.insert(action.id.clone(), action.clone());
        }

        tracing::info!("Loaded {} actions from {} rows", sorted_ids.len(), rows.len());
        self.actions = actions;
        self.sorted_ids = sorted_ids;
    }

    fn clear_active(&mut self) {
        let time = self.current_time;
        for id in std::mem::take(&mut self.active_ids) {
            self.dispatch(&id, LifecycleHook::Leave, time);
        }
        self.next = 0;
    }

    // ========== Rate ==========

    /// Set the play rate. Non-positive rates are rejected.
    pub fn set_play_rate(&mut self, rate: f64) -> bool {
        if let Err(err) = validate_play_rate(rate) {
            tracing::error!("{err}");
            return false;
        }
        if !self.trigger(EventKind::BeforeSetPlayRate, EventPayload::Rate { rate }) {
            tracing::debug!("Play rate change to {rate} vetoed");
            return false;
        }
        self.play_rate = rate;
        self.trigger(EventKind::AfterSetPlayRate, EventPayload::Rate { rate });
        true
    }

    // ========== Time ==========

    /// Seek to `time`. Returns false if a listener vetoed the change.
    pub fn set_time(&mut self, time: f64) -> bool {
        self.apply_time(time, false)
    }

    fn apply_time(&mut self, time: f64, by_tick: bool) -> bool {
        if time.is_nan() {
            tracing::error!("Cannot set time to NaN");
            return false;
        }
        if !by_tick && !self.trigger(EventKind::BeforeSetTime, EventPayload::Time { time }) {
            tracing::debug!("Time change to {time} vetoed");
            return false;
        }

        self.current_time = time;
        self.next = 0;
        self.leave_actions(time);
        self.enter_actions(time);

        let kind = if by_tick {
            EventKind::SetTimeByTick
        } else {
            EventKind::AfterSetTime
        };
        self.trigger(kind, EventPayload::Time { time });
        true
    }

    /// Run the per-frame update at the current time without moving the
    /// clock. Does nothing while playing.
    pub fn re_render(&mut self) {
        if self.is_playing() {
            return;
        }
        let time = self.current_time;
        self.tick_actions(time);
    }

    // ========== Playback ==========

    /// Start playback from the current time.
    ///
    /// Returns false if already playing or if `to_time` is not ahead of the
    /// current time.
    pub fn play(&mut self, options: PlayOptions) -> bool {
        if self.is_playing() {
            return false;
        }
        if let Some(to) = options.to_time {
            if to.partial_cmp(&self.current_time) != Some(Ordering::Greater) {
                tracing::debug!("Not playing: target {to} is not ahead of {}", self.current_time);
                return false;
            }
        }

        self.play_state = PlayState::Playing;
        self.run = options;
        self.prev_timestamp = None;
        tracing::info!("Playback started at {}", self.current_time);

        self.start_or_stop(LifecycleHook::Start);
        self.trigger(EventKind::Play, EventPayload::State);
        self.request_frame();
        true
    }

    /// Pause playback. Safe to call while paused.
    pub fn pause(&mut self) {
        let was_playing = self.is_playing();
        self.play_state = PlayState::Paused;
        if let Some(handle) = self.pending_frame.take() {
            self.clock.cancel_frame(handle);
        }

        if was_playing {
            tracing::info!("Playback paused at {}", self.current_time);
            self.start_or_stop(LifecycleHook::Stop);
            self.trigger(EventKind::Paused, EventPayload::State);
        }
    }

    fn end(&mut self) {
        self.pause();
        tracing::info!("Playback ended at {}", self.current_time);
        self.trigger(EventKind::Ended, EventPayload::State);
    }

    fn request_frame(&mut self) {
        if self.is_playing() && self.pending_frame.is_none() {
            self.pending_frame = Some(self.clock.request_frame());
        }
    }

    /// Deliver a frame requested from the clock.
    ///
    /// Frames that were cancelled, already delivered, or arrive while paused
    /// are ignored.
    pub fn on_frame(&mut self, handle: FrameHandle, timestamp: f64) {
        if self.pending_frame != Some(handle) {
            tracing::debug!("Ignoring stale frame {:?}", handle);
            return;
        }
        self.pending_frame = None;
        if self.is_paused() {
            return;
        }
        self.tick(timestamp);
    }

    /// Pull the next frame from the engine's own clock and deliver it.
    /// Returns false if no frame was pending.
    pub fn pump_frame(&mut self) -> bool {
        match self.clock.next_frame() {
            Some(frame) => {
                self.on_frame(frame.handle, frame.timestamp);
                true
            }
            None => false,
        }
    }

    /// Pump frames until playback stops. Returns the number of frames run.
    pub fn run_while_playing(&mut self) -> usize {
        let mut frames = 0;
        while self.is_playing() && self.pump_frame() {
            frames += 1;
        }
        frames
    }

    fn tick(&mut self, now: f64) {
        let prev = self.prev_timestamp.unwrap_or(now);
        self.prev_timestamp = Some(now);
        let PlayOptions { to_time, auto_end } = self.run;

        let delta_ms = (now - prev).max(0.0).min(self.config.max_frame_delta_ms);
        let mut time = self.current_time + delta_ms / 1000.0 * self.play_rate;
        if let Some(to) = to_time {
            if to <= time {
                time = to;
            }
        }

        if !self.apply_time(time, true) {
            tracing::error!("Stopping playback: tick produced an unusable time");
            self.pause();
            return;
        }
        self.tick_actions(time);

        if to_time.is_none()
            && auto_end
            && self.next >= self.sorted_ids.len()
            && self.active_ids.is_empty()
        {
            self.end();
            return;
        }
        if let Some(to) = to_time {
            if to <= time {
                self.end();
            }
        }

        self.request_frame();
    }

    fn tick_actions(&mut self, time: f64) {
        self.enter_actions(time);
        self.leave_actions(time);
        for id in &self.active_ids {
            self.dispatch(id, LifecycleHook::Update, time);
        }
    }

    // ========== Reconciliation ==========

    fn enter_actions(&mut self, time: f64) {
        while let Some(id) = self.sorted_ids.get(self.next) {
            if let Some(action) = self.actions.get(id) {
                if !action.disable {
                    if action.start > time {
                        break;
                    }
                    if action.end > time && !self.active_ids.contains(id) {
                        let id = id.clone();
                        tracing::trace!("Action {} entered at {}", id, time);
                        self.dispatch(&id, LifecycleHook::Enter, time);
                        self.active_ids.push(id);
                    }
                }
            }
            self.next += 1;
        }
    }

    fn leave_actions(&mut self, time: f64) {
        let mut i = 0;
        while i < self.active_ids.len() {
            let leaving = self
                .actions
                .get(&self.active_ids[i])
                .map_or(true, |action| action.start > time || action.end <= time);
            if leaving {
                tracing::trace!("Action {} left at {}", self.active_ids[i], time);
                self.dispatch(&self.active_ids[i], LifecycleHook::Leave, time);
                self.active_ids.remove(i);
                continue;
            }
            i += 1;
        }
    }

    fn start_or_stop(&self, hook: LifecycleHook) {
        let time = self.current_time;
        for id in &self.active_ids {
            self.dispatch(id, hook, time);
        }
    }

    /// Call `hook` on the effect of action `id`. Missing actions, effects,
    /// sources and hooks are skipped.
    fn dispatch(&self, id: &ActionId, hook: LifecycleHook, time: f64) {
        let Some(action) = self.actions.get(id) else {
            return;
        };
        let Some(effect) = self.effects.get(&action.effect_id) else {
            return;
        };
        let Some(source) = effect.source.as_deref() else {
            return;
        };
        if !source.handles(hook) {
            return;
        }

        let ctx = EffectContext {
            time,
            is_playing: self.is_playing(),
            action,
            effect,
            engine: self,
        };
        effect::invoke(source, hook, &ctx);
    }
}

impl Default for TimelineEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TimelineEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineEngine")
            .field("play_state", &self.play_state)
            .field("current_time", &self.current_time)
            .field("play_rate", &self.play_rate)
            .field("actions", &self.sorted_ids.len())
            .field("active_ids", &self.active_ids)
            .field("next", &self.next)
            .field("pending_frame", &self.pending_frame)
            .field("events", &self.events)
            .finish()
    }
}

/// Sort key for start times; folds `-0.0` into `0.0` so they tie.
fn start_key(start: f64) -> f64 {
    if start == 0.0 {
        0.0
    } else {
        start
    }
}
