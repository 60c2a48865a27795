// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline playback engine for `OrdoPlay`.
//!
//! This crate runs a timeline independently of the editor that displays it:
//! - Actions grouped into rows, each bound to an effect
//! - Active-set reconciliation on every seek and playback tick
//! - Play/pause/seek/rate state machine
//! - Cancelable event hooks around every state change
//!
//! ## Architecture
//!
//! The engine is built on:
//! - An event bus with veto-capable `before*` channels
//! - A start-sorted action index scanned with a forward cursor
//! - Effect sources exposing optional lifecycle hooks
//! - A host frame clock abstraction (real-time or virtual)
//!
//! ```
//! use timeline_engine::{
//!     CallbackSource, ManualClock, PlayOptions, TimelineAction, TimelineEffect, TimelineEngine,
//!     TimelineRow,
//! };
//!
//! let clock = ManualClock::new();
//! let mut engine = TimelineEngine::with_clock(clock.clone());
//! engine.set_effects([(
//!     "flash",
//!     TimelineEffect::new("flash").with_source(CallbackSource::new().on_enter(|ctx| {
//!         println!("{} entered at {}", ctx.action.id, ctx.time);
//!     })),
//! )]);
//! engine.set_data(&[TimelineRow::new("row").with_action(TimelineAction::new("a", 0.5, 1.0, "flash"))]);
//!
//! engine.play(PlayOptions::new().auto_end(true));
//! while engine.is_playing() {
//!     clock.advance(250.0);
//!     engine.pump_frame();
//! }
//! assert_eq!(engine.time(), 1.0);
//! ```

pub mod action;
pub mod clock;
pub mod config;
pub mod effect;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod events;

pub use action::{ActionId, TimelineAction, TimelineRow};
pub use clock::{FrameClock, FrameHandle, FrameTick, ManualClock, RealtimeClock};
pub use config::EngineConfig;
pub use effect::{CallbackSource, EffectContext, EffectId, EffectSource, LifecycleHook, TimelineEffect};
pub use emitter::{Emitter, Handler, ListenerId, Listeners};
pub use engine::{PlayOptions, PlayState, TimelineEngine};
pub use error::{ConfigError, EngineError};
pub use events::{EventKind, EventPayload, UnknownEvent};
