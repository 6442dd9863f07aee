//! # tapdeck Remote Control (tapdeck-rc)
//!
//! Remote-control client for an out-of-process playback engine.
//!
//! **Purpose:** Track playback position with an adaptive refresh loop,
//! convert sustained directional input into accelerating seek commands,
//! and keep a paging view synchronized with the engine's play queue. The
//! engine itself (decode, output, queue persistence) is an external
//! collaborator reached over a narrow HTTP + event-stream surface.
//!
//! **Architecture:** One owner task per view drives every component;
//! the only cross-boundary concurrency is the engine connection, modeled
//! as a request/reply channel with bounded per-call timeouts.

pub mod config;
pub mod control;
pub mod controller;
pub mod error;
pub mod remote;
pub mod render;
pub mod worker;

pub use error::{EngineError, EngineResult, Error, Result};
