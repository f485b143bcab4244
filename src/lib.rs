//! Gesture-driven arcade shooter core.
//!
//! `gesture` turns one hand's landmarks into an [`entities::Intent`];
//! `compute` advances the [`entities::GameState`] by one tick given that
//! intent.  Rendering and audio live in the binary.

pub mod compute;
pub mod config;
pub mod entities;
pub mod gesture;
pub mod source;
