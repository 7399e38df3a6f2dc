//! proctor.observation.v1 schema
//!
//! This module defines the input records produced by the perception
//! components (face detector, window-focus source) and the adapter that
//! replays them through a session.

mod adapter;
mod observation;

pub use adapter::*;
pub use observation::*;
