//! An endless runner for the terminal.
//!
//! The gameplay lives in [`run`], which is independent of the terminal and
//! the audio device. [`render`] and [`audio`] are the front end the binary
//! drives once per frame.

pub mod audio;
pub mod config;
pub mod error;
pub mod palette;
pub mod physics;
pub mod render;
pub mod run;
pub mod sound;
pub mod timer;

pub use config::{Config, Tuning};
pub use error::{GameError, Result};
pub use run::{Phase, Run, RunEvent};
