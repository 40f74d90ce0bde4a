//! Core types for exact metrical time
//!
//! This crate models the time of a score independently of how the score is
//! written down: exact rational durations, meters, tempi, and a tempo
//! stratum that converts metrical offsets to wall-clock seconds.
//!
//! # Examples
//!
//! ```
//! use metronome_core::{stratum, Meter, MetricalDuration, Structure, Tempo};
//!
//! let mut tempi = stratum::Builder::new();
//! tempi.add(Tempo::new(120.0, 4), MetricalDuration::ZERO, false);
//!
//! let structure = Structure::new(vec![Meter::new(4, 4); 2], tempi.build());
//! assert_eq!(structure.seconds_at(structure.total_duration()), 4.0);
//! ```
//!
//! # Main Components
//!
//! - **Rational**: Fractions compared by value, never auto-reduced
//! - **MetricalDuration**: Durations over power-of-two subdivisions
//! - **Meter**: Time signatures
//! - **Tempo** / **Stratum**: Tempo events and offset-to-seconds conversion
//! - **Structure**: Meters and tempi of a whole score

pub mod duration;
pub mod meter;
pub mod rational;
pub mod stratum;
pub mod structure;
pub mod tempo;

pub use duration::{is_power_of_two, MetricalDuration};
pub use meter::Meter;
pub use rational::Rational;
pub use stratum::{Stratum, TempoEvent};
pub use structure::{Beat, Structure};
pub use tempo::Tempo;
