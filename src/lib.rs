//! Stimulus Lists — counterbalanced list generation for psycholinguistic
//! experiments.
//!
//! Reads word and critical-verb tables, builds independently shuffled
//! trial frames, assigns balanced frame and transitivity conditions, and
//! writes one trial-structure file per simulated participant.

pub mod config;
pub mod core;
pub mod schema;
