//! Core of the crop weather simulation.
//!
//! Weather providers read daily weather from met files (or take it from the
//! user), fill in what the files leave out and hand a consistent day to the
//! models that modify or consume it.

pub mod clock;
pub mod component;
pub mod errors;
pub mod met;
pub mod model;
pub mod summary;
pub mod temp_sum;
pub mod weather;
pub mod zone;
