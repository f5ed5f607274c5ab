//! Tests for building and running simulations.
