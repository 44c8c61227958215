//! Step definitions for relay relinking scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
