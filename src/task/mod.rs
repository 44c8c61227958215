//! Relay task management.
//!
//! Delivery tasks are grouped into relays of sequential legs and moved
//! through their lifecycle by the controller in [`services`]. The module
//! follows hexagonal architecture:
//!
//! - Domain types and the relay grouping engine in [`domain`]
//! - Port contracts for remote collaborators in [`ports`]
//! - In-memory adapter implementations in [`adapters`]
//! - The lifecycle controller and audit timeline in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
