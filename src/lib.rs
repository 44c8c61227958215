//! Courier relay: task grouping and lifecycle control for volunteer
//! courier dispatch.
//!
//! Deliveries are modelled as tasks. A delivery handed between several
//! riders becomes a relay: an ordered chain of legs sharing a parent id.
//! This crate keeps those chains consistent while legs are added,
//! cancelled, rejected, deleted and restored, and drives every task through
//! its status lifecycle with undoable notifications.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure task, relay and notification types
//! - **Ports**: Abstract trait interfaces for the remote task store, user
//!   directory, audit log, live updates and notification surface
//! - **Adapters**: In-memory implementations of every port
//!
//! # Modules
//!
//! - [`config`]: Debounce and refresh timings
//! - [`task`]: Relay grouping engine and lifecycle controller

pub mod config;
pub mod task;
