//! Unit tests for the relay task domain and lifecycle controller.

mod support;
mod transition_tests;
