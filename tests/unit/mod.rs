//! Unit tests for individual components
//!
//! These tests exercise one component at a time through its public API.

mod processing;
