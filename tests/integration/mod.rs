//! Integration tests combining multiple components
//!
//! These tests drive the engine, the job layer and the file sinks together.

mod cli;
mod pipeline;
