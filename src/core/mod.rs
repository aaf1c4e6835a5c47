//! # Core Infrastructure Module
//!
//! Buffer management shared by the processing layer and the tools.

pub mod buffer_pool;
