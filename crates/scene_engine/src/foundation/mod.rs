//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and operations
//! - Handle-based collections
//! - Time management
//! - Logging utilities

pub mod collections;
pub mod logging;
pub mod math;
pub mod time;
