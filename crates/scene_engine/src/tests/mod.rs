//! Cross-module scenario and property tests

mod scene_properties;
