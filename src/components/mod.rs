//! UI components.

pub mod dotimation;
