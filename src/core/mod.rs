//! Core reusable components for alignment operations.
//!
//! This module contains components that are agnostic to where reads and
//! templates come from and can be reused by any driver (chain, CLI, tests).

pub mod alignment;
pub mod compute;
