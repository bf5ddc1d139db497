//! Utility functions and helpers for the optmarshal-rs library.

pub mod finite_difference;
pub mod parallel;

pub use finite_difference::{gradient, jacobian};
pub use parallel::{best_candidate, evaluate_batch, gradient_parallel};
