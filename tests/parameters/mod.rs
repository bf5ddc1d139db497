//! Integration tests for the parameter system
//!
//! These tests verify that ranges and parameter definitions behave correctly in
//! various scenarios.

// Tests for ValueRange and Point3Range
mod range_tests;

// Tests for input parameters
mod input_tests;

// Tests for output parameters and their contributions
mod output_tests;

// Tests for the ParameterSet collection
mod set_tests;
