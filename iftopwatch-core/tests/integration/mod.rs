//! Integration test modules

mod pipeline_tests;
mod session_tests;
