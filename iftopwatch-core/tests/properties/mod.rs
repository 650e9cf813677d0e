//! Property-based test modules

mod parser_tests;
mod units_tests;
