//! CLI integration tests against a temporary libdeps tree.

mod common;
mod integrate_tests;
mod locate_tests;
