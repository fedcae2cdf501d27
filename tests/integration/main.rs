//! Integration test modules.

mod stage_test;
