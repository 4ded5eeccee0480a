//! Integration tests.

mod cli_test;
mod race_store_test;
