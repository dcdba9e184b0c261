//! Integration tests for avherald-watch

mod crawl_tests;
