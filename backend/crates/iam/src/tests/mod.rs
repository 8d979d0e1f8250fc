//! Crate tests that need the in-memory store

mod support;
