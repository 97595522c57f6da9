#![allow(dead_code)]

//! Test harness for handshake integration tests.
//!
//! Provides a loopback server whose handshake behavior is chosen per test.

mod server;

pub use server::{Behavior, Observed, TestServer};
