//! Integration tests for boomerang-socket

mod common;
mod connection_test;
mod reconnect_test;
mod validate_test;
