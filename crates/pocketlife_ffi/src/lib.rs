//! FFI surface for the Flutter shell.

pub mod api;
