//! Test modules for the module system
//!
//! Dispatch suites that drive a full manager with a recording test module
//! live here; single-type unit tests sit at the bottom of their
//! implementation files.
