//! Test modules for the queue system
//!
//! Cross-backend suites that exercise the queues and the registry under
//! concurrent load live here; single-backend unit tests sit at the bottom
//! of their implementation files.
