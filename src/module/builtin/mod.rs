//! Built-in Module Implementations
//!
//! This module contains the module types that ship with the system.
//! Built-in modules register themselves with the factory at link time and
//! are available to every init spec.

pub mod fanout;
pub mod sink;
pub mod source;
