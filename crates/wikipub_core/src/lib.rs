//! Core library for `wikipub`: configuration resolution, git invocation, and
//! the clone-or-init / stage / push publishing sequence.

pub mod config;
pub mod git;
pub mod publish;
pub mod runtime;
