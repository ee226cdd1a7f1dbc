//! Model Context Protocol server layer.

pub mod handler;
pub mod resources;
pub mod sse;
pub mod tools;
pub mod transport;
