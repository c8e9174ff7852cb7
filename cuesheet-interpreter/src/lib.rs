//! Cuesheet Interpreter - Clip Interpretation
//!
//! Turns raw timeline clips into validated, typed instructions for agents.
//! Interpretation is pure: it reads the clip and the compatibility matrix,
//! and reports problems as data instead of failing.

mod compat;
mod instruction;
mod interpreter;

pub use compat::{check_compatibility, CompatibilityMatrix};
pub use instruction::{InstructionPayload, InterpretedInstruction};
pub use interpreter::{ClipInterpreter, ExecutionOptions};
