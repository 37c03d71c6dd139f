//! Single-round tool orchestration
//!
//! The agent asks the model once, runs the tool calls of that first reply,
//! and asks the model once more for the final answer.

mod agent_loop;

pub use agent_loop::YangmeiAgent;
