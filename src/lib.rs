//! # planwise
//!
//! A minimal tool-calling LLM agent.
//!
//! This library provides:
//! - A reactive "tools in a loop" conversation mode
//! - A plan-then-execute mode that numbers the task into steps, runs each
//!   step against the model, and lifts figures out of tool results into
//!   run state
//! - Two leaf tools, `calculate` and `search`, behind a name-based dispatcher
//! - An OpenAI-compatible chat completions client
//!
//! ## Example
//!
//! ```rust,ignore
//! use planwise::{agent::Agent, config::Config};
//!
//! let config = Config::from_env()?;
//! let agent = Agent::new(&config)?;
//! let outcome = agent.execute_plan("What is 18% of India's GDP growth?").await?;
//! println!("{}", outcome.answer);
//! ```

pub mod agent;
pub mod config;
pub mod llm;
pub mod tools;

pub use config::Config;
