//! # Agent Brain Module
//!
//! The per-agent decision-and-learning core: an epsilon-greedy policy over a
//! neural function approximator, trained online by a one-step reward-driven
//! update, with deduplicated experience replay and a structural mutation
//! operator for evolutionary variation.
//!
//! ## Core Concepts
//!
//! - **Q-value**: estimated long-run value of taking a given action from a
//!   given state, read off the approximator's output vector
//! - **Exploration vs Exploitation**: with probability epsilon a random
//!   action is taken; otherwise the best-estimated one (ties broken uniformly
//!   at random)
//! - **Experience Replay**: transitions are deduplicated by discretized state
//!   key and retrained against freshly recomputed targets
//! - **Mutation**: reward-independent perturbation of the approximator's
//!   response surface at one-hot basis points, applied between generations
//!
//! ## Lifecycle
//!
//! A brain is either built fresh through [`AgentBrainBuilder`] or derived
//! from a parent with [`AgentBrain::replicate`], which copies configuration
//! and learned parameters but resets the interaction history. The
//! environment drives [`AgentBrain::learn`] once per tick; the population
//! layer calls [`AgentBrain::mutate`] and `replicate` during reproduction.

mod brain;

pub use brain::{AgentBrain, AgentBrainBuilder, BrainDiagnostics, ReplayConfig, MAX_REWARD};
