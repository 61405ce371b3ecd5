//! # Metis - Per-Agent Learning Core for Evolutionary Simulations
//!
//! Metis implements the decision-and-learning core of a single autonomous
//! agent inside a larger multi-agent simulation: an epsilon-greedy policy
//! over a trainable function approximator, updated online by a one-step
//! reward-driven rule, with a deduplicated experience-replay memory and a
//! mutation operator for evolutionary diversification between generations.
//!
//! ## Key Features
//!
//! - **Online Q-learning**: one training step per environment tick against a
//!   `reward + gamma * max` target
//! - **Epsilon-Greedy Policy**: stochastic explore/exploit selection with
//!   uniform random tie-breaking
//! - **Deduplicated Replay**: one stored transition per discretized
//!   `(state, action, next state)` key, retrained on bounded random samples
//! - **Evolutionary Operators**: explicit replication with reset rollout
//!   state, and reward-independent structural mutation
//! - **Reproducibility**: every brain owns an explicitly seeded random
//!   stream, propagated at replication
//!
//! ## Quick Start
//!
//! ```rust
//! use metis::agent::AgentBrainBuilder;
//! use ndarray::array;
//!
//! let mut brain = AgentBrainBuilder::new()
//!     .input_size(2)
//!     .action_count(3)
//!     .alpha(0.05)
//!     .gamma(0.9)
//!     .epsilon(0.1)
//!     .disc_numbers(vec![8, 8])
//!     .var_ranges(vec![1.0, 1.0])
//!     .replay_max_samples(50)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! // Environment loop: one learn call per tick.
//! for tick in 0..10 {
//!     brain.learn(0.5, array![0.3, 0.7].view(), tick).unwrap();
//! }
//!
//! // Reproduction: offspring inherits learned behavior, not history.
//! let mut child = brain.replicate(43);
//! child.mutate(0.5, child.default_mutation_count()).unwrap();
//! ```
//!
//! ## Module Organization
//!
//! - [`agent`] - The [`agent::AgentBrain`] core and its builder
//! - [`discretizer`] - Observation bucketing and combined state indices
//! - [`error`] - Error types and result handling
//! - [`network`] - The neural function approximator
//! - [`replay_buffer`] - Deduplicated transition memory
//! - [`utils`] - Small shared numeric helpers

pub mod agent;
pub mod discretizer;
pub mod error;
pub mod network;
pub mod replay_buffer;
pub mod utils;

#[cfg(test)]
mod tests;
