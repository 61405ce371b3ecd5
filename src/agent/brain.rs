use std::fmt::Write as _;

use log::{debug, trace};
use ndarray::{Array1, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};
use serde::Serialize;

use crate::discretizer::StateDiscretizer;
use crate::error::{MetisError, Result};
use crate::network::NeuralNetwork;
use crate::replay_buffer::{ExperienceMemory, Transition};
use crate::utils::{max_value, one_hot};

/// Global bound on the magnitude of any stored action value. Mutation clamps
/// its perturbed targets into `[-MAX_REWARD, MAX_REWARD]` and scales absolute
/// perturbations against it.
pub const MAX_REWARD: f32 = 1000.0;

/// Sentinel for "no prior state yet": the index a brain carries before its
/// first learning step, and the value rollout state resets to on replication.
const NO_PRIOR_STATE: i64 = -1;

/// Replay settings. When attached to a brain, every learning step records the
/// observed transition and then retrains on a bounded random sample of the
/// whole memory.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ReplayConfig {
    /// Upper bound on the number of transitions retrained per step.
    pub max_samples: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig { max_samples: 50 }
    }
}

/// A point-in-time snapshot of a brain's bookkeeping, for inspection and
/// telemetry. Rendered as text by [`AgentBrain::stats`].
#[derive(Clone, Debug, Serialize)]
pub struct BrainDiagnostics {
    pub state_space_size: i64,
    pub past_state_index: i64,
    pub future_state_index: i64,
    pub last_action: usize,
    pub future_qvalues: Vec<f32>,
    pub alpha: f32,
    pub gamma: f32,
    pub epsilon: f32,
    pub attitude: String,
    pub memory_len: usize,
    pub last_replay_samples: usize,
    pub last_delta: f32,
    pub last_timestep: u64,
}

impl BrainDiagnostics {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// The decision-and-learning core of one autonomous agent.
///
/// An `AgentBrain` owns a [`NeuralNetwork`] approximator, an epsilon-greedy
/// policy over its outputs, a one-step reward-driven update rule, an optional
/// deduplicated replay memory, and a structural mutation operator used during
/// evolutionary reproduction. Once per environment tick the owner calls
/// [`learn`](Self::learn) with the reward earned since the last tick and the
/// new observation; everything else hangs off that entry point except
/// [`mutate`](Self::mutate) and [`replicate`](Self::replicate), which the
/// population layer invokes between generations.
///
/// Each instance owns its RNG, approximator and memory, so distinct brains
/// can be driven in parallel by an external scheduler. A single instance must
/// not be driven concurrently: `learn` rewrites rollout bookkeeping in place.
///
/// # Example
///
/// ```rust
/// use metis::agent::AgentBrainBuilder;
/// use ndarray::array;
///
/// let mut brain = AgentBrainBuilder::new()
///     .input_size(2)
///     .action_count(3)
///     .alpha(0.05)
///     .gamma(0.9)
///     .epsilon(0.1)
///     .disc_numbers(vec![8, 8])
///     .var_ranges(vec![1.0, 1.0])
///     .seed(42)
///     .build()
///     .unwrap();
///
/// // One environment tick: reward for the previous action, new observation.
/// brain.learn(0.5, array![0.3, 0.7].view(), 1).unwrap();
///
/// let action = brain.choose(array![0.3, 0.7].view(), true).unwrap();
/// assert!(action < 3);
/// ```
pub struct AgentBrain {
    network: NeuralNetwork,
    input_size: usize,
    action_count: usize,
    alpha: f32,
    gamma: f32,
    epsilon: f32,
    discretizer: StateDiscretizer,
    initial_attitude: String,
    train_epochs: usize,
    replay: Option<ReplayConfig>,
    memory: ExperienceMemory,
    rng: StdRng,

    // Rollout bookkeeping, rewritten once per tick by `learn`.
    past_state: Array1<f32>,
    past_action: usize,
    past_state_index: i64,
    past_qvalues: Array1<f32>,
    future_action: usize,
    future_state_index: i64,
    future_qvalues: Array1<f32>,
    last_delta: f32,
    last_replay_samples: usize,
    last_timestep: u64,
}

impl AgentBrain {
    /// Per-timestep entry point: receive the reward earned since the previous
    /// tick and the new raw observation, then train the approximator toward
    /// the one-step target for the previously taken action.
    ///
    /// Observation components above 1.0 clamp down to 1.0; there is no lower
    /// clamp. Both the next and the stored past observation are re-evaluated
    /// against the current approximator, so the reported
    /// [`last_delta`](Self::last_delta) tracks training progress rather than
    /// a strict temporal-difference error. Every call assumes the episode
    /// continues; there is no terminal branch.
    ///
    /// Fails on an observation of the wrong length before touching any
    /// rollout state.
    pub fn learn(&mut self, reward: f32, next_observation: ArrayView1<f32>, timestep: u64) -> Result<()> {
        if next_observation.len() != self.input_size {
            return Err(MetisError::dimension_mismatch(
                format!("observation of length {}", self.input_size),
                format!("length {}", next_observation.len()),
            ));
        }

        let next_state: Array1<f32> = next_observation.mapv(|v| if v > 1.0 { 1.0 } else { v });

        let next_action = self.choose(next_state.view(), false)?;
        let next_state_index = self.discretizer.index_of(next_state.view());

        let next_qvalues = self.network.query(next_state.view());
        // Fresh evaluation of the stored past state, not the values cached
        // when the past action was chosen.
        let past_qvalues = self.network.query(self.past_state.view());

        let target = reward + self.gamma * max_value(next_qvalues.view())?;
        self.last_delta = (past_qvalues[self.past_action] - target).abs();

        let mut targets = past_qvalues;
        targets[self.past_action] = target;
        self.network
            .train_single(self.past_state.view(), targets.view(), self.train_epochs, self.alpha)?;

        debug!(
            "learn t={} action={} reward={} delta={}",
            timestep, self.past_action, reward, self.last_delta
        );

        if let Some(config) = self.replay {
            let outcome = self.memory.record(Transition {
                state: self.past_state.clone(),
                state_index: self.past_state_index,
                action: self.past_action,
                reward,
                next_state: next_state.clone(),
                next_state_index,
            });
            trace!("record {:?}, memory holds {}", outcome, self.memory.len());
            self.replay(config)?;
        }

        // Move the rollout forward one step.
        self.past_state_index = next_state_index;
        self.past_action = next_action;
        self.past_qvalues = next_qvalues.clone();
        self.past_state = next_state;
        self.future_action = next_action;
        self.future_state_index = next_state_index;
        self.future_qvalues = next_qvalues;
        self.last_timestep = timestep;

        Ok(())
    }

    /// Epsilon-greedy action selection.
    ///
    /// With probability `epsilon` (and `optimal == false`) a uniformly random
    /// action is returned. Otherwise the approximator is queried and the
    /// actions are scanned in a freshly shuffled order keeping the strict
    /// running maximum, so ties break uniformly at random rather than toward
    /// the smallest index. Rollout state is untouched.
    pub fn choose(&mut self, observation: ArrayView1<f32>, optimal: bool) -> Result<usize> {
        if observation.len() != self.input_size {
            return Err(MetisError::dimension_mismatch(
                format!("observation of length {}", self.input_size),
                format!("length {}", observation.len()),
            ));
        }

        if !optimal && self.rng.gen::<f32>() < self.epsilon {
            return Ok(self.rng.gen_range(0..self.action_count));
        }

        let qvalues = self.network.query(observation);
        let mut order: Vec<usize> = (0..self.action_count).collect();
        order.shuffle(&mut self.rng);

        let mut best_action = 0;
        let mut best = f32::NEG_INFINITY;
        for &idx in &order {
            if qvalues[idx] > best {
                best = qvalues[idx];
                best_action = idx;
            }
        }
        Ok(best_action)
    }

    /// Per-action values for an observation. Pure pass-through to the
    /// approximator, no side effects.
    pub fn query(&self, observation: ArrayView1<f32>) -> Result<Array1<f32>> {
        if observation.len() != self.input_size {
            return Err(MetisError::dimension_mismatch(
                format!("observation of length {}", self.input_size),
                format!("length {}", observation.len()),
            ));
        }
        Ok(self.network.query(observation))
    }

    /// Inject bounded random perturbations into the approximator's response
    /// surface, independent of any reward signal. Used by the population
    /// layer for evolutionary variation between generations, never from the
    /// per-tick loop.
    ///
    /// Each of the `count` repetitions picks a random input dimension and
    /// action, queries the one-hot basis vector for that dimension, perturbs
    /// the chosen action's value by a uniform delta scaled by `noise`
    /// (relative to the current value when it is non-zero, otherwise to a
    /// fixed fraction of [`MAX_REWARD`]), clamps everything into
    /// `[-MAX_REWARD, MAX_REWARD]` and trains on the result for one epoch.
    ///
    /// `noise` outside `(0, 1]` is a configuration error; nothing is touched.
    pub fn mutate(&mut self, noise: f32, count: usize) -> Result<()> {
        if !(noise > 0.0 && noise <= 1.0) {
            return Err(MetisError::invalid_parameter(
                "noise",
                format!("must lie in (0, 1], got {}", noise),
            ));
        }

        let range = noise * 0.001;
        let perturbation = Uniform::new(-range, range);
        let absolute_scale = 0.001 * MAX_REWARD;

        debug!("mutate noise={} count={}", noise, count);

        for _ in 0..count {
            let dim = self.rng.gen_range(0..self.input_size);
            let action = self.rng.gen_range(0..self.action_count);

            let state = one_hot(self.input_size, dim);
            let mut qvalues = self.network.query(state.view());

            let draw = perturbation.sample(&mut self.rng);
            let perturbed = if qvalues[action].abs() > 0.0 {
                qvalues[action] + draw * qvalues[action]
            } else {
                qvalues[action] + draw * absolute_scale
            };
            qvalues[action] = perturbed.clamp(-MAX_REWARD, MAX_REWARD);
            qvalues.mapv_inplace(|v| v.clamp(-MAX_REWARD, MAX_REWARD));

            self.network.train_single(state.view(), qvalues.view(), 1, self.alpha)?;
        }
        Ok(())
    }

    /// Clone-as-reproduction: a new brain sharing this one's hyperparameters,
    /// discretization config and a deep copy of the approximator's learned
    /// parameters, with rollout state reset to neutral and an empty memory.
    /// The offspring inherits learned behavior but starts its own interaction
    /// history, drawing randomness from its own stream seeded with `seed`.
    pub fn replicate(&self, seed: u64) -> AgentBrain {
        AgentBrain {
            network: self.network.clone(),
            input_size: self.input_size,
            action_count: self.action_count,
            alpha: self.alpha,
            gamma: self.gamma,
            epsilon: self.epsilon,
            discretizer: self.discretizer.clone(),
            initial_attitude: self.initial_attitude.clone(),
            train_epochs: self.train_epochs,
            replay: self.replay,
            memory: ExperienceMemory::new(),
            rng: StdRng::seed_from_u64(seed),
            past_state: Array1::zeros(self.input_size),
            past_action: 0,
            past_state_index: NO_PRIOR_STATE,
            past_qvalues: Array1::zeros(self.action_count),
            future_action: 0,
            future_state_index: 0,
            future_qvalues: Array1::zeros(self.action_count),
            last_delta: 0.0,
            last_replay_samples: 0,
            last_timestep: 0,
        }
    }

    /// Diagnostic text: state space size, rollout indices, last choice and
    /// its value estimates, hyperparameters.
    pub fn stats(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "state_space_size: {}", self.discretizer.space_size());
        let _ = writeln!(out, "past_state_index: {}", self.past_state_index);
        let _ = writeln!(out, "future_state_index: {}", self.future_state_index);
        let _ = writeln!(out, "choice: {}", self.future_action);
        for value in self.future_qvalues.iter() {
            let _ = writeln!(out, "{}", value);
        }
        let _ = writeln!(
            out,
            "alpha: {} gamma: {} epsilon: {} attitude: {}",
            self.alpha, self.gamma, self.epsilon, self.initial_attitude
        );
        let _ = writeln!(
            out,
            "memory: {} last_delta: {} timestep: {}",
            self.memory.len(),
            self.last_delta,
            self.last_timestep
        );
        out
    }

    /// Structured counterpart of [`stats`](Self::stats).
    pub fn diagnostics(&self) -> BrainDiagnostics {
        BrainDiagnostics {
            state_space_size: self.discretizer.space_size(),
            past_state_index: self.past_state_index,
            future_state_index: self.future_state_index,
            last_action: self.future_action,
            future_qvalues: self.future_qvalues.to_vec(),
            alpha: self.alpha,
            gamma: self.gamma,
            epsilon: self.epsilon,
            attitude: self.initial_attitude.clone(),
            memory_len: self.memory.len(),
            last_replay_samples: self.last_replay_samples,
            last_delta: self.last_delta,
            last_timestep: self.last_timestep,
        }
    }

    /// Retrain on a bounded random sample of the whole memory. Targets are
    /// recomputed against the current approximator for both sides of each
    /// transition, so replay always chases the latest value estimates instead
    /// of replaying historical ones.
    fn replay(&mut self, config: ReplayConfig) -> Result<()> {
        if self.memory.is_empty() {
            self.last_replay_samples = 0;
            return Ok(());
        }

        let mut sample: Vec<Transition> = self.memory.transitions().to_vec();
        sample.shuffle(&mut self.rng);
        sample.truncate(config.max_samples);

        let mut states = Vec::with_capacity(sample.len());
        let mut targets = Vec::with_capacity(sample.len());
        for transition in &sample {
            let mut qvalues = self.network.query(transition.state.view());
            let next_qvalues = self.network.query(transition.next_state.view());
            qvalues[transition.action] =
                transition.reward + self.gamma * max_value(next_qvalues.view())?;
            states.push(transition.state.clone());
            targets.push(qvalues);
        }

        self.last_replay_samples = sample.len();
        trace!("replay on {} of {} transitions", sample.len(), self.memory.len());
        self.network.train_batch(&states, &targets, 1, 1, self.alpha)
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn action_count(&self) -> usize {
        self.action_count
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn discretizer(&self) -> &StateDiscretizer {
        &self.discretizer
    }

    pub fn memory(&self) -> &ExperienceMemory {
        &self.memory
    }

    /// Direct access to the approximator, for inspection and tests.
    pub fn network_mut(&mut self) -> &mut NeuralNetwork {
        &mut self.network
    }

    pub fn past_state_index(&self) -> i64 {
        self.past_state_index
    }

    /// Action-value estimates cached when the rollout last advanced.
    pub fn past_qvalues(&self) -> ArrayView1<f32> {
        self.past_qvalues.view()
    }

    /// Absolute difference between the recomputed past-action value and its
    /// training target on the most recent `learn` call. Trends toward zero as
    /// the approximator converges on a stationary target.
    pub fn last_delta(&self) -> f32 {
        self.last_delta
    }

    /// Conventional perturbation count for one reproduction event, matching
    /// the size of the response surface: one per (input dimension, action)
    /// pair.
    pub fn default_mutation_count(&self) -> usize {
        self.input_size * self.action_count
    }
}

/// Builder for [`AgentBrain`]. All dimension and range parameters are
/// validated in [`build`](Self::build); nothing is silently truncated or
/// padded.
pub struct AgentBrainBuilder {
    input_size: usize,
    action_count: usize,
    alpha: f32,
    gamma: f32,
    epsilon: f32,
    disc_numbers: Vec<usize>,
    var_ranges: Vec<f32>,
    initial_attitude: String,
    hidden_sizes: Vec<usize>,
    train_epochs: usize,
    replay: Option<ReplayConfig>,
    seed: u64,
}

impl AgentBrainBuilder {
    pub fn new() -> Self {
        AgentBrainBuilder {
            input_size: 0,
            action_count: 0,
            alpha: 0.1,
            gamma: 0.9,
            epsilon: 0.1,
            disc_numbers: vec![],
            var_ranges: vec![],
            initial_attitude: "neutral".to_string(),
            hidden_sizes: vec![32],
            train_epochs: 1,
            replay: None,
            seed: 0,
        }
    }

    pub fn input_size(mut self, input_size: usize) -> Self {
        self.input_size = input_size;
        self
    }

    pub fn action_count(mut self, action_count: usize) -> Self {
        self.action_count = action_count;
        self
    }

    /// Learning rate used for every training call.
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Discount factor on the best next-state value.
    pub fn gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Exploration rate.
    pub fn epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Bucket count per observation dimension.
    pub fn disc_numbers(mut self, disc_numbers: Vec<usize>) -> Self {
        self.disc_numbers = disc_numbers;
        self
    }

    /// Value range per observation dimension.
    pub fn var_ranges(mut self, var_ranges: Vec<f32>) -> Self {
        self.var_ranges = var_ranges;
        self
    }

    pub fn initial_attitude(mut self, attitude: impl Into<String>) -> Self {
        self.initial_attitude = attitude.into();
        self
    }

    /// Hidden layer widths of the approximator.
    pub fn hidden_sizes(mut self, hidden_sizes: Vec<usize>) -> Self {
        self.hidden_sizes = hidden_sizes;
        self
    }

    /// Passes over the single-step training pair per `learn` call.
    pub fn train_epochs(mut self, train_epochs: usize) -> Self {
        self.train_epochs = train_epochs;
        self
    }

    /// Enable experience replay with the given per-step sample bound.
    pub fn replay_max_samples(mut self, max_samples: usize) -> Self {
        self.replay = Some(ReplayConfig { max_samples });
        self
    }

    /// Seed for the brain's own random stream.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> Result<AgentBrain> {
        if self.input_size == 0 {
            return Err(MetisError::invalid_parameter("input_size", "must be non-zero"));
        }
        if self.action_count == 0 {
            return Err(MetisError::invalid_parameter("action_count", "must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(MetisError::invalid_parameter(
                "epsilon",
                format!("must lie in [0, 1], got {}", self.epsilon),
            ));
        }
        if self.train_epochs == 0 {
            return Err(MetisError::invalid_parameter("train_epochs", "must be at least 1"));
        }
        if self.disc_numbers.len() != self.input_size {
            return Err(MetisError::dimension_mismatch(
                format!("{} bucket counts", self.input_size),
                format!("{} bucket counts", self.disc_numbers.len()),
            ));
        }
        let discretizer = StateDiscretizer::new(self.disc_numbers, self.var_ranges)?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut layer_sizes = Vec::with_capacity(self.hidden_sizes.len() + 2);
        layer_sizes.push(self.input_size);
        layer_sizes.extend_from_slice(&self.hidden_sizes);
        layer_sizes.push(self.action_count);
        let network = NeuralNetwork::new(&layer_sizes, &mut rng)?;

        Ok(AgentBrain {
            network,
            input_size: self.input_size,
            action_count: self.action_count,
            alpha: self.alpha,
            gamma: self.gamma,
            epsilon: self.epsilon,
            discretizer,
            initial_attitude: self.initial_attitude,
            train_epochs: self.train_epochs,
            replay: self.replay,
            memory: ExperienceMemory::new(),
            rng,
            past_state: Array1::zeros(self.input_size),
            past_action: 0,
            past_state_index: NO_PRIOR_STATE,
            past_qvalues: Array1::zeros(self.action_count),
            future_action: 0,
            future_state_index: 0,
            future_qvalues: Array1::zeros(self.action_count),
            last_delta: 0.0,
            last_replay_samples: 0,
            last_timestep: 0,
        })
    }
}

impl Default for AgentBrainBuilder {
    fn default() -> Self {
        Self::new()
    }
}
