//! End-to-end exercise of the learning core on a toy tracking task.
//!
//! The agent observes its own position and a fixed target, both in [0, 1],
//! and can step left, stay, or step right. Reward is higher the closer it
//! sits to the target. This is not a performance test; it drives the whole
//! per-tick loop (policy, discretization, training, replay) plus the
//! evolutionary operators the way a simulation would.

use metis::agent::{AgentBrain, AgentBrainBuilder};
use ndarray::array;

const LEFT: usize = 0;
const STAY: usize = 1;
const RIGHT: usize = 2;

struct Tracker {
    position: f32,
    target: f32,
}

impl Tracker {
    fn new() -> Self {
        Tracker {
            position: 0.1,
            target: 0.8,
        }
    }

    fn step(&mut self, action: usize) -> (f32, [f32; 2]) {
        match action {
            LEFT => self.position = (self.position - 0.05).max(0.0),
            RIGHT => self.position = (self.position + 0.05).min(1.0),
            STAY => {}
            other => panic!("invalid action {}", other),
        }
        let reward = 1.0 - (self.position - self.target).abs();
        (reward, [self.position, self.target])
    }
}

fn tracker_brain(seed: u64) -> AgentBrain {
    AgentBrainBuilder::new()
        .input_size(2)
        .action_count(3)
        .alpha(0.05)
        .gamma(0.9)
        .epsilon(0.2)
        .disc_numbers(vec![10, 10])
        .var_ranges(vec![1.0, 1.0])
        .replay_max_samples(20)
        .seed(seed)
        .build()
        .unwrap()
}

#[test]
fn test_full_episode_loop() {
    let mut brain = tracker_brain(7);
    let mut env = Tracker::new();

    let mut observation = [0.1, 0.8];
    for tick in 0..300 {
        let action = brain.choose(array![observation[0], observation[1]].view(), false).unwrap();
        assert!(action < 3);
        let (reward, next) = env.step(action);
        observation = next;
        brain.learn(reward, array![next[0], next[1]].view(), tick).unwrap();
    }

    // The walk only reaches a handful of (state, action, next state) keys,
    // and the memory deduplicates on them, so it stays far below the number
    // of learning steps.
    assert!(!brain.memory().is_empty());
    assert!(brain.memory().len() < 300);
    assert!(brain.last_delta().is_finite());

    let stats = brain.stats();
    assert!(stats.contains("state_space_size: 100"));
}

#[test]
fn test_generation_handoff() {
    let mut parent = tracker_brain(11);
    let mut env = Tracker::new();

    let mut observation = [0.1, 0.8];
    for tick in 0..100 {
        let action = brain_step(&mut parent, observation, tick);
        let (reward, next) = env.step(action);
        observation = next;
        parent.learn(reward, array![next[0], next[1]].view(), tick).unwrap();
    }

    // Reproduce: child inherits the approximator, mutates, and keeps learning
    // on its own environment without touching the parent.
    let mut child = parent.replicate(12);
    child.mutate(0.3, child.default_mutation_count()).unwrap();

    let parent_values = parent.query(array![0.5, 0.8].view()).unwrap();

    let mut child_env = Tracker::new();
    let mut child_obs = [0.1, 0.8];
    for tick in 0..100 {
        let action = brain_step(&mut child, child_obs, tick);
        let (reward, next) = child_env.step(action);
        child_obs = next;
        child.learn(reward, array![next[0], next[1]].view(), tick).unwrap();
    }

    assert_eq!(parent.query(array![0.5, 0.8].view()).unwrap(), parent_values);
    assert!(!child.memory().is_empty());
}

fn brain_step(brain: &mut AgentBrain, observation: [f32; 2], _tick: u64) -> usize {
    brain
        .choose(array![observation[0], observation[1]].view(), false)
        .unwrap()
}

#[test]
fn test_diagnostics_json_roundtrip() {
    let mut brain = tracker_brain(19);
    brain.learn(0.5, array![0.2, 0.8].view(), 1).unwrap();

    let json = brain.diagnostics().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["state_space_size"], 100);
    assert_eq!(value["last_timestep"], 1);
}
