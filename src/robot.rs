use std::collections::{hash_map::Entry, HashMap};

use rand::{seq::IteratorRandom, thread_rng};
use strum::{EnumIter, FromRepr, IntoEnumIterator};

use crate::{
    assert_interval, decay,
    decay::Decay,
    exploration::{Choice, EpsilonGreedy, Softmax},
};

/// Number of actions available to the robot
pub const ACTIONS: usize = 3;

/// One Q-table row: a value estimate per action
pub type ActionValues = [f32; ACTIONS];

/// The three things the robot can do on any tick
#[derive(EnumIter, FromRepr, Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Action {
    Forward = 0,
    TurnLeft = 1,
    TurnRight = 2,
}

/// Wall distances sensed relative to the robot's facing direction, each
/// clamped to the sensor range
///
/// This is the discretized state the Q-table is keyed by. It is recomputed
/// from the pose on every tick and never stored anywhere else.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct SensorState {
    pub front: i32,
    pub right: i32,
    pub back: i32,
    pub left: i32,
}

impl SensorState {
    /// Smallest of the four sensed distances
    pub fn min(&self) -> i32 {
        self.front.min(self.right).min(self.back).min(self.left)
    }
}

/// Which exploration policy the robot selects actions with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyKind {
    EpsilonGreedy,
    Softmax,
}

/// Which temporal-difference rule the robot updates values with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LearningRule {
    QLearning,
    Sarsa,
}

/// Learning sub-parameters of the simulation configuration
///
/// Values are trusted here; ranges are enforced by the configuration
/// collaborator and asserted once at construction.
#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub policy: PolicyKind,
    /// ε for [`PolicyKind::EpsilonGreedy`], τ for [`PolicyKind::Softmax`]
    pub param: f32,
    pub rule: LearningRule,
    pub alpha: f32,
    pub gamma: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::EpsilonGreedy,
            param: 0.1,
            rule: LearningRule::QLearning,
            alpha: 0.7,
            gamma: 0.99,
        }
    }
}

/// An exploration policy instantiated with its schedule
pub enum Policy<D: Decay> {
    EpsilonGreedy(EpsilonGreedy<D>),
    Softmax(Softmax<D>),
}

impl<D: Decay> Policy<D> {
    /// Select an action from a Q-table row
    ///
    /// Greedy ties break on the row's fixed action order: arbitrary, but
    /// deterministic given equal values.
    pub fn choose(&self, t: f32, values: &ActionValues) -> Action {
        match self {
            Self::EpsilonGreedy(policy) => match policy.choose(t) {
                Choice::Explore => random_action(),
                Choice::Exploit => greedy_action(values),
            },
            Self::Softmax(policy) => Action::from_repr(policy.choose(t, values))
                .expect("softmax returns an index into the row"),
        }
    }
}

fn random_action() -> Action {
    Action::iter()
        .choose(&mut thread_rng())
        .expect("`Action` has variants")
}

fn greedy_action(values: &ActionValues) -> Action {
    Action::iter()
        .max_by(|&a, &b| {
            values[a as usize]
                .partial_cmp(&values[b as usize])
                .expect("Q values are never NaN")
        })
        .expect("`Action` has variants")
}

/// A robot which should navigate in a world
///
/// Holds the learned action-value table and selects/learns actions under a
/// pluggable exploration policy and learning rule. The table grows lazily as
/// states are first seen and is never pruned; it is the learned policy.
///
/// Simple workflow: `choose_action` -> `learn` -> repeat. When the rule is
/// SARSA, `learn` runs a prospective selection for the next state and parks it
/// in a one-slot cache; the next `choose_action` call for that exact state
/// replays it instead of sampling twice.
pub struct Robot<D: Decay = decay::Constant> {
    q_table: HashMap<SensorState, ActionValues>,
    policy: Policy<D>,
    rule: LearningRule,
    alpha: f32, // learning rate
    gamma: f32, // discount factor
    pending: Option<(SensorState, Action)>,
    episode: u32,
}

impl Robot {
    /// Build a robot from the learning section of the simulation configuration
    ///
    /// **Panics** if `alpha` or `gamma` is outside `[0,1]`, if ε is outside
    /// `[0,1]`, or if τ is not positive.
    pub fn new(config: &AgentConfig) -> Self {
        let policy = match config.policy {
            PolicyKind::EpsilonGreedy => {
                assert_interval!(config.param, 0.0, 1.0);
                Policy::EpsilonGreedy(EpsilonGreedy::new(decay::Constant::new(config.param)))
            }
            PolicyKind::Softmax => {
                assert!(config.param > 0.0, "softmax temperature must be positive");
                Policy::Softmax(Softmax::new(decay::Constant::new(config.param)))
            }
        };
        Self::with_policy(policy, config.rule, config.alpha, config.gamma)
    }
}

impl<D: Decay> Robot<D> {
    /// Build a robot with a custom exploration schedule
    ///
    /// **Panics** if `alpha` or `gamma` is outside `[0,1]`
    pub fn with_policy(policy: Policy<D>, rule: LearningRule, alpha: f32, gamma: f32) -> Self {
        assert_interval!(alpha, 0.0, 1.0);
        assert_interval!(gamma, 0.0, 1.0);
        Self {
            q_table: HashMap::new(),
            policy,
            rule,
            alpha,
            gamma,
            pending: None,
            episode: 0,
        }
    }

    /// Take an action in `state`
    ///
    /// A state seen for the first time is initialized with all actions at
    /// value zero and answered with a uniformly random action; otherwise the
    /// exploration policy decides. A pending SARSA lookahead for this exact
    /// state is replayed instead; a pending lookahead for any other state is
    /// stale and dropped.
    pub fn choose_action(&mut self, state: SensorState) -> Action {
        if let Some((expected, action)) = self.pending.take() {
            if expected == state {
                return action;
            }
        }
        match self.q_table.entry(state) {
            Entry::Occupied(entry) => self.policy.choose(self.episode as f32, entry.get()),
            Entry::Vacant(entry) => {
                entry.insert([0.0; ACTIONS]);
                random_action()
            }
        }
    }

    /// Learn from the transition `state` --`action`--> `next_state` worth
    /// `reward`
    ///
    /// Applies `Q[s][a] += α(r + γ·target − Q[s][a])` where the target is the
    /// best next value (Q-learning) or the value of a prospectively selected
    /// next action (SARSA). An unseen `next_state` contributes a zero target.
    pub fn learn(&mut self, state: SensorState, action: Action, next_state: SensorState, reward: f32) {
        let target = match self.q_table.get(&next_state) {
            None => 0.0,
            Some(next_row) => match self.rule {
                LearningRule::QLearning => next_row
                    .iter()
                    .copied()
                    .max_by(|a, b| a.partial_cmp(b).expect("Q values are never NaN"))
                    .expect("rows are never empty"),
                LearningRule::Sarsa => {
                    let next_action = self.policy.choose(self.episode as f32, next_row);
                    self.pending = Some((next_state, next_action));
                    next_row[next_action as usize]
                }
            },
        };

        let row = self.q_table.entry(state).or_insert([0.0; ACTIONS]);
        let value = row[action as usize];
        row[action as usize] = value + self.alpha * (reward + self.gamma * target - value);
    }

    /// Advance the episode counter driving the exploration schedules
    pub fn end_episode(&mut self) {
        self.episode += 1;
    }

    pub fn q_table(&self) -> &HashMap<SensorState, ActionValues> {
        &self.q_table
    }

    /// Current estimate for `(state, action)`, zero if the state is unseen
    pub fn value(&self, state: SensorState, action: Action) -> f32 {
        self.q_table
            .get(&state)
            .map_or(0.0, |row| row[action as usize])
    }
}
