/// Simulation configuration and the grid-file loader
pub mod config;

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// Exploration policies
pub mod exploration;

/// The learning agent: Q-table, action selection, update rules
pub mod robot;

/// Grid geometry, transition dynamics, reward shaping, episode bookkeeping
pub mod world;

mod util;
