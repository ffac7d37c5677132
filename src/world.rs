use log::{debug, info};
use strum::{EnumIter, FromRepr};

use crate::config::SimConfig;
use crate::robot::{Action, Robot, SensorState};

/// Reward when any sensed distance falls below the inner corridor bound or
/// the robot is about to leave the grid. Dwarfs every shaping term below.
pub const HARD_PENALTY: f32 = -100.0;
/// Base cost of every step, discourages dithering
pub const STEP_PENALTY: f32 = -0.5;
/// Bonus when the right-hand distance is the smallest of the four
/// (wall-following)
pub const WALL_FOLLOW_BONUS: f32 = 1.0;
/// Bonus when the right-hand distance lies inside the corridor band
pub const CORRIDOR_BONUS: f32 = 2.0;
/// Extra bonus when the back distance is inside the band as well (the robot
/// is riding the corridor, not just crossing it)
pub const STABILITY_BONUS: f32 = 1.5;
/// Penalty when the front distance is in the band but the right is not:
/// the robot is heading along the corridor with the wall on the wrong side
pub const DRIFT_PENALTY: f32 = -0.25;

/// Where the robot faces; cyclic for left/right turns
#[derive(EnumIter, FromRepr, Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Orientation {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Orientation {
    pub fn left(self) -> Self {
        Self::from_repr((self as usize + 3) % 4).expect("cyclic")
    }

    pub fn right(self) -> Self {
        Self::from_repr((self as usize + 1) % 4).expect("cyclic")
    }

    /// One-cell displacement in this direction; north is decreasing `y`
    pub fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }
}

/// Robot position and facing, owned exclusively by the world
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pose {
    pub x: i32,
    pub y: i32,
    pub facing: Orientation,
}

/// What a renderer finds in one viewport cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Void,
    Empty,
    Robot(Orientation),
}

/// A fixed-size destination buffer for [`World::fill_visible`]
pub struct Viewport {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl Viewport {
    /// **Panics** if either dimension is not positive
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0, "viewport dimensions must be positive");
        Self {
            width,
            height,
            cells: vec![Cell::Void; (width * height) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn get(&self, x: i32, y: i32) -> Cell {
        assert!((0..self.width).contains(&x) && (0..self.height).contains(&y));
        self.cells[(y * self.width + x) as usize]
    }

    fn set(&mut self, x: i32, y: i32, cell: Cell) {
        self.cells[(y * self.width + x) as usize] = cell;
    }
}

/// What one tick of the simulation reports to the driving loop
///
/// On an episode boundary `reward` is the completed episode's total;
/// otherwise it is the running total of the episode in progress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutcome {
    pub episode_ended: bool,
    pub reward: f32,
    pub action: Action,
}

const START_FACING: Orientation = Orientation::South;

/// Holds the definitions for the simulated world: grid geometry, the actual
/// robot pose (the robot itself knows only what its sensors provide), episode
/// bookkeeping, and the robot instance it drives
///
/// Simple workflow: `new` -> [a:] `step` -> [`fill_visible` et al.] -> goto a
pub struct World {
    width: i32,
    height: i32,
    sensor_range: i32,
    inner: i32,
    outer: i32,
    runs: u32,
    start: Pose,
    pose: Pose,
    tick: u32,
    episode_reward: f32,
    history: Vec<f32>,
    robot: Robot,
    last_action: Option<Action>,
}

impl World {
    /// Build a world (and its robot) from a simulation configuration
    ///
    /// **Panics** on geometry the grid-file loader would have rejected; the
    /// configuration is trusted pre-validated input.
    pub fn new(config: SimConfig) -> Self {
        let grid = config.grid;
        assert!(grid.width > 0 && grid.height > 0, "grid must be non-empty");
        assert!(grid.sensor_range >= 0, "sensor range must be non-negative");
        assert!(
            0 <= grid.inner && grid.inner <= grid.outer,
            "corridor bounds must satisfy 0 <= d1 <= d2"
        );
        assert!(
            (0..grid.width).contains(&grid.start_x) && (0..grid.height).contains(&grid.start_y),
            "start position must be inside the grid"
        );
        assert!(config.runs > 0, "episodes must have at least one step");

        let start = Pose {
            x: grid.start_x,
            y: grid.start_y,
            facing: START_FACING,
        };
        info!(
            "new world: {}x{} grid, corridor [{}, {}], {} steps per episode",
            grid.width, grid.height, grid.inner, grid.outer, config.runs
        );
        Self {
            width: grid.width,
            height: grid.height,
            sensor_range: grid.sensor_range,
            inner: grid.inner,
            outer: grid.outer,
            runs: config.runs,
            start,
            pose: start,
            tick: 0,
            episode_reward: 0.0,
            history: Vec::new(),
            robot: Robot::new(&config.agent),
            last_action: None,
        }
    }

    /// Advance the simulation by one tick
    ///
    /// Senses the current state, asks the robot for an action, applies it to
    /// the pose, rewards the new state, and drives the robot's learning
    /// update. When the tick count reaches the configured episode length the
    /// pose and orientation are restored to their start values, the completed
    /// episode total is appended to the history, and the accumulator clears.
    ///
    /// Not reentrant; the caller guarantees one invocation at a time.
    pub fn step(&mut self) -> StepOutcome {
        self.tick += 1;

        let state = self.sense();
        let action = self.robot.choose_action(state);
        self.apply(action);
        let next_state = self.sense();
        let reward = self.shaped_reward(next_state);
        self.episode_reward += reward;
        self.robot.learn(state, action, next_state, reward);
        self.last_action = Some(action);

        if self.tick >= self.runs {
            let completed = self.episode_reward;
            self.history.push(completed);
            self.episode_reward = 0.0;
            self.tick = 0;
            self.pose = self.start;
            self.robot.end_episode();
            debug!(
                "episode {} finished with reward {:.2}",
                self.history.len(),
                completed
            );
            return StepOutcome {
                episode_ended: true,
                reward: completed,
                action,
            };
        }

        StepOutcome {
            episode_ended: false,
            reward: self.episode_reward,
            action,
        }
    }

    /// Fill `view` with the part of the world a renderer should show
    ///
    /// The viewport is the tile-aligned window (tile size = viewport size)
    /// whose origin is the largest multiple of the tile size not exceeding
    /// the robot's position, so the robot is always inside it.
    pub fn fill_visible(&self, view: &mut Viewport) {
        let ox = (self.pose.x / view.width) * view.width;
        let oy = (self.pose.y / view.height) * view.height;
        for j in 0..view.height {
            for i in 0..view.width {
                view.set(i, j, self.at(ox + i, oy + j));
            }
        }
    }

    /// Returns what can be found at `(x, y)`
    fn at(&self, x: i32, y: i32) -> Cell {
        if (x, y) == (self.pose.x, self.pose.y) {
            return Cell::Robot(self.pose.facing);
        }
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return Cell::Void;
        }
        Cell::Empty
    }

    /// Wall distances relative to the current facing, clamped to the sensor
    /// range
    fn sense(&self) -> SensorState {
        let Pose { x, y, facing } = self.pose;
        let north = y;
        let south = self.height - 1 - y;
        let east = self.width - 1 - x;
        let west = x;
        let (front, right, back, left) = match facing {
            Orientation::North => (north, east, south, west),
            Orientation::East => (east, south, west, north),
            Orientation::South => (south, west, north, east),
            Orientation::West => (west, north, east, south),
        };
        SensorState {
            front: front.min(self.sensor_range),
            right: right.min(self.sensor_range),
            back: back.min(self.sensor_range),
            left: left.min(self.sensor_range),
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Forward => {
                let (dx, dy) = self.pose.facing.offset();
                self.pose.x = (self.pose.x + dx).clamp(0, self.width - 1);
                self.pose.y = (self.pose.y + dy).clamp(0, self.height - 1);
            }
            Action::TurnLeft => self.pose.facing = self.pose.facing.left(),
            Action::TurnRight => self.pose.facing = self.pose.facing.right(),
        }
    }

    /// Shaped reward for a sensed state
    ///
    /// Incentive ordering: corridor bonus > wall-following bonus > step
    /// penalty > drift penalty, all dwarfed by the hard violation penalty.
    fn shaped_reward(&self, s: SensorState) -> f32 {
        if s.min() < self.inner || s.front == 0 {
            return HARD_PENALTY;
        }

        let in_band = |d: i32| self.inner <= d && d <= self.outer;
        let mut reward = STEP_PENALTY;
        if s.right <= s.front && s.right <= s.back && s.right <= s.left {
            reward += WALL_FOLLOW_BONUS;
        }
        if in_band(s.right) {
            reward += CORRIDOR_BONUS;
            if in_band(s.back) {
                reward += STABILITY_BONUS;
            }
        } else if in_band(s.front) {
            reward += DRIFT_PENALTY;
        }
        reward
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Ticks elapsed in the episode in progress
    pub fn tick(&self) -> u32 {
        self.tick
    }

    /// Running reward total of the episode in progress
    pub fn episode_reward(&self) -> f32 {
        self.episode_reward
    }

    /// Cumulative rewards of completed episodes, in order
    pub fn reward_history(&self) -> &[f32] {
        &self.history
    }

    /// Action taken on the most recent tick, for textual counters
    pub fn last_action(&self) -> Option<Action> {
        self.last_action
    }

    pub fn robot(&self) -> &Robot {
        &self.robot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::robot::AgentConfig;
    use strum::IntoEnumIterator;

    fn config() -> SimConfig {
        SimConfig {
            grid: GridConfig {
                width: 10,
                height: 10,
                sensor_range: 5,
                start_x: 5,
                start_y: 5,
                inner: 1,
                outer: 3,
            },
            runs: 20,
            agent: AgentConfig::default(),
        }
    }

    fn state(front: i32, right: i32, back: i32, left: i32) -> SensorState {
        SensorState {
            front,
            right,
            back,
            left,
        }
    }

    #[test]
    fn episode_resets_after_configured_runs() {
        let mut world = World::new(config());
        for _ in 0..19 {
            let outcome = world.step();
            assert!(!outcome.episode_ended);
        }
        let outcome = world.step();
        assert!(outcome.episode_ended);
        assert_eq!(world.pose(), Pose { x: 5, y: 5, facing: START_FACING });
        assert_eq!(world.tick(), 0);
        assert_eq!(world.reward_history(), &[outcome.reward]);
        assert_eq!(world.episode_reward(), 0.0);
    }

    #[test]
    fn reported_reward_is_the_running_total() {
        let mut world = World::new(config());
        let mut total = 0.0;
        for _ in 0..19 {
            let outcome = world.step();
            let delta = outcome.reward - total;
            total = outcome.reward;
            // every per-tick reward is one of the shaped values, all well
            // above the hard penalty or exactly it
            assert!(delta >= HARD_PENALTY - 1e-3);
        }
        let outcome = world.step();
        assert!(outcome.episode_ended);
        assert!(outcome.reward >= total + HARD_PENALTY - 1e-3);
    }

    #[test]
    fn hard_penalty_dominates_everything() {
        let world = World::new(config());
        // a coordinate below the inner bound
        assert_eq!(world.shaped_reward(state(5, 0, 5, 5)), HARD_PENALTY);
        assert_eq!(world.shaped_reward(state(5, 5, 0, 5)), HARD_PENALTY);
        // front wall contact, everything else comfortable
        assert_eq!(world.shaped_reward(state(0, 2, 2, 2)), HARD_PENALTY);
    }

    #[test]
    fn corridor_shaping_rewards_the_right_hand_band() {
        let world = World::new(config());
        // right-hand distance inside [1,3], also the minimum, back in band
        let riding = world.shaped_reward(state(5, 2, 2, 5));
        assert_eq!(
            riding,
            STEP_PENALTY + WALL_FOLLOW_BONUS + CORRIDOR_BONUS + STABILITY_BONUS
        );
        // front in the band while right is not
        let drifting = world.shaped_reward(state(2, 5, 4, 4));
        assert_eq!(drifting, STEP_PENALTY + DRIFT_PENALTY);
        // nothing special: all distances far from walls and band
        let open = world.shaped_reward(state(5, 5, 4, 4));
        assert_eq!(open, STEP_PENALTY);
    }

    #[test]
    fn sense_matches_grid_geometry() {
        let mut world = World::new(config());
        world.pose = Pose { x: 2, y: 3, facing: Orientation::East };
        // north=3 south=6 east=7 west=2, clamped to D=5
        assert_eq!(world.sense(), state(5, 5, 2, 3));
        world.pose.facing = Orientation::North;
        assert_eq!(world.sense(), state(3, 5, 5, 2));
    }

    #[test]
    fn forward_is_clamped_at_the_grid_edge() {
        let mut world = World::new(config());
        world.pose = Pose { x: 0, y: 0, facing: Orientation::North };
        world.apply(Action::Forward);
        assert_eq!((world.pose.x, world.pose.y), (0, 0));
        world.pose.facing = Orientation::West;
        world.apply(Action::Forward);
        assert_eq!((world.pose.x, world.pose.y), (0, 0));
    }

    #[test]
    fn turns_cycle_through_orientations() {
        for facing in Orientation::iter() {
            assert_eq!(facing.left().right(), facing);
            assert_eq!(facing.right().right().right().right(), facing);
        }
        assert_eq!(Orientation::North.right(), Orientation::East);
        assert_eq!(Orientation::North.left(), Orientation::West);
    }

    #[test]
    fn viewport_always_contains_the_robot() {
        let mut world = World::new(config());
        let mut view = Viewport::new(4, 3);
        for _ in 0..200 {
            world.step();
            world.fill_visible(&mut view);
            let pose = world.pose();
            let cell = view.get(pose.x % view.width(), pose.y % view.height());
            assert!(matches!(cell, Cell::Robot(_)));
        }
    }

    #[test]
    fn viewport_voids_cells_outside_the_grid() {
        let world = World::new(config());
        // 12x12 viewport over a 10x10 grid: origin is (0,0), the far strip is
        // outside the world
        let mut view = Viewport::new(12, 12);
        world.fill_visible(&mut view);
        for i in 0..12 {
            assert_eq!(view.get(11, i), Cell::Void);
            assert_eq!(view.get(i, 11), Cell::Void);
        }
        assert_eq!(view.get(0, 0), Cell::Empty);
        assert_eq!(view.get(5, 5), Cell::Robot(START_FACING));
    }
}
