use corridor::config::{GridConfig, SimConfig};
use corridor::robot::{AgentConfig, LearningRule, PolicyKind};
use corridor::world::World;

fn reference_config() -> SimConfig {
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
        agent: AgentConfig {
            policy: PolicyKind::EpsilonGreedy,
            param: 0.1,
            rule: LearningRule::QLearning,
            alpha: 0.5,
            gamma: 0.9,
        },
    }
}

#[test]
fn a_thousand_ticks_stay_in_bounds_with_periodic_episodes() {
    let mut world = World::new(reference_config());
    for tick in 1..=1000u32 {
        let outcome = world.step();
        let pose = world.pose();
        assert!((0..10).contains(&pose.x), "x out of bounds at tick {tick}");
        assert!((0..10).contains(&pose.y), "y out of bounds at tick {tick}");
        assert_eq!(outcome.episode_ended, tick % 20 == 0);
    }
    assert_eq!(world.reward_history().len(), 50);

    // distances clamp to [0, D], so the table can never outgrow (D+1)^4 states
    assert!(world.robot().q_table().len() <= 6usize.pow(4));
}

#[test]
fn softmax_sarsa_runs_the_same_scenario() {
    let mut config = reference_config();
    config.agent.policy = PolicyKind::Softmax;
    config.agent.param = 2.0;
    config.agent.rule = LearningRule::Sarsa;

    let mut world = World::new(config);
    for tick in 1..=1000u32 {
        let outcome = world.step();
        assert_eq!(outcome.episode_ended, tick % 20 == 0);
    }
    assert_eq!(world.reward_history().len(), 50);
}
