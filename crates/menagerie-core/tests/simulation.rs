//! End-to-end tests for the tick cycle: contention for resources,
//! consumption, evolution, and degenerate areas.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use menagerie_agents::{EvolutionConfig, RequirementConfig};
use menagerie_core::{
    ClipTable, Collaborators, NotificationSink, PersistenceHook, Simulation, SimulationConfig,
};
use menagerie_types::{AgentId, AgentKey, BehaviorState, ResourceKind, Vec2};
use menagerie_world::InMemoryPool;

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Consumed(ResourceKind),
    Evolving(u32),
    Evolved(AgentId, AgentId),
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Event>>>);

impl Recorder {
    fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

impl NotificationSink for Recorder {
    fn on_consumed(&mut self, kind: ResourceKind) {
        self.0.lock().unwrap().push(Event::Consumed(kind));
    }

    fn on_evolution_triggered(&mut self, level: u32) {
        self.0.lock().unwrap().push(Event::Evolving(level));
    }

    fn on_state_changed(&mut self, _state: BehaviorState) {}
}

impl PersistenceHook for Recorder {
    fn on_evolved(&mut self, old: &AgentId, new: &AgentId) {
        self.0
            .lock()
            .unwrap()
            .push(Event::Evolved(old.clone(), new.clone()));
    }
}

fn base_config() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.spawning.resource_interval_secs = 0.0;
    config.spawning.initial_agents = 0;
    config.vitals.starting_hunger = 40.0;
    config
}

fn build(config: &SimulationConfig) -> (Simulation, Recorder) {
    let recorder = Recorder::default();
    let collaborators = Collaborators {
        pool: Box::new(InMemoryPool::new(config.spawning.pool_capacity)),
        clips: Box::new(ClipTable::default()),
        persistence: Box::new(recorder.clone()),
        sink: Box::new(recorder.clone()),
    };
    (Simulation::new(config, collaborators), recorder)
}

fn run(sim: &mut Simulation, ticks: u32, dt: f32) {
    for _ in 0..ticks {
        let summary = sim.run_tick(dt).unwrap();
        assert_eq!(summary.failures, 0);
    }
}

fn ground_y(sim: &Simulation, config: &SimulationConfig) -> f32 {
    sim.bounds().ground(config.spawning.agent_extent()).center().y
}

fn hunger(sim: &Simulation, key: AgentKey) -> f32 {
    sim.agent(key).map(|a| a.vitals.hunger).unwrap()
}

#[test]
fn only_one_agent_gets_a_contested_resource() {
    let config = base_config();
    let (mut sim, recorder) = build(&config);
    let y = ground_y(&sim, &config);
    let first = sim.spawn_agent(Some(Vec2::new(0.0, y)));
    let second = sim.spawn_agent(Some(Vec2::new(15.0, y)));
    let food = sim.spawn_resource(ResourceKind::Food, Vec2::new(5.0, y)).unwrap();

    run(&mut sim, 1, 0.1);
    assert_eq!(sim.registry().owner_of(food), Some(first));
    assert_eq!(sim.agent(first).map(|a| a.state()), Some(BehaviorState::Eating));
    assert!(sim.agent(second).is_some_and(|a| !a.seek.is_consuming()));

    // Eating lasts at most three seconds.
    run(&mut sim, 40, 0.1);
    assert!(sim.registry().is_empty());
    assert_eq!(recorder.count(|e| matches!(e, Event::Consumed(_))), 1);
    assert!(hunger(&sim, first) > 60.0);
    assert!(hunger(&sim, second) < 40.0);
    let consumed = sim.agent(first).map(|a| a.evolution.counters.resources_consumed);
    assert_eq!(consumed, Some(1));
}

#[test]
fn despawned_resource_cancels_the_meal() {
    let config = base_config();
    let (mut sim, recorder) = build(&config);
    let y = ground_y(&sim, &config);
    let key = sim.spawn_agent(Some(Vec2::new(0.0, y)));
    let food = sim.spawn_resource(ResourceKind::Food, Vec2::new(5.0, y)).unwrap();

    run(&mut sim, 1, 0.1);
    assert!(sim.agent(key).is_some_and(|a| a.seek.consuming == Some(food)));
    assert_eq!(sim.queue().len(), 1);

    assert!(sim.despawn_resource(food));
    assert!(!sim.despawn_resource(food));
    assert!(sim.queue().is_empty());
    let agent = sim.agent(key).unwrap();
    assert!(agent.seek.claimed.is_none() && !agent.seek.is_consuming());
    assert_eq!(agent.state(), BehaviorState::Idle);

    run(&mut sim, 40, 0.1);
    assert!(recorder.events().is_empty());
    assert!(hunger(&sim, key) < 40.0);
}

#[test]
fn despawned_resource_clears_the_approach() {
    let config = base_config();
    let (mut sim, _recorder) = build(&config);
    let y = ground_y(&sim, &config);
    let key = sim.spawn_agent(Some(Vec2::new(0.0, y)));
    let food = sim.spawn_resource(ResourceKind::Food, Vec2::new(250.0, y)).unwrap();

    run(&mut sim, 1, 0.1);
    assert_eq!(sim.agent(key).and_then(|a| a.move_target), Some(Vec2::new(250.0, y)));

    assert!(sim.despawn_resource(food));
    assert!(sim.agent(key).is_some_and(|a| a.move_target.is_none()));

    run(&mut sim, 5, 0.1);
    let target = sim.agent(key).and_then(|a| a.move_target);
    assert_ne!(target, Some(Vec2::new(250.0, y)));
    assert!(sim.agent(key).is_some_and(|a| a.seek.claimed.is_none()));
}

#[test]
fn despawned_agent_mid_meal_drops_its_continuations() {
    let config = base_config();
    let (mut sim, recorder) = build(&config);
    let y = ground_y(&sim, &config);
    let key = sim.spawn_agent(Some(Vec2::new(0.0, y)));
    let food = sim.spawn_resource(ResourceKind::Food, Vec2::new(5.0, y)).unwrap();

    run(&mut sim, 1, 0.1);
    sim.interact(key).unwrap();
    assert!(sim.agent(key).is_some_and(|a| a.seek.consuming == Some(food)));
    assert_eq!(sim.queue().len(), 2);

    assert!(sim.despawn_agent(key).is_some());
    assert!(sim.queue().is_empty());
    assert!(sim.registry().get(food).is_some());
    assert_eq!(sim.registry().owner_of(food), None);

    run(&mut sim, 40, 0.1);
    assert!(sim.registry().get(food).is_some());
    assert!(recorder.events().is_empty());
}

#[test]
fn despawned_agent_releases_its_claim() {
    let config = base_config();
    let (mut sim, _recorder) = build(&config);
    let y = ground_y(&sim, &config);
    let key = sim.spawn_agent(Some(Vec2::new(0.0, y)));
    let food = sim.spawn_resource(ResourceKind::Food, Vec2::new(200.0, y)).unwrap();

    run(&mut sim, 1, 0.1);
    assert_eq!(sim.registry().owner_of(food), Some(key));

    assert!(sim.despawn_agent(key).is_some());
    assert_eq!(sim.registry().owner_of(food), None);
    assert!(sim.agents().is_empty());
}

fn time_gated_config(min_time_alive: f32) -> SimulationConfig {
    let mut config = base_config();
    config.vitals.starting_hunger = 100.0;
    config.evolution = EvolutionConfig {
        check_interval_secs: 5.0,
        interaction_delay_secs: 2.0,
        requirements: vec![RequirementConfig {
            target_level: 2,
            min_time_alive,
            ..RequirementConfig::default()
        }],
    };
    config
}

#[test]
fn evolution_happens_exactly_once_when_due() {
    let config = time_gated_config(10.0);
    let (mut sim, recorder) = build(&config);
    let key = sim.spawn_agent(None);
    let old_id = sim.agent(key).map(|a| a.id.clone()).unwrap();

    // One second short of the requirement.
    run(&mut sim, 9, 1.0);
    assert_eq!(sim.agent(key).map(|a| a.level), Some(1));

    run(&mut sim, 1, 1.0);
    let agent = sim.agent(key).unwrap();
    assert_eq!(agent.level, 2);
    assert!(!agent.is_evolving());
    let new_id = agent.id.clone();
    assert_eq!(new_id.level(), Some(2));
    assert_eq!(new_id.token(), old_id.token());

    // The old id no longer resolves; the new one does.
    assert!(sim.agent_by_id(&old_id).is_none());
    assert_eq!(sim.agent_by_id(&new_id).map(|a| a.key), Some(key));
    assert!(sim.interact_by_id(&old_id).is_err());
    assert_eq!(sim.agents().indexed_ids(), sim.agents().len());

    // No level 3 is defined: nothing further happens.
    run(&mut sim, 30, 1.0);
    assert_eq!(sim.agent(key).map(|a| a.level), Some(2));
    assert_eq!(
        recorder.events(),
        vec![Event::Evolving(2), Event::Evolved(old_id, new_id)]
    );
}

#[test]
fn evolution_lock_blocks_reentry() {
    let config = time_gated_config(0.0);
    let (mut sim, recorder) = build(&config);
    let key = sim.spawn_agent(None);

    if let Some(agent) = sim.agent_mut(key) {
        agent.evolution.evolving = true;
    }
    assert!(!sim.trigger_evolution(key).unwrap());
    assert_eq!(sim.agent(key).map(|a| a.level), Some(1));

    if let Some(agent) = sim.agent_mut(key) {
        agent.evolution.evolving = false;
    }
    assert!(sim.trigger_evolution(key).unwrap());
    assert!(!sim.trigger_evolution(key).unwrap());
    assert_eq!(recorder.count(|e| matches!(e, Event::Evolving(_))), 1);
}

#[test]
fn interaction_recheck_evolves_once_safe() {
    let mut config = time_gated_config(0.0);
    config.evolution.check_interval_secs = 1_000.0;
    if let Some(req) = config.evolution.requirements.first_mut() {
        req.min_interactions = 1;
    }
    let (mut sim, _recorder) = build(&config);
    let key = sim.spawn_agent(None);

    sim.interact(key).unwrap();
    assert_eq!(sim.agent(key).map(|a| a.state()), Some(BehaviorState::Playing));

    // Before the delay elapses nothing is re-checked.
    run(&mut sim, 15, 0.1);
    assert_eq!(sim.agent(key).map(|a| a.level), Some(1));

    // Playing lasts at most three seconds, then the armed re-check runs.
    run(&mut sim, 30, 0.1);
    assert_eq!(sim.agent(key).map(|a| a.level), Some(2));
}

#[test]
fn degenerate_area_keeps_agents_valid() {
    let mut config = base_config();
    config.spawning.initial_agents = 4;
    config.spawning.resource_interval_secs = 0.5;
    let (mut sim, _recorder) = build(&config);
    sim.spawn_initial_agents();

    for area in [Vec2::ZERO, Vec2::new(1.0, 1.0), Vec2::new(30.0, 8.0), Vec2::new(-5.0, f32::NAN)] {
        sim.set_area_size(area);
        run(&mut sim, 20, 0.1);
        let flying = sim.bounds().flying(config.spawning.agent_extent());
        assert!(flying.is_valid());
        for agent in sim.agents().iter() {
            assert!(agent.position.is_finite());
            assert!(flying.contains(agent.position), "{area:?}: {:?}", agent.position);
        }
    }
}

#[test]
fn same_seed_same_run() {
    let mut config = base_config();
    config.spawning.initial_agents = 5;
    config.spawning.resource_interval_secs = 1.0;

    let snapshot = |config: &SimulationConfig| {
        let (mut sim, _recorder) = build(config);
        sim.spawn_initial_agents();
        run(&mut sim, 200, 0.1);
        sim.agents()
            .iter()
            .map(|a| (a.id.clone(), a.position, a.state()))
            .collect::<Vec<_>>()
    };

    assert_eq!(snapshot(&config), snapshot(&config));
}
