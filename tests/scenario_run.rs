use sonarnav::scenario::ScenarioConfig;
use sonarnav::simulation::SimulationEngine;

const NEAR_FISH: &str = r#"
meta: { version: "1", name: near-fish }
sim: { turns: 30, seed: 3 }
drones:
  - { id: 0, pos: { x: 2000, y: 2000 } }
  - { id: 2, pos: { x: 7999, y: 2000 } }
creatures:
  - { id: 4, kind: 0, pos: { x: 2000, y: 2600 }, vel: { x: 100.0, y: 0.0 } }
  - { id: 5, kind: 0, pos: { x: 7999, y: 2600 }, vel: { x: -100.0, y: 0.0 } }
  - { id: 6, kind: 2, pos: { x: 5000, y: 9000 } }
  - { id: 7, kind: -1, pos: { x: 5000, y: 6000 } }
"#;

#[test]
fn test_demo_scenario_runs_to_completion() {
    let scenario = ScenarioConfig::from_file("scenarios/demo.yaml").unwrap();
    let turns = scenario.sim.turns;
    let map_size = scenario.engine.map_size;

    let mut engine = SimulationEngine::new(scenario, 0);
    let stats = engine.run().unwrap();

    assert_eq!(stats.turns, turns);
    assert!(engine.drones.iter().all(|d| d.position.is_on_map(map_size)));
}

#[test]
fn test_nearby_fish_are_scanned() {
    let scenario = ScenarioConfig::from_yaml_str(NEAR_FISH).unwrap();
    let mut engine = SimulationEngine::new(scenario, 0);
    let stats = engine.run().unwrap();

    assert_eq!(stats.turns, 30);
    assert!(stats.scans >= 2);
    assert!(engine.scanned.contains(&4));
    assert!(engine.scanned.contains(&5));
}

#[test]
fn test_same_seed_gives_same_run() {
    let run = || {
        let scenario = ScenarioConfig::from_yaml_str(NEAR_FISH).unwrap();
        let mut engine = SimulationEngine::new(scenario, 0);
        let stats = engine.run().unwrap();
        let positions: Vec<_> = engine.drones.iter().map(|d| d.position).collect();
        (stats, positions)
    };
    assert_eq!(run(), run());
}
