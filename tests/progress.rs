//! End-to-end: train a few games, persist, restore into a fresh engine.

use ofc_regret::cfr::{EngineConfig, EngineError, RegretEngine};
use ofc_regret::games::ofc::{OfcAgent, OfcState};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn scratch_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("ofc-regret-it-{}-{}", std::process::id(), name))
}

#[test]
fn trained_tables_survive_restart() {
    let dir = scratch_dir("restart");
    let path = dir.join("nested").join("ai_progress.json");
    let config = EngineConfig::default().with_seed(17).with_progress_path(&path);

    let mut rng = StdRng::seed_from_u64(17);
    let mut agent = OfcAgent::new(RegretEngine::open(config.clone()).unwrap());
    assert_eq!(agent.engine().num_states(), 0);

    for game in 0..20 {
        let mut state = OfcState::new(&mut rng);
        agent.play_hand(&mut state).unwrap();
        while !state.is_over() {
            state.deal_next_hand().unwrap();
            agent.play_hand(&mut state).unwrap();
        }
        let reward = if game % 2 == 0 { 1.0 } else { -1.0 };
        assert_eq!(agent.record_outcome(reward), 13);
    }

    let engine = agent.into_engine();
    assert!(engine.num_states() > 0);
    engine.save().unwrap();

    let restored = RegretEngine::open(config).unwrap();
    assert_eq!(restored.storage(), engine.storage());

    // Every state seen in play has a valid average strategy.
    for state in engine.storage().regrets().keys() {
        let average = restored.average_strategy(state).unwrap();
        let sum: f64 = average.values().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn unregistered_state_is_reported() {
    let mut engine = RegretEngine::new(EngineConfig::default());
    let err = engine.sample_action("r9|c0|0-0-0").unwrap_err();
    assert!(matches!(err, EngineError::EmptyActionSet { .. }));
    assert!(err.to_string().contains("r9|c0|0-0-0"));
}
