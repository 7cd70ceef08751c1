//! AI player driven by the regret-matching engine.

use super::card::Card;
use super::info_state::OfcInfoState;
use super::state::{Line, OfcState};
use super::GameError;
use crate::cfr::engine::RegretEngine;
use crate::cfr::game::{action_keys, Action, InfoState};

/// One card placed by the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// The card placed
    pub card: Card,
    /// Where it went
    pub line: Line,
    /// Information-set key of the decision
    pub state_key: String,
}

/// Places AI cards and feeds outcomes back as regret.
///
/// Every decision made since the last [`record_outcome`](Self::record_outcome)
/// is remembered so the outcome of the game can be credited to it.
#[derive(Debug)]
pub struct OfcAgent {
    engine: RegretEngine,
    trajectory: Vec<(String, Line)>,
}

impl OfcAgent {
    /// Create an agent around an engine.
    pub fn new(engine: RegretEngine) -> Self {
        Self {
            engine,
            trajectory: Vec::new(),
        }
    }

    /// Place the first card of the current hand on the AI table.
    ///
    /// The open lines are registered for the decision before a line is
    /// sampled, so a fresh information set starts out uniform.
    pub fn make_move(&mut self, state: &mut OfcState) -> Result<Placement, GameError> {
        let card = *state.current_hand.first().ok_or(GameError::EmptyHand)?;
        let info = OfcInfoState::new(state.round, card, &state.ai_table);
        let legal = info.open_lines();
        if legal.is_empty() {
            return Err(GameError::NoLegalLine);
        }

        let key = info.key();
        self.engine.register_actions(&key, action_keys(&legal));
        let action = self.engine.sample_action(&key)?;
        let line = Line::from_key(&action).ok_or(GameError::UnknownAction(action))?;

        state.ai_table.place(line, card)?;
        state.current_hand.remove(0);
        log::debug!("{:<32}{:<8}{:<8}", key, card.to_string(), line.key());

        self.trajectory.push((key.clone(), line));
        Ok(Placement {
            card,
            line,
            state_key: key,
        })
    }

    /// Place this round's cards and discard the rest of the hand.
    pub fn play_hand(&mut self, state: &mut OfcState) -> Result<Vec<Placement>, GameError> {
        let n = state.placements_this_round().min(state.current_hand.len());
        let placements = (0..n)
            .map(|_| self.make_move(state))
            .collect::<Result<Vec<_>, _>>()?;
        state.current_hand.clear();
        Ok(placements)
    }

    /// Credit `reward` as regret to every decision since the last call.
    ///
    /// Returns the number of decisions credited.
    pub fn record_outcome(&mut self, reward: f64) -> usize {
        let n = self.trajectory.len();
        for (key, line) in self.trajectory.drain(..) {
            self.engine.accumulate_regret(&key, &line.key(), reward);
        }
        n
    }

    /// Decisions waiting for an outcome.
    pub fn pending(&self) -> usize {
        self.trajectory.len()
    }

    /// Get reference to the engine.
    pub fn engine(&self) -> &RegretEngine {
        &self.engine
    }

    /// Get mutable reference to the engine.
    pub fn engine_mut(&mut self) -> &mut RegretEngine {
        &mut self.engine
    }

    /// Unwrap the engine.
    pub fn into_engine(self) -> RegretEngine {
        self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::config::EngineConfig;
    use crate::games::ofc::state::{Table, FIRST_HAND_SIZE, MAX_ROUNDS};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn agent() -> OfcAgent {
        OfcAgent::new(RegretEngine::new(EngineConfig::default().with_seed(11)))
    }

    #[test]
    fn test_make_move_places_first_card() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = OfcState::new(&mut rng);
        let first = state.current_hand[0];
        let mut agent = agent();

        let placement = agent.make_move(&mut state).unwrap();
        assert_eq!(placement.card, first);
        assert_eq!(state.current_hand.len(), FIRST_HAND_SIZE - 1);
        assert_eq!(state.ai_table.line(placement.line), &[first]);
        assert_eq!(agent.engine().actions(&placement.state_key).len(), 3);
        assert_eq!(agent.pending(), 1);
    }

    #[test]
    fn test_make_move_errors() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = OfcState::new(&mut rng);
        let mut agent = agent();

        state.current_hand.clear();
        assert!(matches!(agent.make_move(&mut state), Err(GameError::EmptyHand)));

        state.current_hand = vec![Card::parse("2♠").unwrap()];
        state.ai_table = Table {
            top: state.deck.take(3),
            middle: state.deck.take(5),
            bottom: state.deck.take(5),
        };
        assert!(matches!(agent.make_move(&mut state), Err(GameError::NoLegalLine)));
    }

    #[test]
    fn test_full_game_fills_table() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut state = OfcState::new(&mut rng);
        let mut agent = agent();

        agent.play_hand(&mut state).unwrap();
        while !state.is_over() {
            state.deal_next_hand().unwrap();
            agent.play_hand(&mut state).unwrap();
        }

        assert_eq!(state.round, MAX_ROUNDS);
        assert!(state.ai_table.is_complete());
        assert!(state.current_hand.is_empty());
        assert_eq!(agent.pending(), 13);
    }

    #[test]
    fn test_outcome_becomes_regret() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = OfcState::new(&mut rng);
        let mut agent = agent();

        let placement = agent.make_move(&mut state).unwrap();
        assert_eq!(agent.record_outcome(2.5), 1);
        assert_eq!(agent.pending(), 0);

        let regret = agent
            .engine()
            .regret(&placement.state_key, &placement.line.key());
        assert_eq!(regret, Some(2.5));

        // The rewarded line now carries all the positive regret.
        let strategy = agent
            .engine_mut()
            .compute_strategy(&placement.state_key)
            .unwrap();
        assert_eq!(strategy[&placement.line.key()], 1.0);
    }
}
