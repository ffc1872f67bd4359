//! Random agent for baseline comparisons

use std::marker::PhantomData;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use rna_design_core::{ActionSpace, Agent, DiscreteAction, DiscreteSpace, Observation, Result};
use rna_design_env::{WindowedObservation, NUM_ACTIONS};

/// Agent that selects actions uniformly at random, ignoring observations
pub struct RandomAgent<O = WindowedObservation, R = ChaCha8Rng> {
    action_space: DiscreteSpace,
    rng: R,
    _observation: PhantomData<fn(&O)>,
}

impl<O> RandomAgent<O, ChaCha8Rng> {
    /// Reproducible agent over the design action table
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(DiscreteSpace::new(NUM_ACTIONS), ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<O, R: Rng> RandomAgent<O, R> {
    /// Create a new random agent over `action_space`
    pub fn new(action_space: DiscreteSpace, rng: R) -> Self {
        Self {
            action_space,
            rng,
            _observation: PhantomData,
        }
    }

    /// Action space the agent samples from
    pub fn action_space(&self) -> &DiscreteSpace {
        &self.action_space
    }
}

impl<O, R> Agent for RandomAgent<O, R>
where
    O: Observation,
    R: Rng + Send,
{
    type Observation = O;
    type Action = DiscreteAction;

    fn act(&mut self, _observation: &Self::Observation) -> Result<Self::Action> {
        Ok(self.action_space.sample_with(&mut self.rng))
    }
}
