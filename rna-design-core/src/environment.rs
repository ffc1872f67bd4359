//! Environment traits and types

use serde::{Deserialize, Serialize};

use crate::{Action, ActionSpace, Observation, Reward};

/// Result of a single environment step
#[derive(Debug, Clone)]
pub struct Step<O> {
    /// Next observation, `None` once the episode is done
    pub observation: Option<O>,
    /// Reward signal
    pub reward: Reward,
    /// Whether the episode is done
    pub done: bool,
    /// Additional info from the environment
    pub info: StepInfo,
}

impl<O> Step<O> {
    /// Non-terminal step carrying the next observation and zero reward
    pub fn running(observation: O) -> Self {
        Self {
            observation: Some(observation),
            reward: Reward::zero(),
            done: false,
            info: StepInfo::default(),
        }
    }

    /// Terminal step without an observation
    pub fn terminal(reward: Reward, info: StepInfo) -> Self {
        Self {
            observation: None,
            reward,
            done: true,
            info,
        }
    }
}

/// Additional information from a step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepInfo {
    /// Custom fields
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl StepInfo {
    /// Insert a field, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Look up a field
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }
}

/// Episode information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    /// Episode ID
    pub id: String,
    /// Total reward
    pub total_reward: f64,
    /// Number of steps
    pub steps: usize,
    /// Start time
    pub start_time: chrono::DateTime<chrono::Utc>,
    /// End time
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
    /// Info attached to the terminal step
    pub final_info: Option<StepInfo>,
}

/// Core environment trait
///
/// Environments are synchronous: `step` blocks until the environment has
/// produced its result, including any external computation on the terminal
/// step.
pub trait Environment: Send {
    /// Observation type
    type Observation: Observation;
    /// Action type
    type Action: Action;

    /// Get the action space
    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>>;

    /// Shape of the observations returned by `reset` and `step`
    fn observation_shape(&self) -> Vec<usize>;

    /// Start a new episode and return its first observation
    fn reset(&mut self) -> crate::Result<Self::Observation>;

    /// Take a step in the environment
    fn step(&mut self, action: Self::Action) -> crate::Result<Step<Self::Observation>>;

    /// Close the environment
    fn close(&mut self) -> crate::Result<()> {
        Ok(())
    }
}

impl<E: Environment + ?Sized> Environment for &mut E {
    type Observation = E::Observation;
    type Action = E::Action;

    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
        (**self).action_space()
    }

    fn observation_shape(&self) -> Vec<usize> {
        (**self).observation_shape()
    }

    fn reset(&mut self) -> crate::Result<Self::Observation> {
        (**self).reset()
    }

    fn step(&mut self, action: Self::Action) -> crate::Result<Step<Self::Observation>> {
        (**self).step(action)
    }

    fn close(&mut self) -> crate::Result<()> {
        (**self).close()
    }
}

/// Wrapper for environments that tracks episodes
pub struct TrackedEnvironment<E> {
    /// Inner environment
    pub env: E,
    /// Current episode
    pub episode: Option<Episode>,
    /// Finished episodes, oldest first
    pub history: Vec<Episode>,
}

impl<E> TrackedEnvironment<E> {
    /// Create a new tracked environment
    pub fn new(env: E) -> Self {
        Self {
            env,
            episode: None,
            history: Vec::new(),
        }
    }

    /// Get current episode info
    #[must_use]
    pub fn episode_info(&self) -> Option<&Episode> {
        self.episode.as_ref()
    }

    /// Most recently finished episode
    #[must_use]
    pub fn last_finished(&self) -> Option<&Episode> {
        self.history.last()
    }

    /// Unwrap the inner environment
    pub fn into_inner(self) -> E {
        self.env
    }
}

impl<E> Environment for TrackedEnvironment<E>
where
    E: Environment,
{
    type Observation = E::Observation;
    type Action = E::Action;

    fn action_space(&self) -> Box<dyn ActionSpace<Action = Self::Action>> {
        self.env.action_space()
    }

    fn observation_shape(&self) -> Vec<usize> {
        self.env.observation_shape()
    }

    fn reset(&mut self) -> crate::Result<Self::Observation> {
        // An unfinished episode is abandoned, not recorded
        if let Some(abandoned) = self.episode.take() {
            tracing::debug!(episode = %abandoned.id, steps = abandoned.steps, "abandoning episode");
        }

        let observation = self.env.reset()?;
        self.episode = Some(Episode {
            id: uuid::Uuid::new_v4().to_string(),
            total_reward: 0.0,
            steps: 0,
            start_time: chrono::Utc::now(),
            end_time: None,
            final_info: None,
        });

        Ok(observation)
    }

    fn step(&mut self, action: Self::Action) -> crate::Result<Step<Self::Observation>> {
        let step = self.env.step(action)?;

        if let Some(ref mut episode) = self.episode {
            episode.total_reward += step.reward.0;
            episode.steps += 1;
        }

        if step.done {
            if let Some(mut episode) = self.episode.take() {
                episode.end_time = Some(chrono::Utc::now());
                episode.final_info = Some(step.info.clone());
                self.history.push(episode);
            }
        }

        Ok(step)
    }

    fn close(&mut self) -> crate::Result<()> {
        self.env.close()
    }
}
