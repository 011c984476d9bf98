use super::{ScenarioContext, TestScenario};
use crate::error::{Result, TckError};
use crate::scenario::host::SessionTerminationTest;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds a scenario from its context and parameters, rejecting malformed
/// parameters with an error.
pub type ScenarioFactory =
    Arc<dyn Fn(ScenarioContext, &[String]) -> Result<Box<dyn TestScenario>> + Send + Sync>;

/// Maps `(profile, test name)` to a scenario factory.
#[derive(Clone, Default)]
pub struct ScenarioRegistry {
    factories: BTreeMap<(String, String), ScenarioFactory>,
}

impl std::fmt::Debug for ScenarioRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioRegistry")
            .field("scenarios", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ScenarioRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every scenario shipped with the harness.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("host", "SessionTerminationTest", |ctx, params| {
            Ok(Box::new(SessionTerminationTest::new(ctx, params)?))
        });
        registry
    }

    /// Registers `factory`, replacing any factory already under that name.
    pub fn register<F>(&mut self, profile: &str, name: &str, factory: F)
    where
        F: Fn(ScenarioContext, &[String]) -> Result<Box<dyn TestScenario>> + Send + Sync + 'static,
    {
        self.factories
            .insert((profile.to_string(), name.to_string()), Arc::new(factory));
    }

    #[must_use]
    pub fn contains(&self, profile: &str, name: &str) -> bool {
        self.factories
            .contains_key(&(profile.to_string(), name.to_string()))
    }

    /// Registered `(profile, name)` pairs in sorted order.
    pub fn names(&self) -> impl Iterator<Item = (&str, &str)> {
        self.factories
            .keys()
            .map(|(profile, name)| (profile.as_str(), name.as_str()))
    }

    /// Instantiates the scenario registered under `profile` and `name`.
    pub fn create(
        &self,
        profile: &str,
        name: &str,
        ctx: ScenarioContext,
        params: &[String],
    ) -> Result<Box<dyn TestScenario>> {
        let factory = self
            .factories
            .get(&(profile.to_string(), name.to_string()))
            .ok_or_else(|| TckError::UnknownScenario {
                profile: profile.to_string(),
                name: name.to_string(),
            })?;
        factory(ctx, params)
    }
}
