//! Shared helpers for acceptance tests
//!
//! Acceptance tests talk to a real AWS account. They are `#[ignore]`d and
//! additionally skip themselves unless `SEXTANT_ACC=1`.

#![allow(dead_code)]

use std::collections::HashMap;

use sextant_core::differ::{Diff, diff};
use sextant_core::flatmap::{FlatState, flatten};
use sextant_core::provider::{Provider, ProviderResult};
use sextant_core::resource::{Resource, State, Value};
use sextant_provider_ssm::resource_types::find_resource_type;
use sextant_provider_ssm::{ProviderConfig, SsmProvider};

pub fn acceptance_enabled() -> bool {
    if std::env::var("SEXTANT_ACC").as_deref() == Ok("1") {
        true
    } else {
        eprintln!("skipping: set SEXTANT_ACC=1 to run acceptance tests");
        false
    }
}

/// Provider configured from the environment (AWS_REGION, AWS_PROFILE, ...)
pub async fn provider() -> SsmProvider {
    let config = ProviderConfig {
        region: std::env::var("AWS_REGION").ok(),
        profile: std::env::var("AWS_PROFILE").ok(),
        endpoint_url: std::env::var("SEXTANT_ENDPOINT_URL").ok(),
        account_id: std::env::var("SEXTANT_ACCOUNT_ID").ok(),
        max_attempts: None,
    };
    SsmProvider::new(&config)
        .await
        .expect("provider from environment")
}

/// A name unique to this test run
pub fn random_name(prefix: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &suffix[..12])
}

pub fn string(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn map(pairs: &[(&str, &str)]) -> Value {
    Value::Map(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), string(v)))
            .collect::<HashMap<_, _>>(),
    )
}

/// A resource block with the given attributes
pub fn resource(resource_type: &str, name: &str, attributes: Vec<(&str, Value)>) -> Resource {
    attributes
        .into_iter()
        .fold(Resource::new(resource_type, name), |r, (k, v)| {
            r.with_attribute(k, v)
        })
}

/// What a step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Replace,
    NoChange,
}

/// Bring `current` to `desired` the way a plan would: validate, diff, apply.
/// Returns the new state and what was done.
pub async fn apply_step(
    provider: &SsmProvider,
    desired: &Resource,
    current: &State,
) -> ProviderResult<(State, Action)> {
    let schema = find_resource_type(&desired.id.resource_type)
        .expect("known resource type")
        .schema();

    let mut checked = desired.attributes.clone();
    schema.apply_defaults(&mut checked);
    if let Err(errors) = schema.validate(&checked) {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        return Err(sextant_core::provider::ProviderError::new(messages.join("; ")));
    }

    match diff(desired, current, &schema) {
        Diff::Create(resource) => Ok((provider.create(&resource).await?, Action::Create)),
        Diff::Update { id, from, to, .. } => {
            let identifier = from.identifier.clone().expect("existing state has identifier");
            let state = provider.update(&id, &identifier, &from, &to).await?;
            Ok((state, Action::Update))
        }
        Diff::Replace { from, to, .. } => {
            let identifier = from.identifier.clone().expect("existing state has identifier");
            provider.delete(&from.id, &identifier).await?;
            Ok((provider.create(&to).await?, Action::Replace))
        }
        Diff::NoChange(_) => Ok((current.clone(), Action::NoChange)),
    }
}

/// Apply a sequence of configurations, checking each step
pub async fn run_steps(
    provider: &SsmProvider,
    steps: Vec<(Resource, Action, Vec<(&str, &str)>)>,
) -> State {
    let mut current = State::not_found(steps[0].0.id.clone());
    for (i, (desired, expected_action, checks)) in steps.into_iter().enumerate() {
        let (state, action) = apply_step(provider, &desired, &current)
            .await
            .unwrap_or_else(|e| panic!("step {}: {}", i, e));
        assert_eq!(action, expected_action, "step {}", i);
        assert_flat(&state, &checks);

        // Re-applying the same configuration is a no-op
        let (_, again) = apply_step(provider, &desired, &state)
            .await
            .unwrap_or_else(|e| panic!("step {} re-plan: {}", i, e));
        assert_eq!(again, Action::NoChange, "step {} is not stable", i);

        current = state;
    }
    current
}

/// Delete the resource and check that it is gone
pub async fn destroy(provider: &SsmProvider, state: &State) {
    let identifier = state.identifier.as_deref().expect("state has identifier");
    provider
        .delete(&state.id, identifier)
        .await
        .expect("delete");
    let after = provider
        .read(&state.id, Some(identifier))
        .await
        .expect("read after delete");
    assert!(!after.exists, "{} still exists", state.id);
}

pub fn flat(state: &State) -> FlatState {
    flatten(&state.attributes)
}

/// Check flat attribute values such as `targets.0.key`
pub fn assert_flat(state: &State, checks: &[(&str, &str)]) {
    let flat = flat(state);
    for (key, expected) in checks {
        assert_eq!(
            flat.get(*key).map(String::as_str),
            Some(*expected),
            "{}: attribute {}",
            state.id,
            key
        );
    }
}

/// Check that a flat attribute is set, whatever its value
pub fn assert_flat_set(state: &State, key: &str) {
    assert!(
        flat(state).get(key).is_some_and(|v| !v.is_empty()),
        "{}: attribute {} is not set",
        state.id,
        key
    );
}
