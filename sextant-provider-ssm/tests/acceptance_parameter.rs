//! ssm_parameter acceptance tests

mod common;

use common::{
    Action, acceptance_enabled, apply_step, destroy, map, provider, random_name, resource,
    run_steps, string,
};
use sextant_core::provider::Provider;
use sextant_core::resource::{Resource, State, Value};

fn parameter(name: &str, extra: Vec<(&'static str, Value)>) -> Resource {
    let mut attributes = vec![("name", string(name)), ("type", string("String"))];
    attributes.extend(extra);
    resource("ssm_parameter", "test", attributes)
}

#[tokio::test]
#[ignore]
async fn parameter_basic() {
    if !acceptance_enabled() {
        return;
    }
    let provider = provider().await;
    let name = random_name("tf-acc-test");

    let state = run_steps(
        &provider,
        vec![(
            parameter(&name, vec![("value", string("test2"))]),
            Action::Create,
            vec![
                ("value", "test2"),
                ("type", "String"),
                ("tier", "Standard"),
                ("tags.%", "0"),
                ("data_type", "text"),
            ],
        )],
    )
    .await;
    common::assert_flat_set(&state, "version");
    common::assert_flat_set(&state, "arn");

    destroy(&provider, &state).await;
}

#[tokio::test]
#[ignore]
async fn parameter_update_value_and_description() {
    if !acceptance_enabled() {
        return;
    }
    let provider = provider().await;
    let name = random_name("tf-acc-test");

    let state = run_steps(
        &provider,
        vec![
            (
                parameter(
                    &name,
                    vec![("value", string("test")), ("description", string("description"))],
                ),
                Action::Create,
                vec![("value", "test"), ("description", "description"), ("version", "1")],
            ),
            (
                parameter(
                    &name,
                    vec![
                        ("value", string("test2")),
                        ("description", string("updated description")),
                    ],
                ),
                Action::Update,
                vec![
                    ("value", "test2"),
                    ("description", "updated description"),
                    ("version", "2"),
                ],
            ),
        ],
    )
    .await;

    destroy(&provider, &state).await;
}

#[tokio::test]
#[ignore]
async fn parameter_tags() {
    if !acceptance_enabled() {
        return;
    }
    let provider = provider().await;
    let name = random_name("tf-acc-test");

    let state = run_steps(
        &provider,
        vec![
            (
                parameter(
                    &name,
                    vec![("value", string("test")), ("tags", map(&[("key1", "value1")]))],
                ),
                Action::Create,
                vec![("tags.%", "1"), ("tags.key1", "value1")],
            ),
            (
                parameter(
                    &name,
                    vec![
                        ("value", string("test")),
                        ("tags", map(&[("key1", "value1updated"), ("key2", "value2")])),
                    ],
                ),
                Action::Update,
                vec![
                    ("tags.%", "2"),
                    ("tags.key1", "value1updated"),
                    ("tags.key2", "value2"),
                ],
            ),
            (
                parameter(
                    &name,
                    vec![("value", string("test")), ("tags", map(&[("key2", "value2")]))],
                ),
                Action::Update,
                vec![("tags.%", "1"), ("tags.key2", "value2")],
            ),
        ],
    )
    .await;

    destroy(&provider, &state).await;
}

#[tokio::test]
#[ignore]
async fn parameter_overwrite_takes_over_existing() {
    if !acceptance_enabled() {
        return;
    }
    let provider = provider().await;
    let name = random_name("tf-acc-test");

    // Someone else created the parameter first
    let existing = parameter(&name, vec![("value", string("original"))]);
    let (first, _) = apply_step(&provider, &existing, &State::not_found(existing.id.clone()))
        .await
        .expect("create existing parameter");

    let takeover = parameter(
        &name,
        vec![
            ("value", string("test2")),
            ("overwrite", Value::Bool(true)),
            ("tags", map(&[("key1", "value1")])),
        ],
    );
    let (state, action) = apply_step(&provider, &takeover, &State::not_found(takeover.id.clone()))
        .await
        .expect("overwrite");
    assert_eq!(action, Action::Create);
    common::assert_flat(
        &state,
        &[
            ("version", "2"),
            ("overwrite", "true"),
            ("tags.%", "1"),
            ("tags.key1", "value1"),
        ],
    );
    assert_eq!(first.identifier, state.identifier);

    destroy(&provider, &state).await;
}

#[tokio::test]
#[ignore]
async fn parameter_create_without_overwrite_fails_when_taken() {
    if !acceptance_enabled() {
        return;
    }
    let provider = provider().await;
    let name = random_name("tf-acc-test");

    let desired = parameter(&name, vec![("value", string("test"))]);
    let (state, _) = apply_step(&provider, &desired, &State::not_found(desired.id.clone()))
        .await
        .expect("create");

    let err = provider.create(&desired).await.unwrap_err();
    assert!(err.to_string().contains("PutParameter"), "{}", err);

    destroy(&provider, &state).await;
}

#[tokio::test]
#[ignore]
async fn parameter_insecure_value() {
    if !acceptance_enabled() {
        return;
    }
    let provider = provider().await;
    let name = random_name("tf-acc-test");

    let state = run_steps(
        &provider,
        vec![
            (
                parameter(&name, vec![("insecure_value", string("notsecret"))]),
                Action::Create,
                vec![("insecure_value", "notsecret"), ("type", "String")],
            ),
            (
                parameter(&name, vec![("insecure_value", string("newvalue"))]),
                Action::Update,
                vec![("insecure_value", "newvalue"), ("type", "String")],
            ),
        ],
    )
    .await;
    assert!(!common::flat(&state).contains_key("value"));

    // insecure_value cannot hold a SecureString
    let secure = resource(
        "ssm_parameter",
        "test",
        vec![
            ("name", string(&name)),
            ("type", string("SecureString")),
            ("insecure_value", string("notsecret")),
        ],
    );
    let err = apply_step(&provider, &secure, &state).await.unwrap_err();
    assert!(err.to_string().contains("invalid configuration"), "{}", err);

    destroy(&provider, &state).await;
}

#[tokio::test]
#[ignore]
async fn parameter_secure_string_uses_default_key() {
    if !acceptance_enabled() {
        return;
    }
    let provider = provider().await;
    let name = random_name("tf-acc-test");

    let secure = resource(
        "ssm_parameter",
        "test",
        vec![
            ("name", string(&name)),
            ("type", string("SecureString")),
            ("value", string("secret")),
        ],
    );
    let (state, _) = apply_step(&provider, &secure, &State::not_found(secure.id.clone()))
        .await
        .expect("create");
    common::assert_flat(
        &state,
        &[
            ("value", "secret"),
            ("type", "SecureString"),
            ("key_id", "alias/aws/ssm"),
        ],
    );

    destroy(&provider, &state).await;
}

#[tokio::test]
#[ignore]
async fn parameter_tier_changes_in_place() {
    if !acceptance_enabled() {
        return;
    }
    let provider = provider().await;
    let name = random_name("tf-acc-test");

    let state = run_steps(
        &provider,
        vec![
            (
                parameter(
                    &name,
                    vec![("value", string("test")), ("tier", string("Advanced"))],
                ),
                Action::Create,
                vec![("tier", "Advanced")],
            ),
            (
                parameter(
                    &name,
                    vec![("value", string("test")), ("tier", string("Intelligent-Tiering"))],
                ),
                Action::Update,
                vec![("tier", "Intelligent-Tiering")],
            ),
        ],
    )
    .await;

    destroy(&provider, &state).await;
}

#[tokio::test]
#[ignore]
async fn parameter_name_change_forces_replacement() {
    if !acceptance_enabled() {
        return;
    }
    let provider = provider().await;
    let before = random_name("tf-acc-test");
    let after = format!("/{}/renamed", random_name("tf-acc-test"));

    let state = run_steps(
        &provider,
        vec![
            (
                parameter(&before, vec![("value", string("test"))]),
                Action::Create,
                vec![("name", before.as_str())],
            ),
            (
                parameter(&after, vec![("value", string("test"))]),
                Action::Replace,
                vec![("name", after.as_str())],
            ),
        ],
    )
    .await;

    let old = provider
        .read(&state.id, Some(&before))
        .await
        .expect("read old name");
    assert!(!old.exists);

    destroy(&provider, &state).await;
}
