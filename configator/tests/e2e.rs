//! End-to-end hydration through the public facade.

#![allow(non_snake_case)]

use std::sync::Arc;

use configator::adapters::memory::InMemoryVaultClient;
use configator::primitives::{VaultField, VaultRecord, VaultSection};
use configator::prelude::*;

#[derive(Debug, PartialEq, Schema)]
struct App {
    a_string: String,
    an_integer: i64,
    a_reference: String,
}

#[derive(Debug, PartialEq, Schema)]
struct Env {
    debug: bool,
}

#[derive(Debug, PartialEq, Schema)]
struct TestConfig {
    APP: App,
    ENV: Env,
    #[schema(default = "overridden_default_value")]
    NO_SECTION: String,
    #[schema(default = "default_value")]
    defval: String,
}

fn configator_test_item() -> VaultRecord {
    item_with_debug("false")
}

fn item_with_debug(debug: &str) -> VaultRecord {
    VaultRecord::new()
        .with_section(VaultSection::new("app", "APP"))
        .with_section(VaultSection::new("env", "ENV"))
        .with_field(VaultField::new("a-string", "foo").in_section("app"))
        .with_field(VaultField::new("an-integer", "42").in_section("app"))
        .with_field(VaultField::new("a-reference", "op://vault/item/field").in_section("app"))
        .with_field(VaultField::new("debug", debug).in_section("env"))
        .with_field(VaultField::new("no-section", "no_kings"))
}

fn client() -> InMemoryVaultClient {
    InMemoryVaultClient::new()
        .with_item("vault", "configator-test", configator_test_item())
        .with_item(
            "vault",
            "item",
            VaultRecord::new()
                .with_section(VaultSection::new("secrets", "Secrets"))
                .with_field(VaultField::new("field", "op://shared/tokens/mixpanel").in_section("secrets")),
        )
        .with_item(
            "shared",
            "tokens",
            VaultRecord::new().with_field(VaultField::new("mixpanel", "mixpanel")),
        )
}

#[tokio::test]
async fn loads_the_reference_configuration() {
    let client = client();
    let config: TestConfig = hydrate(&client, "vault", "configator-test").await.unwrap();

    assert_eq!(
        config,
        TestConfig {
            APP: App {
                a_string: "foo".into(),
                an_integer: 42,
                a_reference: "mixpanel".into(),
            },
            ENV: Env { debug: false },
            NO_SECTION: "no_kings".into(),
            defval: "default_value".into(),
        }
    );
    assert_eq!(config.APP.a_string, "foo");
    assert_eq!(client.dereference_count(), 2);
}

#[tokio::test]
async fn shared_hydrator_matches_free_function() {
    let hydrator = Hydrator::new(Arc::new(client()));
    let via_handle: TestConfig = hydrator.load("vault", "configator-test").await.unwrap();
    let via_fn: TestConfig = hydrate(hydrator.client().as_ref(), "vault", "configator-test")
        .await
        .unwrap();
    assert_eq!(via_handle, via_fn);
}

#[tokio::test]
async fn boolean_spellings_are_accepted() {
    let cases = [
        ("true", true),
        ("1", true),
        ("YES", true),
        ("On", true),
        ("false", false),
        ("0", false),
        ("No", false),
        ("OFF", false),
    ];
    for (raw, expected) in cases {
        let client = client().with_item("vault", "bools", item_with_debug(raw));
        let config: TestConfig = hydrate(&client, "vault", "bools").await.unwrap();
        assert_eq!(config.ENV.debug, expected, "raw value {raw:?}");
    }
}

#[tokio::test]
async fn unrecognised_boolean_fails() {
    let client = client().with_item("vault", "broken", item_with_debug("maybe"));

    let err = hydrate::<TestConfig, _>(&client, "vault", "broken")
        .await
        .expect_err("maybe is not a boolean");
    assert!(err.is_boolean_parse());
    let message = err.to_string();
    assert!(message.contains("ENV.debug"), "{message}");
    assert!(message.contains("maybe"), "{message}");
}

#[tokio::test]
async fn values_serialize_to_json() {
    let client = client();
    let values = hydrate_descriptor(&client, &TestConfig::descriptor(), "vault", "configator-test")
        .await
        .unwrap();

    let json = serde_json::to_value(&values).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "APP": {"a_reference": "mixpanel", "a_string": "foo", "an_integer": 42},
            "ENV": {"debug": false},
            "NO_SECTION": "no_kings",
            "defval": "default_value",
        })
    );
}
