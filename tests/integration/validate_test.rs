//! Integration tests for argument validation and configuration

use boomerang_socket::config::Config;
use boomerang_socket::options::{validate_options, OPTION_NAMES};
use boomerang_socket::{BoomerangSocket, EventListeners, Protocols, ValidationError};
use serde_json::json;
use std::time::Duration;

#[test]
fn test_config_example_loads() {
    let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();
    let args = config.connection.validate().unwrap();

    assert_eq!(args.url, "ws://127.0.0.1:9001");
    assert_eq!(args.protocols, Protocols::from("chat"));
    assert_eq!(args.options.connect_timeout, Duration::from_millis(250));
    assert_eq!(args.options.reconnect_attempts, None);
    assert_eq!(args.options.reconnect_delay, Duration::from_millis(3000));
}

#[test]
fn test_every_documented_option_is_accepted() {
    let options = json!({
        "connectTimeout": 100,
        "reconnect": true,
        "reconnectAttempts": 4,
        "reconnectDelay": 200,
        "reconnectDelayExponent": 2,
    });
    assert_eq!(options.as_object().unwrap().len(), OPTION_NAMES.len());

    let args = validate_options(&json!("ws://localhost"), None, Some(&options)).unwrap();
    assert_eq!(args.options.reconnect_attempts, Some(4));
    assert_eq!(args.options.reconnect_delay_exponent, 2.0);
}

#[test]
fn test_mistyped_option_named_in_error() {
    let result = validate_options(
        &json!("ws://localhost"),
        None,
        Some(&json!({"connectTimeout": true})),
    );

    match result {
        Err(ValidationError::InvalidType { name, .. }) => assert_eq!(name, "connectTimeout"),
        other => panic!("expected InvalidType, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_values_never_connect() {
    let result = BoomerangSocket::connect_values(
        &json!("ws://127.0.0.1:1"),
        Some(&json!(["chat", 7])),
        None,
        EventListeners::shared(),
    );

    assert!(matches!(
        result,
        Err(ValidationError::InvalidType { ref name, .. }) if name == "protocols[1]"
    ));
}
