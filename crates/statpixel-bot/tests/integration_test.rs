//! Integration tests for statpixel-bot crate.
//!
//! These cover the gateway-independent parts of the binary: error
//! conversions, intents and the slash payloads built from the real command
//! tree.

use serenity::all::GatewayIntents;
use statpixel_bot::convert::create_command;
use statpixel_bot::{intents, BotError};
use statpixel_commands::builtin;
use statpixel_commands::schema::slash_commands;
use statpixel_commands::test_utils::TestHarness;
use statpixel_common::test_utils::init_test_logging;
use statpixel_common::StatError;

#[test]
fn test_error_conversions() {
    let error: BotError = StatError::config("missing token").into();
    assert!(matches!(error, BotError::Engine(_)));
    assert_eq!(error.to_string(), "Configuration error: missing token");

    let error: BotError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(error, BotError::Io(_)));
}

#[test]
fn test_intents_cover_handled_events() {
    let intents = intents();
    assert!(intents.contains(GatewayIntents::MESSAGE_CONTENT));
    assert!(intents.contains(GatewayIntents::GUILD_MESSAGE_REACTIONS));
    assert!(intents.contains(GatewayIntents::GUILD_MEMBERS));
    assert!(intents.contains(GatewayIntents::DIRECT_MESSAGES));
}

#[tokio::test]
async fn test_builtin_commands_build_registration_payloads() {
    init_test_logging();
    let harness = TestHarness::new(builtin::definitions()).await;

    let payloads: Vec<serde_json::Value> =
        slash_commands(&harness.data.registry, &harness.data.config.commands)
            .iter()
            .map(|command| serde_json::to_value(create_command(command)).unwrap())
            .collect();

    let ban = payloads.iter().find(|p| p["name"] == "ban").unwrap();
    let names: Vec<&str> = ban["options"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["id", "duration", "reason"]);

    for payload in &payloads {
        let description = payload["description"].as_str().unwrap();
        assert!(!description.is_empty());
        assert!(description.chars().count() <= 100);
    }
}
