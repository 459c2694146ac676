//! Integration tests for statpixel-commands crate.
//!
//! These drive the engine end to end through the dispatcher, the built-in
//! commands and the reaction scheduler, against in-memory fakes.

use chrono::Utc;
use statpixel_commands::builtin;
use statpixel_commands::permissions::GUILD_ONLY;
use statpixel_commands::reactions::ReactionHandler;
use statpixel_commands::schema::slash_commands;
use statpixel_commands::store::{BanExpiry, MemoryStore, ModerationStore};
use statpixel_commands::test_utils::{settle, test_config, TestHarness};
use statpixel_commands::tokenizer::tokenize;
use statpixel_commands::{
    ArgValue, ArgumentPipeline, DispatchOutcome, Dispatcher, Invocation, PlatformUser,
};
use statpixel_common::test_utils::discord_fixtures::*;
use statpixel_common::test_utils::init_test_logging;
use statpixel_common::{ChannelId, MessageId, UserId};
use std::sync::Arc;

const TARGET: u64 = 123_456_789_012_345_678;

async fn harness() -> TestHarness {
    init_test_logging();
    let harness = TestHarness::new(builtin::definitions()).await;
    harness
        .platform
        .add_user(PlatformUser::new(UserId(TARGET), "target#0001"));
    harness
}

fn ban_invocation(harness: &TestHarness) -> Invocation {
    let mut ctx = harness.invocation();
    ctx.node = harness.data.registry.find(&["ban"]).unwrap();
    ctx
}

#[tokio::test]
async fn test_ban_arguments_are_coerced_in_place() {
    let harness = harness().await;
    let ctx = ban_invocation(&harness);

    let mut positional: Vec<Option<ArgValue>> = ["123456789012345678", "1h", "spamming"]
        .iter()
        .map(|t| Some(ArgValue::Text((*t).to_string())))
        .collect();

    ArgumentPipeline::run(ctx.command().arguments(), &mut positional, &ctx)
        .await
        .unwrap();

    assert!(matches!(&positional[0], Some(ArgValue::User(u)) if u.id == UserId(TARGET)));
    assert_eq!(positional[1], Some(ArgValue::Duration(3_600_000)));
    assert_eq!(positional[2], Some(ArgValue::Text("spamming".into())));
    assert!(ArgumentPipeline::verify(ctx.command().arguments(), &positional).is_ok());
}

#[tokio::test]
async fn test_admin_bans_through_dispatcher() {
    let harness = harness().await;
    let dispatcher = Dispatcher::new(harness.data.clone());

    let outcome = dispatcher
        .handle_message(harness.guild_message(
            test_admin_id(),
            "-ban <@123456789012345678> 1h spamming in general",
        ))
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Completed);

    let record = harness
        .store
        .moderation(UserId(TARGET))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.reason.as_deref(), Some("spamming in general"));
    let Some(BanExpiry::Until(until)) = record.banned_until else {
        panic!("expected a timed ban");
    };
    let remaining = until - Utc::now();
    assert!(remaining > chrono::Duration::minutes(59));
    assert!(remaining <= chrono::Duration::hours(1));

    let outcome = dispatcher
        .handle_message(harness.guild_message(UserId(TARGET), "-help"))
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Banned);
}

#[tokio::test]
async fn test_admin_command_by_non_admin_is_silent() {
    let harness = harness().await;
    let dispatcher = Dispatcher::new(harness.data.clone());

    let outcome = dispatcher
        .handle_message(harness.guild_message(test_user_id(), "-ban 123456789012345678"))
        .await
        .unwrap();
    settle().await;

    assert_eq!(outcome, DispatchOutcome::DeniedSilently);
    assert_eq!(harness.platform.outbound_messages(), 0);
    assert_eq!(harness.store.total_increments(), 0);
}

#[tokio::test]
async fn test_owner_command_in_direct_message() {
    let harness = harness().await;
    let dispatcher = Dispatcher::new(harness.data.clone());

    let outcome = dispatcher
        .handle_message(harness.direct_message(test_guild_owner_id(), "-prefix !"))
        .await
        .unwrap();

    assert_eq!(outcome, DispatchOutcome::Denied);
    let replies = harness.platform.replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].visible_text(), GUILD_ONLY);
}

#[test]
fn test_quoted_tokens() {
    assert_eq!(tokenize(r#"foo "bar baz" qux"#), vec!["foo", "bar baz", "qux"]);
}

#[tokio::test]
async fn test_disable_survives_restart_and_enable_restores() {
    init_test_logging();
    let store = Arc::new(MemoryStore::new());
    let first = TestHarness::with_store(test_config(), store.clone(), builtin::definitions()).await;
    let dispatcher = Dispatcher::new(first.data.clone());

    let outcome = dispatcher
        .handle_message(first.guild_message(test_admin_id(), "-disable metrics"))
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(
        dispatcher
            .handle_message(first.guild_message(test_user_id(), "-metric"))
            .await
            .unwrap(),
        DispatchOutcome::NotFound
    );

    let second = TestHarness::with_store(test_config(), store, builtin::definitions()).await;
    let dispatcher = Dispatcher::new(second.data.clone());
    assert!(!second
        .data
        .registry
        .node(second.data.registry.find(&["metrics"]).unwrap())
        .is_enabled());

    let outcome = dispatcher
        .handle_message(second.guild_message(test_admin_id(), "-enable metrics"))
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(
        dispatcher
            .handle_message(second.guild_message(test_user_id(), "-metrics"))
            .await
            .unwrap(),
        DispatchOutcome::Completed
    );
}

#[tokio::test]
async fn test_firing_twice_is_a_no_op() {
    let harness = harness().await;
    let handler = ReactionHandler::new(ChannelId(1), MessageId(2), "unused");
    let id = handler.id;
    harness.data.reactions.register(handler).await.unwrap();

    assert!(harness.data.reactions.fire(id).await.unwrap());
    assert!(!harness.data.reactions.fire(id).await.unwrap());
    assert_eq!(harness.store.reaction_count(), 0);
}

#[tokio::test]
async fn test_handler_inside_window_is_armed_on_register() {
    let harness = harness().await;
    let scheduler = &harness.data.reactions;
    scheduler.sweep_once().await.unwrap();

    let handler = ReactionHandler::new(ChannelId(1), MessageId(2), "unused")
        .expiring_at(Utc::now() + chrono::Duration::seconds(30));
    let id = handler.id;

    assert!(scheduler.register(handler).await.unwrap());
    assert!(scheduler.is_armed(id));
    scheduler.disarm_all();
}

#[tokio::test]
async fn test_builtins_export_slash_schema() {
    let harness = harness().await;
    let commands = slash_commands(&harness.data.registry, &harness.data.config.commands);
    let ban = commands.iter().find(|c| c.name == "ban").unwrap();

    let required: Vec<bool> = ban.options.iter().map(|o| o.required).collect();
    assert_eq!(required, vec![true, false, false]);
}
