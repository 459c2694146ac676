//! # StatPixel Commands
//!
//! The command engine behind StatPixel.
//!
//! This crate turns inbound chat messages and slash interactions into
//! command executions:
//! - A command tree built once at startup, with runtime enable/disable
//! - An ordered, short-circuiting argument coercion pipeline
//! - A permission gate covering bans, admin-only and owner-only commands
//! - Text and interaction dispatchers sharing one execution path
//! - A reaction scheduler for persisted, expiring reaction prompts
//! - Built-in administrative and utility commands

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod argument;
pub mod builtin;
pub mod coercers;
pub mod context;
pub mod definition;
pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod permissions;
pub mod pipeline;
pub mod platform;
pub mod reactions;
pub mod reply;
pub mod schema;
pub mod settings;
pub mod store;
pub mod tokenizer;
pub mod tree;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use argument::{ArgKind, ArgValue, Args, ArgumentSpec, Coercer, Coercion, RawInput};
pub use context::{Data, GuildContext, Invocation};
pub use definition::{CommandBody, CommandDefinition};
pub use dispatch::{DispatchOutcome, Dispatcher, InteractionEvent, MessageEvent};
pub use error::{CommandError, CommandResult};
pub use permissions::{GateDecision, PermissionGate};
pub use pipeline::{ArgumentPipeline, StepOutcome};
pub use platform::{ChatPlatform, EmojiRef, Origin, PlatformUser};
pub use reactions::{
    EventRouter, ReactionContext, ReactionEvent, ReactionEventKind, ReactionHandler,
    ReactionListener, ReactionScheduler,
};
pub use reply::{CommandOutput, Embed, EmbedField, Reply};
pub use settings::SettingsCache;
pub use store::Store;
pub use tree::{CommandNode, CommandRegistry, NodeId, PermissionTier, Resolution};
