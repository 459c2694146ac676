//! # StatPixel Bot
//!
//! Discord bot serving game statistics through the StatPixel command engine.
//!
//! This is the binary crate that wires the engine to the Discord gateway:
//! it translates gateway events for the dispatcher and reaction scheduler,
//! implements the engine's chat platform over the REST client, and owns the
//! application lifecycle.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod bot;
pub mod convert;
pub mod error;
pub mod platform;

pub use bot::*;
pub use error::*;
pub use platform::SerenityPlatform;
