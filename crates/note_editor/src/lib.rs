mod config;
mod core;
pub mod edit;
mod editor;
mod error;
mod inline;
pub mod keymap;
mod menu;
mod normalize;
pub mod paste;
mod serde_value;
mod serialize;
pub mod trigger;

pub use crate::config::*;
pub use crate::core::*;
pub use crate::editor::*;
pub use crate::error::*;
pub use crate::inline::*;
pub use crate::keymap::{Key, KeyOutcome, KeyPress};
pub use crate::menu::*;
pub use crate::normalize::*;
pub use crate::paste::PasteData;
pub use crate::serde_value::*;
pub use crate::trigger::{TriggerChar, TriggerContext};
