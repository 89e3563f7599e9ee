//! Clients for the Ark model platform.
//!
//! Three capabilities, all over the same OpenAI-compatible gateway:
//! pet-persona chat replies, expansion of user memories into 3D
//! generation prompts, and photo → IP-figure image stylization.

mod chat;
mod client;
mod expand;
mod image;

pub use chat::{build_persona_prompt, parse_reply, ChatTurn, PetPersona, PetReply};
pub use client::{ArkClient, ArkConfig, ArkError};
pub use image::StylizeOptions;
