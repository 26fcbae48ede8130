//! Identity store library modules.
//!
//! `domain` holds the transport-agnostic identity model, service and ports;
//! `outbound` holds the snapshot repository and Argon2id hasher; `startup`
//! wires them together from [`config::IdentitySettings`].

pub mod config;
pub mod domain;
pub mod outbound;
pub mod startup;
