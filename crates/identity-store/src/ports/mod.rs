//! # Ports Layer
//!
//! - **Inbound (Driving)**: the [`IdentityStore`](inbound::IdentityStore)
//!   interface the bridge handlers call.

pub mod inbound;
