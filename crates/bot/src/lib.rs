//! Slack Bud bot library.
//!
//! The HTTP side of the command-input protocol: Slack ingress routes,
//! the background worker, the command dispatcher, prompt sessions and the
//! response channel. Command handlers are registered on a
//! [`Dispatcher`](dispatch::Dispatcher) by the binary that embeds this
//! crate.
//!
//! # Request flow
//!
//! ```text
//! Slack ──POST──▶ routes ──wire JSON──▶ worker ──▶ dispatcher ──▶ handler
//!   ▲               │                                  │
//!   └──── ack ──────┘                                  ▼
//!   └──────────── response_url ◀──────────── ResponseSink
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod routes;
pub mod session;
pub mod slack;
pub mod state;
pub mod worker;
