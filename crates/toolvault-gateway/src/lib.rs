// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP API for toolvault.
//!
//! Authenticated routes live under `/api` and pass through
//! [`auth::auth_middleware`]. Share resolution and `/health` are public.

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use extract::ClientIp;
pub use server::{router, start_server, GatewayState};
