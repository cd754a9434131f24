// SPDX-FileCopyrightText: 2026 Toolvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures for toolvault integration tests.

pub mod harness;

pub use harness::{TestHarness, TestHarnessBuilder, ALICE_TOKEN, BOB_TOKEN, MALLORY_TOKEN};
