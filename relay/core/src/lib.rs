// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `docrelay-core`: Outline API Access Layer
//!
//! Everything docrelay needs to talk to an Outline deployment and to find out
//! what that deployment supports.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `ApiEnvelope`, `ApiError`, document types, `ServerCapabilities`, `RelayConfig`, `ResourceUri` |
//! | [`infrastructure`] | Infrastructure | `OutlineClient` (retrying HTTP client) |
//! | [`application`] | Application | capability probing at startup |
//!
//! The capability probe runs once, before anything else is built, and its
//! result is an immutable [`domain::capability::ServerCapabilities`] value that
//! callers pass along explicitly.

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
