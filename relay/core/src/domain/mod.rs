// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Outline wire types, error taxonomy, capability model and configuration.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Types shared by the client, the prober and the lease crate

pub mod api;
pub mod document;
pub mod capability;
pub mod config;
pub mod resource;
