// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! docrelay CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Wires configuration, the Outline client, capability
//!   discovery and the lease service, then renders command output

pub mod bootstrap;
pub mod commands;
