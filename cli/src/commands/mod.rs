// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for docrelay CLI

pub mod call;
pub mod capabilities;
pub mod config;
pub mod export;
pub mod lease;
pub mod resource;

pub use self::call::CallArgs;
pub use self::config::ConfigCommand;
pub use self::export::ExportCommand;
pub use self::lease::LeaseCommand;
