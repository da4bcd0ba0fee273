// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod capability_probe;

pub use capability_probe::{default_capabilities, probe_server_capabilities};
