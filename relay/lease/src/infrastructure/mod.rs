// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod memory_store;
pub mod data_attribute_store;

pub use data_attribute_store::DataAttributeLeaseStore;
pub use memory_store::MemoryLeaseStore;
