// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `docrelay-lease`: Advisory Document Leases
//!
//! Lets independent agents take turns editing a shared Outline document.
//! A lease is held by one agent for a bounded TTL and identified by an opaque
//! token that must be presented to renew or release it.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `LeaseRecord`, `LeaseError`, `LeaseStore` port, `Clock` port |
//! | [`infrastructure`] | Infrastructure | `MemoryLeaseStore`, `DataAttributeLeaseStore` |
//! | [`application`] | Application | `LeaseService` (input validation), backend factory |
//!
//! Expiry is evaluated lazily whenever a lease is read; nothing sweeps
//! expired records in the background.

pub mod domain;
pub mod infrastructure;
pub mod application;

pub use application::factory::{create_lease_service, create_lease_store};
pub use application::lease_service::{LeaseService, LeaseServiceConfig};
pub use domain::lease::{LeaseError, LeaseRecord, LeaseStore};
