// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the POAP gallery
//!
//! This crate provides the small vocabulary shared by every other crate in the
//! workspace: the chains tokens live on, how an ownership change is classified,
//! and how event listings can be ordered.

pub mod activity;
pub mod chains;
pub mod ordering;

pub use activity::ActivityType;
pub use chains::{Chain, ChainParseError};
pub use ordering::{OrderBy, OrderDirection, OrderType};
