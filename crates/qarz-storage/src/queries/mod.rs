// SPDX-FileCopyrightText: 2026 Qarz Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per stored entity.

pub mod debtors;
pub mod sessions;
pub mod shops;

