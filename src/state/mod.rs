// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Yarnloom-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Yarnloom and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Runtime variable state: typed values, the variable store, and condition evaluation.
//!
//! Exposed for an external dialogue-playback runtime; the conversion and layout code never
//! mutates a store.

pub mod store;
pub mod value;

pub use store::{ArithmeticOp, VariableStore};
pub use value::{format_number, Value, ValueType};
