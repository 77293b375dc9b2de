// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Style catalog: which instruction governs a generation request

pub mod catalog;

pub use catalog::{
    StyleCatalog, StyleError, StyleInstruction, DEFAULT_STYLE, SUBJECT_PLACEHOLDER,
};
