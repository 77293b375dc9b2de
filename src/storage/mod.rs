// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod result_store;
pub mod temp_store;

pub use result_store::{ImageId, ResultStore, StoreError, StoredImage};
pub use temp_store::{ScratchFile, TempStore};
