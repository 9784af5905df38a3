// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Legacy interop helpers.
//!
//! NOTE: The compat module containing HDDS_INTEROP_* env var flags has been
//! removed (2025-11-30). All interop behavior is now driven by automatic
//! dialect detection via vendor_id in SPDP packets (see `protocol::dialect`).
