// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printgate Server — the HTTP surface LAN label clients talk to.

pub mod error;
pub mod network;
pub mod routes;
pub mod state;
pub mod upload;

pub use error::ApiError;
pub use routes::configure;
pub use state::AppState;
