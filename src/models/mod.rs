// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod badge;
pub mod journey;
pub mod spot;
pub mod user;

pub use badge::Badge;
pub use journey::{Journey, JourneyPhase, SpotPin};
pub use spot::Spot;
pub use user::{PublicUser, User};
