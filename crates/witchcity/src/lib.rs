//! Community-management core for WitchCityRope: the vetting workflow, the participation
//! access guard, event participation, and event check-in.

pub mod api;
pub mod config;
pub mod error;
pub mod identity;
pub mod store;
pub mod telemetry;
pub mod workflows;
