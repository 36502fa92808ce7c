//! Compliance and health scoring engine for Irrevocable Life Insurance Trusts.
//!
//! The engine scores policies against trust-administration rules, blends in an advisory
//! model pass, tracks Crummey withdrawal notices through their lifecycle, and drives the
//! remediation actions and gift-tax reports that follow from those findings.

pub mod config;
pub mod error;
pub mod notifications;
pub mod store;
pub mod telemetry;
pub mod workflows;
