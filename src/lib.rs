//! Integration adapter for a hosted Electronic Payment Platform (EPP):
//! builds the auto-submitting hosted-checkout form for a merchant sale
//! request and reconciles the processor's asynchronous result callback
//! against a locally persisted transaction record.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
