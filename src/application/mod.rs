//! Application layer containing the payment orchestration logic.
//!
//! [`PaymentOrchestrator`] is the primary entry point; it drives the
//! [`TransactionReconciler`] around the hosted-checkout round trip.
//!
//! [`PaymentOrchestrator`]: orchestrator::PaymentOrchestrator
//! [`TransactionReconciler`]: reconciler::TransactionReconciler

pub mod orchestrator;
pub mod reconciler;
