//! Outbound interfaces toward the hosted processor.

pub mod checkout_form;
