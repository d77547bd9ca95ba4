//! Shared types and billing rules for Graph-X.
//!
//! This crate provides:
//! - Subscription plans and the injected price table (`Plan`, `PlanPricing`)
//! - The subscription tuple and its lazy expiry (`SubscriptionState`)
//! - The plan-switch proration engine (`compute_switch_amount`)
//! - Payment gateway signature primitives (HMAC-SHA256 over `order|payment`)
//! - API error codes and billing validation errors

mod errors;
mod plan;
mod proration;
mod signature;
mod subscription;

pub use errors::{BillingError, ErrorCode};
pub use plan::{Plan, PlanPricing, to_minor_units};
pub use proration::{SwitchResult, compute_switch_amount, validate_switch};
pub use signature::{sign_payment, verify_payment_signature};
pub use subscription::{PaymentMethod, SubscriptionState};
