//! Billing: plan pricing, gateway selection, the Stripe/Razorpay/PayPal
//! adapters, checkout verification and vendor webhooks.

pub mod error;
pub mod gateway;
pub mod handlers;
pub mod paypal;
pub mod plans;
pub mod razorpay;
pub mod selector;
pub mod service;
pub mod signature;
pub mod stripe;
pub mod webhooks;

pub use error::PaymentError;
pub use gateway::GatewayRegistry;
pub use service::require_pro;
