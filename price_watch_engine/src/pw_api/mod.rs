//! The watch engine's public API.
//!
//! * [`watch_api::WatchFlowApi`] serves buyers: pre-authorization, arming watches, inspecting and cancelling them.
//! * [`scanner::PriceScanner`] runs scan cycles. It is the only thing that executes watches.
//! * [`pipeline::ClaimPipeline`] and [`resolver`] do the actual work of a cycle, one item at a time.
//! * [`payment_gate::MockPreAuthGateway`] is the stand-in payment processor.
pub mod errors;
pub mod payment_gate;
pub mod pipeline;
pub mod resolver;
pub mod retry;
pub mod scanner;
pub mod watch_api;
pub mod watch_objects;
