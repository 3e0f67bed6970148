//! Middleware stack for the API Gateway.
//!
//! Layer order (outermost first):
//!
//! ```text
//! Request → Tracing → StaticHeaders → CORS → BodyLimit → ReadinessGate → Handler
//! ```
//!
//! Tracing sees the final status of every response. CORS answers preflights
//! before the gate. Static headers wrap both, so preflights and the gate's
//! 503 and 404 responses carry them too.

pub mod cors;
pub mod gate;
pub mod headers;
pub mod metrics;
pub mod tracing;

pub use cors::create_cors_layer;
pub use gate::{ReadinessGateLayer, ReadinessGateService};
pub use headers::{StaticHeadersLayer, StaticHeadersService};
pub use metrics::{GatewayMetrics, RequestTimer};
pub use self::tracing::{TracingLayer, TracingService};
