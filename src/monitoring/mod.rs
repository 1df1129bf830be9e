/*!
 * Monitoring
 * Tracing setup for the sync primitives and the demo binary
 */

mod tracer;

pub use tracer::{init_tracing, span_operation, try_init_tracing, OperationSpan};
