use uuid::Uuid;

/// Generate a trace ID (32 hex characters).
pub fn generate_trace_id() -> String {
    Uuid::new_v4().as_simple().to_string()
}

/// Create a named span for one container operation, returning the span and
/// its trace ID for logging correlation.
pub fn create_operation_span(operation: &str, container: &str) -> (tracing::Span, String) {
    let trace_id = generate_trace_id();
    let span = tracing::info_span!(
        "operation",
        trace_id = %trace_id,
        operation = %operation,
        container = %container,
    );
    (span, trace_id)
}
