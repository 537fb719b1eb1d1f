//! Cross-module event plumbing.
//!
//! Business modules do NOT depend on the notification module. They only
//! know this trait. The concrete implementation is injected at startup
//! time; modules record domain events through it and the sink decides
//! what happens next.

use std::sync::Mutex;

/// A domain event captured by a sink. `name` is a dotted identifier such
/// as `customer.created` or `stock.low`; `data` is the event payload that
/// downstream consumers (trigger matching, templates, webhooks) see.
#[derive(Debug, Clone)]
pub struct Event {
    pub org_id: String,
    pub name: String,
    pub data: serde_json::Value,
}

/// Pluggable event sink. Modules call [`EventSink::emit`] after the state
/// change that produced the event has been committed.
///
/// Implementations must return quickly and must never fail the caller:
/// event delivery is fire-and-forget, and a slow or broken consumer must
/// not roll back the business operation that emitted the event.
pub trait EventSink: Send + Sync + 'static {
    /// Record a domain event for the given organization.
    fn emit(&self, org_id: &str, name: &str, data: serde_json::Value);
}

/// A sink that discards every event. Used when a module runs without the
/// notification pipeline wired in.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _org_id: &str, _name: &str, _data: serde_json::Value) {}
}

/// A sink that records events in memory. Used in tests to assert that a
/// service emitted what it should have.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Names of emitted events, in emission order.
    pub fn names(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|e| e.name)
            .collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, org_id: &str, name: &str, data: serde_json::Value) {
        if let Ok(mut events) = self.events.lock() {
            events.push(Event {
                org_id: org_id.to_string(),
                name: name.to_string(),
                data,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.emit("org1", "customer.created", serde_json::json!({"id": "c1"}));
        sink.emit("org1", "sale.recorded", serde_json::json!({"total": 12.5}));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "customer.created");
        assert_eq!(events[0].org_id, "org1");
        assert_eq!(events[1].data["total"], 12.5);
        assert_eq!(sink.names(), vec!["customer.created", "sale.recorded"]);
    }

    #[test]
    fn null_sink_ignores() {
        let sink = NullSink;
        sink.emit("org1", "anything", serde_json::Value::Null);
    }
}
