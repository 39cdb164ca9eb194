#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A small, allocation-friendly trace event.
///
/// `tag` is usually a static label (an action or branch name); `a` and
/// `b` carry event-specific payloads such as the agent id or a quantized
/// score.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceEvent {
    pub tick: u64,
    pub tag: Cow<'static, str>,
    pub a: u64,
    pub b: u64,
}

impl TraceEvent {
    pub fn new(tick: u64, tag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            tick,
            tag: tag.into(),
            a: 0,
            b: 0,
        }
    }

    pub fn with_a(mut self, a: u64) -> Self {
        self.a = a;
        self
    }

    pub fn with_b(mut self, b: u64) -> Self {
        self.b = b;
        self
    }
}

pub trait TraceSink {
    fn emit(&mut self, event: TraceEvent);
}

#[derive(Debug, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn emit(&mut self, _event: TraceEvent) {}
}

#[derive(Debug, Default)]
pub struct VecTraceSink {
    pub events: Vec<TraceEvent>,
}

impl TraceSink for VecTraceSink {
    fn emit(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}

/// In-memory event log owned by whoever wants the history (typically a
/// per-agent memory store in tests).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn record(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Tags in emission order, for terse test assertions.
    pub fn tags(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.tag.as_ref()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_preserves_order_and_payloads() {
        let mut log = TraceLog::default();
        log.record(TraceEvent::new(1, "branch.enter").with_a(7));
        log.record(TraceEvent::new(2, "action.switch").with_a(7).with_b(3));

        assert_eq!(log.tags(), vec!["branch.enter", "action.switch"]);
        assert_eq!(log.events[1].b, 3);
    }

    #[test]
    fn sinks_receive_events() {
        let mut sink = VecTraceSink::default();
        sink.emit(TraceEvent::new(4, "noise.burst").with_a(8000));
        assert_eq!(sink.events.len(), 1);
        assert_eq!(sink.events[0].tick, 4);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn log_round_trips_through_json() {
        let mut log = TraceLog::default();
        log.record(TraceEvent::new(9, "survey.rebuild").with_a(2).with_b(12));

        let json = serde_json::to_string(&log).unwrap();
        let back: TraceLog = serde_json::from_str(&json).unwrap();
        assert_eq!(log, back);
    }
}
