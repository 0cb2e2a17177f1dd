//! Tool-call accumulator
//!
//! Transient per-turn buffer assembling a fragmented tool call out of
//! streamed deltas. One tool is advertised, so a single accumulator suffices
//! and fragments are assumed to arrive in order.

use crate::core::ToolCall;
use crate::llm::StreamEvent;

/// Assembles a tool call across one streaming turn.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    name: Option<String>,
    raw_arguments: String,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one stream event into the accumulator. Non-tool events are
    /// ignored.
    pub fn observe(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::ToolCallStart(name) => {
                // Last name wins; a restarted call discards stale fragments.
                if self.name.as_deref() != Some(name) {
                    self.raw_arguments.clear();
                }
                self.name = Some(name.clone());
            }
            StreamEvent::ToolCallArgsDelta(fragment) => {
                self.raw_arguments.push_str(fragment);
            }
            StreamEvent::TextDelta(_) | StreamEvent::End => {}
        }
    }

    /// Whether any tool call was started this turn.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }

    /// Consume the accumulator, yielding the assembled call if the stream
    /// ever named one.
    pub fn finish(self) -> Option<ToolCall> {
        self.name
            .map(|name| ToolCall::new(name, self.raw_arguments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragments_concatenate_in_order() {
        let mut acc = ToolCallAccumulator::new();
        acc.observe(&StreamEvent::ToolCallStart("get_preview".into()));
        acc.observe(&StreamEvent::ToolCallArgsDelta("{\"code\":".into()));
        acc.observe(&StreamEvent::ToolCallArgsDelta("\"x=1\"}".into()));
        acc.observe(&StreamEvent::End);

        let call = acc.finish().unwrap();
        assert_eq!(call.name, "get_preview");

        let args: serde_json::Value = serde_json::from_str(&call.raw_arguments).unwrap();
        assert_eq!(args["code"], "x=1");
    }

    #[test]
    fn test_no_tool_call_yields_none() {
        let mut acc = ToolCallAccumulator::new();
        acc.observe(&StreamEvent::TextDelta("just an answer".into()));
        acc.observe(&StreamEvent::End);

        assert!(acc.is_empty());
        assert!(acc.finish().is_none());
    }

    #[test]
    fn test_restarted_call_discards_stale_fragments() {
        let mut acc = ToolCallAccumulator::new();
        acc.observe(&StreamEvent::ToolCallStart("first".into()));
        acc.observe(&StreamEvent::ToolCallArgsDelta("{\"a\":1}".into()));
        acc.observe(&StreamEvent::ToolCallStart("second".into()));
        acc.observe(&StreamEvent::ToolCallArgsDelta("{\"b\":2}".into()));

        let call = acc.finish().unwrap();
        assert_eq!(call.name, "second");
        assert_eq!(call.raw_arguments, "{\"b\":2}");
    }
}
