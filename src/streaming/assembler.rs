//! Delta accumulation.

use crate::types::MessageKind;

/// Content of the in-flight message after a delta was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledUpdate {
    pub content: String,
    pub kind: MessageKind,
}

/// Accumulated text of one stream session.
#[derive(Debug, Clone, Default)]
pub struct StreamAssembler {
    accumulated: String,
    kind: MessageKind,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `delta`. Empty deltas change nothing and return `None`.
    pub fn push_delta(&mut self, delta: &str) -> Option<AssembledUpdate> {
        if delta.is_empty() {
            return None;
        }
        self.accumulated.push_str(delta);
        self.kind = self.kind.observe(&self.accumulated);
        Some(AssembledUpdate {
            content: self.accumulated.clone(),
            kind: self.kind,
        })
    }

    pub fn text(&self) -> &str {
        &self.accumulated
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn into_parts(self) -> (String, MessageKind) {
        (self.accumulated, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_in_order() {
        let mut assembler = StreamAssembler::new();
        assembler.push_delta("Hel");
        let update = assembler.push_delta("lo").unwrap();
        assert_eq!(update.content, "Hello");
        assert_eq!(update.kind, MessageKind::Plain);
    }

    #[test]
    fn empty_delta_is_not_an_update() {
        let mut assembler = StreamAssembler::new();
        assert!(assembler.push_delta("").is_none());
        assert_eq!(assembler.text(), "");
    }

    #[test]
    fn fence_split_across_deltas_is_detected() {
        let mut assembler = StreamAssembler::new();
        assert_eq!(assembler.push_delta("see ``").unwrap().kind, MessageKind::Plain);
        assert_eq!(assembler.push_delta("`py").unwrap().kind, MessageKind::Code);
        assert_eq!(assembler.push_delta("\nx = 1").unwrap().kind, MessageKind::Code);
    }
}
