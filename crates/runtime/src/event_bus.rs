use crate::frame::Frame;

/// Coarse event category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Lifecycle,
    Asset,
    Frame,
}

/// A traced event, tagged with the frame during (or before) which it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub frame_index: u64,
    pub kind: EventKind,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, frame: Frame, kind: EventKind, message: impl Into<String>) {
        let message = message.into();
        tracing::trace!(frame = frame.index, ?kind, %message, "event");
        self.events.push(Event {
            frame_index: frame.index,
            kind,
            message,
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter().filter(move |e| e.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::{EventBus, EventKind};
    use crate::frame::Frame;

    #[test]
    fn records_events_with_frame_index() {
        let mut bus = EventBus::new();
        bus.emit(Frame::new(2), EventKind::Asset, "hello");
        assert_eq!(bus.events().len(), 1);
        assert_eq!(bus.events()[0].frame_index, 2);
    }

    #[test]
    fn filters_by_kind() {
        let mut bus = EventBus::new();
        bus.emit(Frame::new(0), EventKind::Lifecycle, "attached");
        bus.emit(Frame::new(0), EventKind::Asset, "loaded");
        bus.emit(Frame::new(1), EventKind::Lifecycle, "detached");
        let lifecycle: Vec<_> = bus
            .of_kind(EventKind::Lifecycle)
            .map(|e| e.message.as_str())
            .collect();
        assert_eq!(lifecycle, vec!["attached", "detached"]);
    }
}
