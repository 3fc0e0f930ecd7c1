use bitflags::bitflags;

/// Logical pointer identity used to key focus bindings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputId(pub u64);

impl InputId {
    /// Mouse, taps and single-touch input.
    pub const PRIMARY: InputId = InputId(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Began,
    Moved,
    Stationary,
    Ended,
    Cancelled,
}

impl TouchPhase {
    /// The contact is gone after this phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, TouchPhase::Ended | TouchPhase::Cancelled)
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct MouseButtons: u8 {
        const PRIMARY   = 0b001;
        const SECONDARY = 0b010;
        const MIDDLE    = 0b100;
    }
}

/// Which listeners an event is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Touch,
    Tap,
    Mouse,
}

/// Input events. Coordinates are in content space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Touch {
        id: InputId,
        phase: TouchPhase,
        x: f32,
        y: f32,
        x_start: f32,
        y_start: f32,
    },
    Tap {
        x: f32,
        y: f32,
        num_taps: u32,
    },
    Mouse {
        x: f32,
        y: f32,
        buttons: MouseButtons,
        scroll_x: f32,
        scroll_y: f32,
    },
}

impl Event {
    pub fn touch(id: InputId, phase: TouchPhase, x: f32, y: f32) -> Self {
        Event::Touch {
            id,
            phase,
            x,
            y,
            x_start: x,
            y_start: y,
        }
    }

    pub fn tap(x: f32, y: f32) -> Self {
        Event::Tap { x, y, num_taps: 1 }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::Touch { .. } => EventKind::Touch,
            Event::Tap { .. } => EventKind::Tap,
            Event::Mouse { .. } => EventKind::Mouse,
        }
    }

    pub fn coords(&self) -> (f32, f32) {
        match *self {
            Event::Touch { x, y, .. } | Event::Tap { x, y, .. } | Event::Mouse { x, y, .. } => {
                (x, y)
            }
        }
    }

    pub fn input_id(&self) -> InputId {
        match *self {
            Event::Touch { id, .. } => id,
            Event::Tap { .. } | Event::Mouse { .. } => InputId::PRIMARY,
        }
    }

    pub fn phase(&self) -> Option<TouchPhase> {
        match *self {
            Event::Touch { phase, .. } => Some(phase),
            _ => None,
        }
    }
}

/// Result of delivering an event to a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResponse {
    /// Keep propagating
    Ignored,
    /// Stop propagation
    Handled,
}

impl EventResponse {
    pub fn is_handled(self) -> bool {
        self == EventResponse::Handled
    }
}

impl From<bool> for EventResponse {
    fn from(handled: bool) -> Self {
        if handled {
            EventResponse::Handled
        } else {
            EventResponse::Ignored
        }
    }
}

/// One contact of a multi-touch input frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: InputId,
    pub phase: TouchPhase,
    pub x: f32,
    pub y: f32,
    pub x_start: f32,
    pub y_start: f32,
}

impl TouchPoint {
    pub fn to_event(&self) -> Event {
        Event::Touch {
            id: self.id,
            phase: self.phase,
            x: self.x,
            y: self.y,
            x_start: self.x_start,
            y_start: self.y_start,
        }
    }
}

/// Split a multi-touch frame into one touch event per contact.
pub fn split_multitouch(points: &[TouchPoint]) -> impl Iterator<Item = Event> + '_ {
    points.iter().map(TouchPoint::to_event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_multitouch_keeps_ids() {
        let points = [
            TouchPoint {
                id: InputId(3),
                phase: TouchPhase::Began,
                x: 1.0,
                y: 2.0,
                x_start: 1.0,
                y_start: 2.0,
            },
            TouchPoint {
                id: InputId(9),
                phase: TouchPhase::Moved,
                x: 5.0,
                y: 6.0,
                x_start: 0.0,
                y_start: 0.0,
            },
        ];
        let events: Vec<Event> = split_multitouch(&points).collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].input_id(), InputId(3));
        assert_eq!(events[1].input_id(), InputId(9));
        assert_eq!(events[1].coords(), (5.0, 6.0));
        assert_eq!(events[1].phase(), Some(TouchPhase::Moved));
    }

    #[test]
    fn test_non_touch_events_use_primary_input() {
        assert_eq!(Event::tap(0.0, 0.0).input_id(), InputId::PRIMARY);
        assert_eq!(Event::tap(0.0, 0.0).phase(), None);
    }

    #[test]
    fn test_terminal_phases() {
        assert!(TouchPhase::Ended.is_terminal());
        assert!(TouchPhase::Cancelled.is_terminal());
        assert!(!TouchPhase::Moved.is_terminal());
    }
}
