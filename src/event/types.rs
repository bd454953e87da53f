use crate::foundation::core::{NodeId, Point};

/// Handle to a registered event listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

/// Fixed bubbling event vocabulary dispatched by the stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Mouse button pressed over a node.
    MouseDown,
    /// Mouse button released over a node.
    MouseUp,
    /// Pointer moved over a node.
    MouseMove,
    /// Pointer entered a node (bubbles).
    MouseOver,
    /// Pointer left a node (bubbles).
    MouseOut,
    /// Pointer entered a node (does not bubble).
    MouseEnter,
    /// Pointer left a node (does not bubble).
    MouseLeave,
    /// Press and release on the same node.
    Click,
    /// Two clicks on the same node within the double-click window.
    DblClick,
    /// Touch began over a node.
    TouchStart,
    /// Touch moved over a node.
    TouchMove,
    /// Touch ended over a node.
    TouchEnd,
    /// Touch press-and-release on the same node.
    Tap,
    /// Two taps on the same node within the double-tap window.
    DblTap,
    /// Drag gesture crossed the start threshold.
    DragStart,
    /// Dragged node moved.
    DragMove,
    /// Drag gesture ended.
    DragEnd,
}

impl EventType {
    /// Canonical lowercase event name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MouseDown => "mousedown",
            Self::MouseUp => "mouseup",
            Self::MouseMove => "mousemove",
            Self::MouseOver => "mouseover",
            Self::MouseOut => "mouseout",
            Self::MouseEnter => "mouseenter",
            Self::MouseLeave => "mouseleave",
            Self::Click => "click",
            Self::DblClick => "dblclick",
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
            Self::TouchEnd => "touchend",
            Self::Tap => "tap",
            Self::DblTap => "dbltap",
            Self::DragStart => "dragstart",
            Self::DragMove => "dragmove",
            Self::DragEnd => "dragend",
        }
    }

    /// Whether this event bubbles through the ancestor chain.
    pub fn bubbles(self) -> bool {
        !matches!(self, Self::MouseEnter | Self::MouseLeave)
    }
}

/// Event payload delivered to listeners along the bubble path.
#[derive(Debug)]
pub struct Event {
    /// Which event fired.
    pub event_type: EventType,
    /// Node the event was originally dispatched to.
    pub target: NodeId,
    /// Node whose listener is currently being invoked.
    pub current_target: NodeId,
    /// Pointer position in stage-space coordinates.
    pub pointer: Point,
    stopped: bool,
}

impl Event {
    pub(crate) fn new(event_type: EventType, target: NodeId, pointer: Point) -> Self {
        Self {
            event_type,
            target,
            current_target: target,
            pointer,
            stopped: false,
        }
    }

    /// Halt bubbling after the current listener list finishes.
    pub fn stop_propagation(&mut self) {
        self.stopped = true;
    }

    /// Whether a listener has halted bubbling.
    pub fn propagation_stopped(&self) -> bool {
        self.stopped
    }
}
