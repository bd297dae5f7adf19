//! The windowing seam.
//!
//! The loading pipeline never touches this layer; it exists so applications
//! can drive an event loop and present frames through the same kind of
//! backend-agnostic trait the GPU side uses. Only the headless backend is
//! bundled.

use std::collections::VecDeque;

/// Input and lifecycle events a window backend reports, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Resized { width: u32, height: u32 },
    KeyPressed(u32),
    KeyReleased(u32),
    MouseMoved { x: f32, y: f32 },
    MousePressed(u8),
    MouseReleased(u8),
    CloseRequested,
}

/// A presentable surface with an event queue.
pub trait Window {
    /// Drains pending events into `events` without blocking.
    fn poll_events(&mut self, events: &mut Vec<Event>);

    /// Presents the back buffer.
    fn swap_buffers(&mut self);

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32);

    /// The drawable size in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Requests the window to close; `is_closing` flips immediately.
    fn close(&mut self);

    fn is_closing(&self) -> bool;
}

/// A window without a surface. Events are injected by the caller, swaps
/// count frames; used by tests and CI.
pub struct HeadlessWindow {
    dimensions: (u32, u32),
    viewport: (u32, u32, u32, u32),
    queued: VecDeque<Event>,
    closing: bool,
    frames: usize,
}

impl HeadlessWindow {
    pub fn new(width: u32, height: u32) -> Self {
        HeadlessWindow {
            dimensions: (width, height),
            viewport: (0, 0, width, height),
            queued: VecDeque::new(),
            closing: false,
            frames: 0,
        }
    }

    /// Queues an event for the next `poll_events`. A resize also updates
    /// the reported dimensions, like a real backend would.
    pub fn push_event(&mut self, event: Event) {
        if let Event::Resized { width, height } = event {
            self.dimensions = (width, height);
        }
        self.queued.push_back(event);
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn viewport(&self) -> (u32, u32, u32, u32) {
        self.viewport
    }
}

impl Window for HeadlessWindow {
    fn poll_events(&mut self, events: &mut Vec<Event>) {
        while let Some(event) = self.queued.pop_front() {
            if event == Event::CloseRequested {
                self.closing = true;
            }
            events.push(event);
        }
    }

    fn swap_buffers(&mut self) {
        self.frames += 1;
    }

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.viewport = (x, y, width, height);
    }

    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    fn close(&mut self) {
        self.closing = true;
    }

    fn is_closing(&self) -> bool {
        self.closing
    }
}
