use egui::{Context, PointerButton, Pos2, Rect};

/// Pointer input delivered to the editor, in screen coordinates.
///
/// Only the primary button drives gestures, so the button is implied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Primary button was pressed
    PointerDown { position: Pos2 },
    /// Pointer moved (with or without the button held)
    PointerMove { position: Pos2 },
    /// Primary button was released
    PointerUp { position: Pos2 },
}

impl InputEvent {
    pub fn position(&self) -> Pos2 {
        match self {
            Self::PointerDown { position }
            | Self::PointerMove { position }
            | Self::PointerUp { position } => *position,
        }
    }
}

/// Handles converting raw egui input into our domain-specific InputEvents
#[derive(Debug, Default)]
pub struct InputHandler {
    last_pointer_pos: Option<Pos2>,
    /// A press started on the canvas and has not been released yet
    pressed: bool,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process raw egui input over `canvas_rect` and generate our InputEvents.
    ///
    /// A gesture that starts on the canvas keeps receiving moves and its
    /// release even when the pointer leaves the canvas.
    pub fn process_input(&mut self, ctx: &Context, canvas_rect: Rect) -> Vec<InputEvent> {
        let mut events = Vec::new();

        ctx.input(|input| {
            let hover = input.pointer.hover_pos();

            if let Some(pos) = hover {
                if input.pointer.button_pressed(PointerButton::Primary) && canvas_rect.contains(pos) {
                    self.pressed = true;
                    events.push(InputEvent::PointerDown { position: pos });
                } else if Some(pos) != self.last_pointer_pos
                    && (self.pressed || canvas_rect.contains(pos))
                {
                    events.push(InputEvent::PointerMove { position: pos });
                }
            }

            if self.pressed && input.pointer.button_released(PointerButton::Primary) {
                if let Some(pos) = hover.or(self.last_pointer_pos) {
                    events.push(InputEvent::PointerUp { position: pos });
                }
                self.pressed = false;
            }

            if hover.is_some() {
                self.last_pointer_pos = hover;
            }
        });

        events
    }
}
