use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseEventKind {
    Press,
    Move,
    Release,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
}

/// Pointer event already mapped into the data space of the viewer: one
/// coordinate per global axis, with non-displayed axes at the current point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub coordinate: Vec<f64>,
    pub is_dragging: bool,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl MouseEvent {
    pub fn press(coordinate: impl Into<Vec<f64>>) -> Self {
        Self::new(MouseEventKind::Press, coordinate, false)
    }

    pub fn drag(coordinate: impl Into<Vec<f64>>) -> Self {
        Self::new(MouseEventKind::Move, coordinate, true)
    }

    pub fn hover(coordinate: impl Into<Vec<f64>>) -> Self {
        Self::new(MouseEventKind::Move, coordinate, false)
    }

    pub fn release(coordinate: impl Into<Vec<f64>>) -> Self {
        Self::new(MouseEventKind::Release, coordinate, false)
    }

    fn new(kind: MouseEventKind, coordinate: impl Into<Vec<f64>>, is_dragging: bool) -> Self {
        Self {
            kind,
            coordinate: coordinate.into(),
            is_dragging,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}
