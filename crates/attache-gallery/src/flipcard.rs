use std::sync::{Mutex, MutexGuard, PoisonError};

/// Which side of the creation card is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Browse,
    Compose,
}

/// Where a click on the creation card landed. Clicks on form controls
/// must not flip the card back while the user is filling it in.
#[derive(Debug, Clone, Copy)]
pub struct ClickTarget {
    pub face: Face,
    pub on_form_control: bool,
}

/// Two-faced creation card: the browse face invites, the compose face
/// holds the upload form. Toggled by clicks outside form controls and
/// reset to browse whenever the collection refreshes.
#[derive(Default)]
pub struct FlipCardController {
    face: Mutex<FaceState>,
}

#[derive(Default)]
struct FaceState {
    composing: bool,
}

impl FlipCardController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn face(&self) -> Face {
        if self.lock().composing {
            Face::Compose
        } else {
            Face::Browse
        }
    }

    /// Apply a click. Returns the face now showing.
    pub fn click(&self, target: ClickTarget) -> Face {
        let mut state = self.lock();
        match target.face {
            Face::Browse => state.composing = true,
            Face::Compose if !target.on_form_control => state.composing = false,
            Face::Compose => {}
        }
        if state.composing {
            Face::Compose
        } else {
            Face::Browse
        }
    }

    /// Force the browse face, regardless of current state.
    pub fn reset(&self) {
        self.lock().composing = false;
    }

    fn lock(&self) -> MutexGuard<'_, FaceState> {
        self.face.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
