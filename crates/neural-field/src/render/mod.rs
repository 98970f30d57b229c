mod backdrop;
mod debug;
mod nannou_surface;
mod notification;

pub use backdrop::Backdrop;
pub use debug::{DebugOverlay, EngineStats, SPECTRUM_BARS};
pub use nannou_surface::NannouSurface;
pub use notification::Notification;

/// Window settings for the host
pub struct Resolution {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl Resolution {
    pub fn windowed() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
        }
    }

    pub fn fullscreen() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: true,
        }
    }

    pub fn current(windowed: bool) -> Self {
        if windowed || cfg!(debug_assertions) {
            Self::windowed()
        } else {
            Self::fullscreen()
        }
    }
}
