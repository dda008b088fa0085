//! Display state of a rendered diagram: inline or fullscreen, plus zoom.
//!
//! Zoom is kept as an integer number of 0.2 steps so clamping never drifts.

pub const ZOOM_MIN: f32 = 0.2;
pub const ZOOM_MAX: f32 = 4.0;
pub const ZOOM_STEP: f32 = 0.2;

const MIN_STEPS: u8 = 1;
const MAX_STEPS: u8 = 20;
const DEFAULT_STEPS: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Embedded in the page with a bounded, scrollable height.
    Inline,
    Fullscreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportAction {
    ToggleFullscreen,
    ZoomIn,
    ZoomOut,
    ResetZoom,
}

impl std::str::FromStr for ViewportAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fullscreen" => Ok(ViewportAction::ToggleFullscreen),
            "zoom-in" => Ok(ViewportAction::ZoomIn),
            "zoom-out" => Ok(ViewportAction::ZoomOut),
            "reset" => Ok(ViewportAction::ResetZoom),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    mode: DisplayMode,
    zoom_steps: u8,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            mode: DisplayMode::Inline,
            zoom_steps: DEFAULT_STEPS,
        }
    }
}

impl Viewport {
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn is_fullscreen(&self) -> bool {
        self.mode == DisplayMode::Fullscreen
    }

    pub fn zoom(&self) -> f32 {
        self.zoom_steps as f32 * ZOOM_STEP
    }

    /// Displayed width of the diagram as a percentage of its container.
    /// Zoom only applies in fullscreen.
    pub fn width_percent(&self) -> u32 {
        match self.mode {
            DisplayMode::Inline => 100,
            DisplayMode::Fullscreen => self.zoom_steps as u32 * 20,
        }
    }

    /// Apply `action`; returns whether anything changed.
    pub fn apply(&mut self, action: ViewportAction) -> bool {
        let before = *self;
        match action {
            ViewportAction::ToggleFullscreen => {
                self.mode = match self.mode {
                    DisplayMode::Inline => DisplayMode::Fullscreen,
                    DisplayMode::Fullscreen => DisplayMode::Inline,
                };
                self.zoom_steps = DEFAULT_STEPS;
            }
            ViewportAction::ZoomIn if self.is_fullscreen() => {
                self.zoom_steps = (self.zoom_steps + 1).min(MAX_STEPS);
            }
            ViewportAction::ZoomOut if self.is_fullscreen() => {
                self.zoom_steps = self.zoom_steps.saturating_sub(1).max(MIN_STEPS);
            }
            ViewportAction::ResetZoom => self.zoom_steps = DEFAULT_STEPS,
            ViewportAction::ZoomIn | ViewportAction::ZoomOut => {}
        }
        *self != before
    }
}
