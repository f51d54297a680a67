//! Environment mode state machine.
//!
//! Pure bookkeeping over mode x visibility x lock x debug overlay. The
//! controller feeds it events and applies the side effects of the result.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvironmentMode {
    #[default]
    Default,
    MeasuringHeight,
    PaintingMaterial,
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoomState {
    #[default]
    Unlocked,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentEvent {
    BeginMeasuring,
    BeginPainting,
    /// Explicit "done" for measuring or painting.
    Confirm,
    /// Back out of measuring or painting.
    Cancel,
    StartPlaying { sources: usize },
    StopPlaying,
    Lock,
    Unlock,
    Show,
    Hide,
    ToggleDebug,
    /// Back to start-up state.
    Reset,
}

/// Why an event was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("environment is locked")]
    Locked,

    #[error("not available in {0:?} mode")]
    Busy(EnvironmentMode),

    #[error("place at least one source before playing")]
    NoSources,

    #[error("nothing to confirm or cancel")]
    NothingPending,

    #[error("debug overlay is unavailable while painting")]
    DebugWhilePainting,

    #[error("finish adjusting the environment before placing sources")]
    EnvironmentVisible,

    #[error("surface painting requires painting mode")]
    NotPainting,

    #[error("object does not fit on a plane of this alignment")]
    AlignmentNotAllowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    None,
    ModeChanged(EnvironmentMode),
    /// Measuring or painting ended with a commit.
    Confirmed(EnvironmentMode),
    /// Measuring or painting ended without a commit.
    Cancelled(EnvironmentMode),
    LockChanged(RoomState),
    VisibilityChanged(bool),
    DebugChanged(bool),
    Rejected(Rejection),
}

#[derive(Debug, Clone, Default)]
pub struct EnvironmentFsm {
    mode: EnvironmentMode,
    lock: RoomState,
    visible: bool,
    debug: bool,
}

impl EnvironmentFsm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transition(&mut self, event: EnvironmentEvent) -> TransitionResult {
        use EnvironmentEvent::*;
        use EnvironmentMode as Mode;

        match event {
            BeginMeasuring => match (self.mode, self.lock) {
                (Mode::Default, RoomState::Unlocked) => {
                    self.mode = Mode::MeasuringHeight;
                    self.visible = true;
                    TransitionResult::ModeChanged(self.mode)
                }
                (Mode::Default, RoomState::Locked) => TransitionResult::Rejected(Rejection::Locked),
                (mode, _) => TransitionResult::Rejected(Rejection::Busy(mode)),
            },

            BeginPainting => match self.mode {
                Mode::Default => {
                    self.mode = Mode::PaintingMaterial;
                    self.visible = true;
                    self.debug = false;
                    TransitionResult::ModeChanged(self.mode)
                }
                mode => TransitionResult::Rejected(Rejection::Busy(mode)),
            },

            Confirm | Cancel => match self.mode {
                mode @ (Mode::MeasuringHeight | Mode::PaintingMaterial) => {
                    self.mode = Mode::Default;
                    if event == Confirm {
                        TransitionResult::Confirmed(mode)
                    } else {
                        TransitionResult::Cancelled(mode)
                    }
                }
                _ => TransitionResult::Rejected(Rejection::NothingPending),
            },

            StartPlaying { sources } => match self.mode {
                Mode::Default if sources == 0 => TransitionResult::Rejected(Rejection::NoSources),
                Mode::Default => {
                    self.mode = Mode::Playing;
                    self.visible = false;
                    self.debug = false;
                    TransitionResult::ModeChanged(self.mode)
                }
                Mode::Playing => TransitionResult::None,
                mode => TransitionResult::Rejected(Rejection::Busy(mode)),
            },

            StopPlaying => match self.mode {
                Mode::Playing => {
                    self.mode = Mode::Default;
                    TransitionResult::ModeChanged(self.mode)
                }
                _ => TransitionResult::None,
            },

            Lock | Unlock => {
                if self.mode == Mode::MeasuringHeight {
                    return TransitionResult::Rejected(Rejection::Busy(self.mode));
                }
                let target = if event == Lock {
                    RoomState::Locked
                } else {
                    RoomState::Unlocked
                };
                if self.lock == target {
                    return TransitionResult::None;
                }
                self.lock = target;
                TransitionResult::LockChanged(target)
            }

            Show | Hide => {
                let visible = event == Show;
                if self.visible == visible {
                    return TransitionResult::None;
                }
                match self.mode {
                    Mode::Default => {
                        self.visible = visible;
                        TransitionResult::VisibilityChanged(visible)
                    }
                    mode => TransitionResult::Rejected(Rejection::Busy(mode)),
                }
            }

            ToggleDebug => match self.mode {
                Mode::PaintingMaterial => TransitionResult::Rejected(Rejection::DebugWhilePainting),
                _ => {
                    self.debug = !self.debug;
                    TransitionResult::DebugChanged(self.debug)
                }
            },

            Reset => {
                *self = Self::default();
                TransitionResult::ModeChanged(self.mode)
            }
        }
    }

    pub fn mode(&self) -> EnvironmentMode {
        self.mode
    }

    pub fn lock(&self) -> RoomState {
        self.lock
    }

    pub fn is_locked(&self) -> bool {
        self.lock == RoomState::Locked
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Whether floor updates must leave the room as it is.
    ///
    /// Painting counts as locked so surfaces do not move under the user.
    /// Measuring keeps refitting against the committed height.
    pub fn is_frozen(&self) -> bool {
        self.is_locked()
            || matches!(
                self.mode,
                EnvironmentMode::Playing | EnvironmentMode::PaintingMaterial
            )
    }
}
