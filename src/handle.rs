use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{Display, Framebuffer, Keypad};

/// Run-state flags shared between the emulation thread and its consumers.
pub(crate) struct Signals {
    running: AtomicBool,
    beeping: AtomicBool,
}

impl Signals {
    pub(crate) fn new() -> Self {
        Signals {
            running: AtomicBool::new(true),
            beeping: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub(crate) fn halt(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub(crate) fn set_beeping(&self, beeping: bool) {
        self.beeping.store(beeping, Ordering::Relaxed);
    }

    pub(crate) fn is_beeping(&self) -> bool {
        self.beeping.load(Ordering::Relaxed)
    }
}

/// Cloneable consumer-side view of a running emulator.
///
/// A handle lets a presenter read the display, an input source feed the
/// keypad, and a controlling process observe or end the run, all from
/// outside the emulation thread.
#[derive(Clone)]
pub struct Chip8Handle {
    framebuffer: Arc<Framebuffer>,
    keypad: Arc<Keypad>,
    signals: Arc<Signals>,
}

impl Chip8Handle {
    pub(crate) fn new(
        framebuffer: Arc<Framebuffer>,
        keypad: Arc<Keypad>,
        signals: Arc<Signals>,
    ) -> Self {
        Chip8Handle {
            framebuffer,
            keypad,
            signals,
        }
    }

    /// Get the state of a pixel on the display (true = on, false = off).
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.framebuffer.pixel(x, y)
    }

    /// Returns true if the display changed since it was last presented.
    pub fn is_dirty(&self) -> bool {
        self.framebuffer.is_dirty()
    }

    pub fn clear_dirty(&self) {
        self.framebuffer.clear_dirty()
    }

    /// Copies the display into `dest` and clears the dirty flag if the
    /// display changed since the last copy. Returns whether it did.
    pub fn copy_if_dirty(&self, dest: &mut Display<bool>) -> bool {
        self.framebuffer.copy_if_dirty(dest)
    }

    /// Set the state of a key on the keypad. Indices outside 0x0-0xF are
    /// ignored.
    pub fn set_key(&self, key: u8, pressed: bool) {
        self.keypad.set(key, pressed);
    }

    /// Returns true if the sound timer is active, indicating a beep should
    /// be played.
    pub fn should_beep(&self) -> bool {
        self.signals.is_beeping()
    }

    /// Returns true until the run halts, either on request or on a fault.
    pub fn is_running(&self) -> bool {
        self.signals.is_running()
    }

    /// Requests a cooperative shutdown. The emulation thread observes the
    /// request within one scheduler iteration. A halted run is not
    /// resumable.
    pub fn shutdown(&self) {
        self.signals.halt();
    }
}
