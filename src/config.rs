/// Default CPU clock rate in Hz.
pub const DEFAULT_CPU_HZ: u32 = 700;
/// Compatibility preset for ROMs written against slower interpreters.
pub const SLOW_CPU_HZ: u32 = 350;

/// Emulator configuration, read once at startup and fixed for the run.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// CPU clock rate in Hz, used to size the scheduler's cycle batches.
    pub cpu_hz: u32,
    pub quirks: Quirks,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cpu_hz: DEFAULT_CPU_HZ,
            quirks: Quirks::default(),
        }
    }
}

/// Historical behavioral variations, selectable per run.
///
/// The quirks are independent booleans; the defaults match the modern
/// interpreter behavior.
#[derive(Clone, Copy, Debug, Default)]
pub struct Quirks {
    /// 8XY6/8XYE copy VY into VX before shifting (original COSMAC VIP behavior).
    pub shift_copies_vy: bool,
    /// BNNN jumps to NNN + VX (X taken from the instruction's second nibble)
    /// instead of NNN + V0.
    pub jump_uses_vx: bool,
    /// FX55/FX65 advance I past the copied registers (I += X + 1).
    pub increment_index: bool,
}
