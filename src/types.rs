/// Result type for CHIP-8 CPU cycle execution
#[derive(Debug, PartialEq, Eq)]
pub enum Chip8Result {
    /// Continue executing instructions.
    Continue,
    /// The instruction is waiting for a key press and did not advance;
    /// it will be re-fetched on the next cycle.
    WaitForKey,
}

/// Error types that can occur during CHIP-8 emulation.
///
/// All of these are fatal for the run; recoverable conditions (unknown or
/// unimplemented opcodes) are logged and skipped instead.
#[derive(Debug, thiserror::Error)]
pub enum Chip8Error {
    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    RomLoadError { size: usize, max_size: usize },

    #[error("Program counter out of bounds at {pc:#05X}")]
    PcOutOfBounds { pc: u16 },

    #[error("Memory access out of bounds at address {address:#06X}")]
    MemoryOutOfBounds { address: u16 },

    #[error("Stack underflow: attempted to return from a subroutine with empty call stack")]
    StackUnderflow,
}

pub const DISPLAY_X: usize = 64;
pub const DISPLAY_Y: usize = 32;
/// A type alias for the CHIP-8 display buffer representation
pub type Display<T> = [[T; DISPLAY_X]; DISPLAY_Y];
