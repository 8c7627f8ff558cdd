use std::sync::Arc;

use crate::{
    Chip8Error, Chip8Result, Framebuffer, Keypad, Opcode, Quirks,
    font::{FONT, FONT_END_ADDRESS, FONT_START_ADDRESS},
};

// The constants are specified by the CHIP-8 specification
const ROM_START_ADDRESS: usize = 0x200;
pub(crate) const MEMORY_SIZE: usize = 4096;

/// CHIP-8 virtual machine state
pub struct Chip8 {
    /// 4KB memory array
    pub(crate) memory: [u8; MEMORY_SIZE],

    /// Program counter: address of the next instruction to execute
    pub(crate) pc: u16,
    /// Index register: used for memory operations
    pub(crate) i: u16,
    /// General-purpose registers V0-VF (VF is used as a flag register)
    pub(crate) v: [u8; 16],
    /// Call stack for subroutine returns
    pub(crate) stack: Vec<u16>,

    /// Delay timer: decrements at 60Hz until it reaches 0
    pub(crate) delay_timer: u8,
    /// Sound timer: decrements at 60Hz, beeps while non-zero
    pub(crate) sound_timer: u8,

    /// Behavioral quirks, fixed for the lifetime of the machine
    pub(crate) quirks: Quirks,

    /// Display buffer, shared with the presenter
    pub(crate) framebuffer: Arc<Framebuffer>,
    /// Keypad state, shared with the input event source
    pub(crate) keypad: Arc<Keypad>,
}

impl Chip8 {
    /// Creates a machine with zeroed memory except for the font table,
    /// which is fixed for the lifetime of the machine.
    pub fn new(quirks: Quirks) -> Self {
        let mut memory = [0; MEMORY_SIZE];
        memory[FONT_START_ADDRESS..FONT_END_ADDRESS].copy_from_slice(&FONT);

        Chip8 {
            memory,
            pc: ROM_START_ADDRESS as u16,
            i: 0,
            v: [0; 16],
            stack: Vec::new(),
            delay_timer: 0,
            sound_timer: 0,
            quirks,
            framebuffer: Arc::new(Framebuffer::new()),
            keypad: Arc::new(Keypad::new()),
        }
    }

    /// Copies a ROM into memory starting at 0x200.
    ///
    /// ROMs larger than the writable program space are rejected and memory
    /// is left untouched.
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        let rom_end = ROM_START_ADDRESS + rom.len();
        self.memory
            .get_mut(ROM_START_ADDRESS..rom_end)
            .ok_or(Chip8Error::RomLoadError {
                size: rom.len(),
                max_size: MEMORY_SIZE - ROM_START_ADDRESS,
            })?
            .copy_from_slice(rom);

        Ok(())
    }

    /// Executes a single CPU cycle (fetch, decode, execute).
    ///
    /// A `Chip8Result::WaitForKey` outcome means the instruction did not
    /// advance: the program counter is rewound so the same instruction is
    /// fetched again on the next cycle.
    pub fn cpu_cycle(&mut self) -> Result<Chip8Result, Chip8Error> {
        let opcode = self.fetch()?;
        let decoded_opcode = Opcode::decode(opcode);

        let result = self.execute(decoded_opcode)?;
        if result == Chip8Result::WaitForKey {
            self.pc = self.pc.wrapping_sub(2);
        }

        Ok(result)
    }

    /// Decrements the delay timer if it is non-zero. Driven at 60Hz.
    pub fn tick_delay_timer(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
    }

    /// Decrements the sound timer if it is non-zero. Driven at 60Hz.
    /// Returns true if the tick produced a beep.
    pub fn tick_sound_timer(&mut self) -> bool {
        let beep = self.sound_timer > 0;
        self.sound_timer = self.sound_timer.saturating_sub(1);
        beep
    }

    /// Shared display buffer handle.
    pub fn framebuffer(&self) -> Arc<Framebuffer> {
        Arc::clone(&self.framebuffer)
    }

    /// Shared keypad handle.
    pub fn keypad(&self) -> Arc<Keypad> {
        Arc::clone(&self.keypad)
    }

    /// Fetches the next 16-bit opcode from memory.
    fn fetch(&mut self) -> Result<u16, Chip8Error> {
        if self.pc as usize >= MEMORY_SIZE {
            return Err(Chip8Error::PcOutOfBounds { pc: self.pc });
        }

        let high = *self.mem_get(self.pc)?;
        let low = *self.mem_get(self.pc.wrapping_add(1))?;

        Ok(u16::from_be_bytes([high, low]))
    }

    /// Helper to get a mutable reference to a memory location with bounds checking.
    pub(crate) fn mem_get(&mut self, addr: u16) -> Result<&mut u8, Chip8Error> {
        self.memory
            .get_mut(addr as usize)
            .ok_or(Chip8Error::MemoryOutOfBounds { address: addr })
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new(Quirks::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_is_loaded_at_construction() {
        let chip8 = Chip8::default();
        assert_eq!(chip8.memory[FONT_START_ADDRESS], 0xF0);
        assert_eq!(chip8.memory[FONT_END_ADDRESS - 1], 0x80);
    }

    #[test]
    fn test_load_rom_copies_to_program_space() {
        let mut chip8 = Chip8::default();
        chip8.load_rom(&[0xAA, 0xBB, 0xCC]).unwrap();

        assert_eq!(chip8.memory[0x200..0x203], [0xAA, 0xBB, 0xCC]);
        assert_eq!(chip8.pc, 0x200);
    }

    #[test]
    fn test_load_rom_accepts_max_size() {
        let mut chip8 = Chip8::default();
        let rom = vec![0x01; MEMORY_SIZE - 0x200];
        chip8.load_rom(&rom).unwrap();

        assert_eq!(chip8.memory[MEMORY_SIZE - 1], 0x01);
    }

    #[test]
    fn test_load_rom_rejects_oversized() {
        let mut chip8 = Chip8::default();
        let rom = vec![0x01; MEMORY_SIZE - 0x200 + 1];

        assert!(matches!(
            chip8.load_rom(&rom),
            Err(Chip8Error::RomLoadError {
                size: 3585,
                max_size: 3584
            })
        ));
        // Memory stays in its initial, font-only state.
        assert_eq!(chip8.memory[0x200], 0);
    }

    #[test]
    fn test_two_step_scenario() {
        // 6005 sets V0 = 5, 7003 adds 3.
        let mut chip8 = Chip8::default();
        chip8.load_rom(&[0x60, 0x05, 0x70, 0x03]).unwrap();

        chip8.cpu_cycle().unwrap();
        chip8.cpu_cycle().unwrap();

        assert_eq!(chip8.v[0], 8);
        assert_eq!(chip8.pc, 0x204);
    }

    #[test]
    fn test_pc_out_of_bounds_is_fatal() {
        let mut chip8 = Chip8::default();
        chip8.pc = MEMORY_SIZE as u16;
        let v_before = chip8.v;

        assert!(matches!(
            chip8.cpu_cycle(),
            Err(Chip8Error::PcOutOfBounds { pc: 4096 })
        ));
        assert_eq!(chip8.v, v_before);
        assert_eq!(chip8.pc, MEMORY_SIZE as u16);
    }

    #[test]
    fn test_delay_timer_floors_at_zero() {
        let mut chip8 = Chip8::default();
        chip8.delay_timer = 5;

        for _ in 0..5 {
            chip8.tick_delay_timer();
        }
        assert_eq!(chip8.delay_timer, 0);

        chip8.tick_delay_timer();
        assert_eq!(chip8.delay_timer, 0);
    }

    #[test]
    fn test_sound_timer_reports_beep() {
        let mut chip8 = Chip8::default();
        chip8.sound_timer = 2;

        assert!(chip8.tick_sound_timer());
        assert!(chip8.tick_sound_timer());
        assert!(!chip8.tick_sound_timer());
        assert_eq!(chip8.sound_timer, 0);
    }
}
