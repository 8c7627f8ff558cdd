use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::{Chip8, Chip8Error, Chip8Handle, handle::Signals};

/// Timer tick rate mandated by the CHIP-8 specification.
pub const TIMER_HZ: u32 = 60;

const TIMER_PERIOD_MICROS: u64 = 1_000_000 / TIMER_HZ as u64;
const TIMER_PERIOD: Duration = Duration::from_micros(TIMER_PERIOD_MICROS);
/// Bounded sleep slice, half the timer period. Sleeping any longer could
/// overshoot the next tick boundary.
const SLEEP_SLICE: Duration = Duration::from_micros(TIMER_PERIOD_MICROS / 2);

/// Wall-clock scheduler that paces a `Chip8` machine.
///
/// Timers advance at a fixed 60Hz while CPU instructions execute in batches
/// sized to the configured clock rate, so emulation speed is independent of
/// host machine speed.
pub struct Chip8Runner {
    chip8: Chip8,
    /// Number of CPU cycles that fit in one timer period at the configured
    /// clock rate.
    cycles_per_tick: u32,
    signals: Arc<Signals>,
}

impl Chip8Runner {
    pub fn new(chip8: Chip8, cpu_hz: u32) -> Self {
        // Per-instruction time budget in microseconds.
        let instruction_micros = 1_000_000 / u64::from(cpu_hz.max(1));
        let cycles_per_tick = (TIMER_PERIOD_MICROS / instruction_micros) as u32;

        Self {
            chip8,
            cycles_per_tick,
            signals: Arc::new(Signals::new()),
        }
    }

    /// Returns a cloneable handle for the display, keypad, sound and
    /// lifecycle surfaces of this runner's machine.
    pub fn handle(&self) -> Chip8Handle {
        Chip8Handle::new(
            self.chip8.framebuffer(),
            self.chip8.keypad(),
            Arc::clone(&self.signals),
        )
    }

    /// Runs the machine until shutdown is requested or a fatal fault occurs.
    ///
    /// Each iteration checks whether a full timer period elapsed; if so it
    /// executes one batch of CPU cycles and ticks both timers. Between ticks
    /// the loop sleeps in bounded slices, shrinking its sleep estimate to
    /// half the remaining slack and busy-polling once the estimate collapses
    /// below a slice, so the 60Hz cadence holds at any configured CPU rate.
    pub fn run(&mut self) -> Result<(), Chip8Error> {
        let mut last_tick = Instant::now();
        let mut recommended_sleep = TIMER_PERIOD;

        while self.signals.is_running() {
            let now = Instant::now();
            let elapsed = now.duration_since(last_tick);

            if elapsed >= TIMER_PERIOD {
                if let Err(fault) = self.tick() {
                    self.signals.halt();
                    return Err(fault);
                }
                last_tick = now;
            } else {
                recommended_sleep = recommended_sleep.min((TIMER_PERIOD - elapsed) / 2);
            }

            if recommended_sleep > SLEEP_SLICE {
                thread::sleep(SLEEP_SLICE);
            }
            recommended_sleep = TIMER_PERIOD;
        }

        Ok(())
    }

    /// One 60Hz tick: a batch of CPU cycles followed by both timers.
    pub(crate) fn tick(&mut self) -> Result<(), Chip8Error> {
        for _ in 0..self.cycles_per_tick {
            self.chip8.cpu_cycle()?;
        }

        self.chip8.tick_delay_timer();
        let beeped = self.chip8.tick_sound_timer();
        self.signals.set_beeping(beeped);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size_matches_clock_rate() {
        let runner = Chip8Runner::new(Chip8::default(), 700);
        assert_eq!(runner.cycles_per_tick, 11);

        let runner = Chip8Runner::new(Chip8::default(), 350);
        assert_eq!(runner.cycles_per_tick, 5);

        let runner = Chip8Runner::new(Chip8::default(), 60);
        assert_eq!(runner.cycles_per_tick, 1);
    }

    #[test]
    fn test_tick_runs_batch_then_timers() {
        let mut chip8 = Chip8::default();
        // A ROM of enough 6001 (V0 = 1) instructions for one full batch.
        let rom: Vec<u8> = [0x60, 0x01].repeat(16);
        chip8.load_rom(&rom).unwrap();
        chip8.delay_timer = 3;

        let mut runner = Chip8Runner::new(chip8, 700);
        runner.tick().unwrap();

        assert_eq!(runner.chip8.pc, 0x200 + 11 * 2);
        assert_eq!(runner.chip8.delay_timer, 2);
    }

    #[test]
    fn test_tick_publishes_beep_signal() {
        let mut chip8 = Chip8::default();
        // FX0A keeps the CPU busy without touching the timers.
        chip8.load_rom(&[0xF0, 0x0A]).unwrap();
        chip8.sound_timer = 2;

        let mut runner = Chip8Runner::new(chip8, 60);
        let handle = runner.handle();

        runner.tick().unwrap();
        assert!(handle.should_beep());

        runner.tick().unwrap();
        assert!(handle.should_beep());

        runner.tick().unwrap();
        assert!(!handle.should_beep());
    }

    #[test]
    fn test_shutdown_request_stops_run() {
        let mut runner = Chip8Runner::new(Chip8::default(), 700);
        let handle = runner.handle();

        handle.shutdown();
        assert!(runner.run().is_ok());
        assert!(!handle.is_running());
    }

    #[test]
    fn test_fatal_fault_halts_run() {
        let mut chip8 = Chip8::default();
        // Return with an empty call stack faults on the first batch.
        chip8.load_rom(&[0x00, 0xEE]).unwrap();

        let mut runner = Chip8Runner::new(chip8, 700);
        let handle = runner.handle();

        assert!(matches!(runner.run(), Err(Chip8Error::StackUnderflow)));
        assert!(!handle.is_running());
    }
}
