use std::sync::atomic::{AtomicBool, Ordering};

/// State of the 16-key hex keypad, shared between the emulation thread and
/// the input event source.
///
/// Each key is an independent level-triggered boolean with a single writer
/// (the event source) and a single reader (the executor), so relaxed atomics
/// are sufficient; a torn observation of a key transition is benign.
pub struct Keypad {
    keys: [AtomicBool; 16],
}

impl Keypad {
    pub(crate) fn new() -> Self {
        Keypad {
            keys: [const { AtomicBool::new(false) }; 16],
        }
    }

    /// Set the state of a key. Key indices outside 0x0-0xF are ignored.
    pub fn set(&self, key: u8, pressed: bool) {
        if let Some(state) = self.keys.get(key as usize) {
            state.store(pressed, Ordering::Relaxed);
        }
    }

    /// Returns true if the key is currently held. The index is masked to
    /// 4 bits, matching how the skip-on-key opcodes interpret VX.
    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys[(key & 0x0F) as usize].load(Ordering::Relaxed)
    }

    /// Scans keys 0x0-0xF in ascending order, returning the first held key.
    pub(crate) fn first_pressed(&self) -> Option<u8> {
        (0..16).find(|&key| self.is_pressed(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_read() {
        let keypad = Keypad::new();
        assert!(!keypad.is_pressed(0x5));

        keypad.set(0x5, true);
        assert!(keypad.is_pressed(0x5));

        keypad.set(0x5, false);
        assert!(!keypad.is_pressed(0x5));
    }

    #[test]
    fn test_out_of_range_key_is_ignored() {
        let keypad = Keypad::new();
        keypad.set(16, true);
        keypad.set(0xFF, true);

        assert_eq!(keypad.first_pressed(), None);
    }

    #[test]
    fn test_first_pressed_scans_ascending() {
        let keypad = Keypad::new();
        keypad.set(0x9, true);
        keypad.set(0x5, true);

        assert_eq!(keypad.first_pressed(), Some(0x5));
    }
}
