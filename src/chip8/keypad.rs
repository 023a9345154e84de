use bitvec::{bitarr, BitArr};

pub const NUM_KEYS: usize = 16;

//  Input device state: 16-key keypad (0x0-0xF)
//    +------------+
//    | 1  2  3  C |
//    | 4  5  6  D |
//    | 7  8  9  E |
//    | A  0  B  F |
//    +------------+
//  Stored as a 16-bit array with the (n as hex)th bit
//  corresponding to the key state; up = 0, down = 1
pub struct Keypad {
    keys: BitArr!(for NUM_KEYS),
}

impl Keypad {
    pub fn new() -> Self {
        Keypad {
            keys: bitarr![0; NUM_KEYS],
        }
    }

    pub fn press(&mut self, key: u8) {
        self.keys.set((key & 0xF) as usize, true);
    }

    pub fn release(&mut self, key: u8) {
        self.keys.set((key & 0xF) as usize, false);
    }

    pub fn is_down(&self, key: u8) -> bool {
        self.keys[(key & 0xF) as usize]
    }

    /// Some currently-held key, if any. The ring is scanned from a random
    /// origin; this avoids having a key always taking precedence over
    /// another when both are simultaneously pressed.
    pub fn any_down(&self) -> Option<u8> {
        let start = fastrand::usize(0..NUM_KEYS);
        (0..NUM_KEYS)
            .map(|n| (start + n) % NUM_KEYS)
            .find(|&k| self.keys[k])
            .map(|k| k as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_release_roundtrip() {
        let mut pad = Keypad::new();
        assert!(!pad.is_down(0x5));

        pad.press(0x5);
        assert!(pad.is_down(0x5));
        assert_eq!(pad.any_down(), Some(0x5));

        pad.release(0x5);
        assert!(!pad.is_down(0x5));
        assert_eq!(pad.any_down(), None);
    }

    #[test]
    fn any_down_finds_a_held_key_wherever_the_scan_starts() {
        let mut pad = Keypad::new();
        pad.press(0x0);
        for _ in 0..64 {
            assert_eq!(pad.any_down(), Some(0x0));
        }
    }

    #[test]
    fn upper_nibble_of_the_key_index_is_ignored() {
        let mut pad = Keypad::new();
        pad.press(0xF5);
        assert!(pad.is_down(0x5));
    }
}
