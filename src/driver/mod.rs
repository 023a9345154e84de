pub mod minifb;
pub mod rodio;
pub mod termion;

use bitvec::slice::BitSlice;
use modular_bitfield::{
    bitfield,
    specifiers::{B3, B4},
    BitfieldSpecifier,
};
use smallvec::SmallVec;

use crate::emulator::Signal;

pub const KEY_UP: bool = false;
pub const KEY_DOWN: bool = true;

pub const PX_OFF: bool = false;
pub const PX_ON: bool = true;

//    CHIP-8 key transition message format:
//
//   <-- msb                                                     lsb -->
//    +-----------------------+-------+-------------------------------+
//    |        unused         | edge  |            keycode            |
//    |       bits 5-7        | bit 4 |           bits 0-3            |
//    +-----------------------+-------+-------------------------------+
#[bitfield]
#[repr(u8)]
#[derive(Clone, Copy)]
pub struct KeyMsg {
    pub key: B4,
    #[bits = 1]
    pub edge: KeyEdge,
    #[skip]
    __: B3,
}

#[derive(BitfieldSpecifier, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    Up,
    Down,
}

// Key transitions accumulate here between scheduler ticks; anything past
// the bound is dropped rather than grown onto the heap
pub const EVENT_QUEUE_DEPTH: usize = 16;
pub type EventQueue = SmallVec<[KeyMsg; EVENT_QUEUE_DEPTH]>;

// Model input device (e.g. keypad, keyboard, touchscreen, etc.) interfacing with our CHIP-8 system
pub trait InputDevice {
    /// Pump host events, recording key transitions. Reports exit requests
    /// (window close, Esc, ^C) through the returned signal.
    fn poll(&mut self) -> Signal;

    /// Hand over the key transitions observed since the last call.
    fn drain_events(&mut self) -> EventQueue;
}

// Model display device (e.g. UI library window, physical screen, etc.) interfacing with our CHIP-8 system
pub trait DisplayDevice {
    fn receive_frame(&mut self, frame: &BitSlice<usize>) -> &mut dyn DisplayDevice;

    fn drive_display(&mut self);

    fn is_closed(&self) -> bool {
        false
    }
}

// Model audio device (e.g. audio drivers, beeper, etc.) interfacing with our CHIP-8 system
pub trait AudioDevice {
    /// Tone gate: on while the sound timer is non-zero.
    fn receive_signal(&mut self, tone_on: bool) -> &mut dyn AudioDevice;

    /// One-shot beep, fired when the sound timer runs out.
    fn play_sound(&mut self);
}

// Model empty device -- puts `/dev/null` into perspective
#[derive(Clone, Copy)]
pub enum NullDevice {
    Input,
    Display,
    Audio,
}

impl InputDevice for NullDevice {
    fn poll(&mut self) -> Signal {
        Signal::None
    }
    fn drain_events(&mut self) -> EventQueue {
        EventQueue::new()
    }
}

impl DisplayDevice for NullDevice {
    fn receive_frame(&mut self, _frame: &BitSlice<usize>) -> &mut dyn DisplayDevice {
        self
    }
    fn drive_display(&mut self) {}
}

impl AudioDevice for NullDevice {
    fn receive_signal(&mut self, _tone_on: bool) -> &mut dyn AudioDevice {
        self
    }
    fn play_sound(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_msg_packs_key_and_edge() {
        let msg = KeyMsg::new().with_key(0xC).with_edge(KeyEdge::Down);
        assert_eq!(msg.key(), 0xC);
        assert_eq!(msg.edge(), KeyEdge::Down);
        assert_eq!(u8::from(msg), 0x1C);

        let msg = KeyMsg::new().with_key(0xC).with_edge(KeyEdge::Up);
        assert_eq!(u8::from(msg), 0x0C);
    }
}
