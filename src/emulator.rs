use std::cell::RefCell;
use std::thread;
use std::time::{Duration, Instant};

use crate::chip8::{Chip8, Quirks, TIMER_FREQ};
use crate::driver::{AudioDevice, DisplayDevice, InputDevice};
use crate::error::Chip8Error;

pub const DEFAULT_CLOCK_FREQ: f32 = 700.0;

/// Out-of-band events raised by peripherals while the loop runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    None,
    NewInputs,
    ProgramExit,
}

pub struct Emulator<'i, 'd, 'a> {
    // The system we're emulating -- CHIP-8
    system: Chip8,
    // Instruction rate in Hz; the timers always run at 60 Hz regardless
    clock_hz: f32,

    input_device: &'i RefCell<dyn InputDevice>,
    display: &'d RefCell<dyn DisplayDevice>,
    speaker: &'a RefCell<dyn AudioDevice>,
}

impl<'i, 'd, 'a> Emulator<'i, 'd, 'a> {
    pub fn with_peripherals(
        input: &'i RefCell<dyn InputDevice>,
        display: &'d RefCell<dyn DisplayDevice>,
        audio: &'a RefCell<dyn AudioDevice>,
    ) -> Emulator<'i, 'd, 'a> {
        Emulator {
            system: Chip8::new(),
            clock_hz: DEFAULT_CLOCK_FREQ,
            input_device: input,
            display,
            speaker: audio,
        }
    }

    pub fn set_clock_speed(&mut self, hz: f32) {
        self.clock_hz = hz;
    }

    pub fn set_quirks(&mut self, quirks: Quirks) {
        self.system.set_quirks(quirks);
    }

    pub fn load_program(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        self.system.load_rom(rom)
    }

    /// Drive the machine until the display closes, the user asks to quit,
    /// or a fatal fault occurs. Two deadline clocks pace the loop: the CPU
    /// clock at `clock_hz` and the timer clock at a fixed 60 Hz. Within one
    /// CPU tick the order is: drain input, execute at most one instruction,
    /// tick timers on a 60 Hz boundary, present the frame if it changed.
    pub fn run(&mut self) -> Result<(), Chip8Error> {
        let cpu_period = Duration::from_secs_f32(1.0 / self.clock_hz);
        let timer_period = Duration::from_secs_f32(1.0 / TIMER_FREQ);

        let mut next_instr = Instant::now();
        let mut next_timer = next_instr;
        let mut tone_on = false;
        let mut outcome = Ok(());

        loop {
            let now = Instant::now();

            if now >= next_instr {
                match self.input_device.borrow_mut().poll() {
                    Signal::ProgramExit => break,
                    Signal::NewInputs | Signal::None => (),
                }
                if self.display.borrow().is_closed() {
                    break;
                }
                for msg in self.input_device.borrow_mut().drain_events() {
                    self.system.apply_input(msg);
                }

                if let Err(fault) = self.system.step() {
                    if fault.is_fatal() {
                        log::error!("halting: {}", fault);
                        outcome = Err(fault);
                        break;
                    }
                    log::debug!("{}", fault);
                }

                next_instr += cpu_period;
            }

            if now >= next_timer {
                let beep_ended = self.system.tick_timers();
                let tone = self.system.sound_active();
                if tone != tone_on {
                    tone_on = tone;
                    self.speaker.borrow_mut().receive_signal(tone);
                }
                if beep_ended {
                    self.speaker.borrow_mut().play_sound();
                }

                next_timer += timer_period;
            }

            if self.system.frame_dirty() {
                self.display
                    .borrow_mut()
                    .receive_frame(self.system.frame())
                    .drive_display();
                self.system.mark_presented();
            }

            let next_wake = next_instr.min(next_timer);
            if let Some(pause) = next_wake.checked_duration_since(Instant::now()) {
                thread::sleep(pause);
            }
        }

        // Drain the audio channel so no tone outlives the loop
        self.speaker.borrow_mut().receive_signal(false);
        log::info!("shutting down");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::NullDevice;

    // CHIP-8 should be able to run with no peripherals hooked up to it
    #[test]
    fn headless_machine_loads_and_rejects_roms() {
        let input = RefCell::new(NullDevice::Input);
        let display = RefCell::new(NullDevice::Display);
        let audio = RefCell::new(NullDevice::Audio);

        let mut emu = Emulator::with_peripherals(&input, &display, &audio);
        assert!(emu.load_program(&[0x12, 0x00]).is_ok());
        assert!(emu.load_program(&[0; 4000]).is_err());
    }
}
