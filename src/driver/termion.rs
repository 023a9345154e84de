use std::{
    fmt::Write as _,
    io::{stdout, Read, Stdout, Write},
    time::Instant,
};

use bitvec::{bitarr, slice::BitSlice, BitArr};

use crate::{
    chip8::{DISPLAY_HEIGHT, DISPLAY_WIDTH, NUM_KEYS},
    driver::{
        AudioDevice, DisplayDevice, EventQueue, InputDevice, KeyEdge, KeyMsg, EVENT_QUEUE_DEPTH,
        KEY_UP, PX_OFF, PX_ON,
    },
    emulator::Signal,
};

const DEBOUNCE_TIMEOUT: u32 = 100; // ms

pub struct Termion {
    // Input byte stream from tty stdin
    stdin: termion::AsyncReader,
    // TUI window - redirects all writes to an alternate screen and restores
    // existing terminal state upon being dropped. Raw mode is required because
    // in canonical mode, inputs are buffered until a newline or EOF is reached.
    // This means that users would have to manually hit return/enter for their
    // inputs to be received by the reader, which is not practical.
    //   - https://en.wikipedia.org/wiki/Terminal_mode
    screen: termion::screen::AlternateScreen<termion::raw::RawTerminal<Stdout>>,
    // Terminal width and height used to detect resizes and center accordingly
    term_size: (u16, u16), // (w, h)
    // Frame buffer used to write to screen. This is embedded within the struct
    // instead of created at each frame refresh because we get to reuse the
    // space allocated (which is roughly constant) with String::clear()
    framebuf: String,
    // Currently-held keys
    keybuf: BitArr!(for NUM_KEYS),
    // Pending key transitions awaiting a drain
    events: EventQueue,
    // Since inputs come as a byte stream, we don't have convenient key up/down
    // states to relay; having a timer to "expire" key presses will serve that
    // purpose and make inputs more predictable
    key_expire: Instant,
}

impl Termion {
    pub fn new() -> Self {
        use termion::raw::IntoRawMode;
        use termion::screen::IntoAlternateScreen;

        let mut t = Termion {
            stdin: termion::async_stdin(),
            screen: stdout()
                .into_raw_mode()
                .unwrap()
                .into_alternate_screen()
                .expect("TUI screen creation failed"),
            term_size: termion::terminal_size().unwrap(),
            framebuf: String::new(),
            keybuf: bitarr![0; NUM_KEYS],
            events: EventQueue::new(),
            key_expire: Instant::now(),
        };

        write!(t.screen, "{}", termion::cursor::Hide).unwrap();
        t.screen.flush().unwrap();

        t
    }

    fn record(&mut self, key: u8, edge: KeyEdge) {
        let down = edge == KeyEdge::Down;
        if self.keybuf[key as usize] == down {
            return;
        }
        self.keybuf.set(key as usize, down);
        if self.events.len() < EVENT_QUEUE_DEPTH {
            self.events.push(KeyMsg::new().with_key(key).with_edge(edge));
        }
    }
}

impl InputDevice for Termion {
    //
    //    Keyboard                   CHIP-8
    //    +---+---+---+---+          +---+---+---+---+
    //    | 1 | 2 | 3 | 4 |          | 1 | 2 | 3 | C |
    //    +---+---+---+---+          +---+---+---+---+
    //    | Q | W | E | R |          | 4 | 5 | 6 | D |
    //    +---+---+---+---+    =>    +---+---+---+---+
    //    | A | S | D | F |          | 7 | 8 | 9 | E |
    //    +---+---+---+---+          +---+---+---+---+
    //    | Z | X | C | V |          | A | 0 | B | F |
    //    +---+---+---+---+          +---+---+---+---+
    //
    fn poll(&mut self) -> Signal {
        // Expire lingering presses; the byte stream has no key-up events,
        // so releases are synthesized on a timer
        if self.key_expire.elapsed().as_millis() >= DEBOUNCE_TIMEOUT as u128 {
            for key in 0..NUM_KEYS as u8 {
                self.record(key, KeyEdge::Up);
            }
            self.keybuf.fill(KEY_UP);
            self.key_expire = Instant::now();
        }

        let mut inputs = Vec::new();
        // Drain all inputs from stdin
        self.stdin.read_to_end(&mut inputs).unwrap();
        inputs.dedup();

        for byte in inputs {
            match byte {
                b'1' => self.record(0x1, KeyEdge::Down),
                b'2' => self.record(0x2, KeyEdge::Down),
                b'3' => self.record(0x3, KeyEdge::Down),
                b'4' => self.record(0xC, KeyEdge::Down),
                b'q' => self.record(0x4, KeyEdge::Down),
                b'w' => self.record(0x5, KeyEdge::Down),
                b'e' => self.record(0x6, KeyEdge::Down),
                b'r' => self.record(0xD, KeyEdge::Down),
                b'a' => self.record(0x7, KeyEdge::Down),
                b's' => self.record(0x8, KeyEdge::Down),
                b'd' => self.record(0x9, KeyEdge::Down),
                b'f' => self.record(0xE, KeyEdge::Down),
                b'z' => self.record(0xA, KeyEdge::Down),
                b'x' => self.record(0x0, KeyEdge::Down),
                b'c' => self.record(0xB, KeyEdge::Down),
                b'v' => self.record(0xF, KeyEdge::Down),
                // Esc (ASCII 0x1B) and ^C (ASCII 0x03) to signal program exit
                0x03 | 0x1B => {
                    write!(self.screen, "{}", termion::cursor::Show).unwrap();
                    return Signal::ProgramExit;
                }
                _ => (),
            }
        }

        if self.events.is_empty() {
            Signal::None
        } else {
            Signal::NewInputs
        }
    }

    fn drain_events(&mut self) -> EventQueue {
        std::mem::take(&mut self.events)
    }
}

impl DisplayDevice for Termion {
    fn receive_frame(&mut self, frame: &BitSlice<usize>) -> &mut dyn DisplayDevice {
        use termion::color;
        // Clear screen before sending next frame if terminal has resized
        if let Ok(term_size) = termion::terminal_size() {
            if self.term_size != term_size {
                self.term_size = term_size;
                write!(self.screen, "{}", termion::clear::All).unwrap();
            }
        }

        let (x_offset, y_offset) = (
            self.term_size.0.saturating_sub(DISPLAY_WIDTH as u16) / 2,
            self.term_size.1.saturating_sub(DISPLAY_HEIGHT as u16) / 2,
        );

        self.framebuf.clear();

        for (idx, pixel) in frame.iter().enumerate() {
            if idx % DISPLAY_WIDTH == 0 {
                write!(
                    self.framebuf,
                    "{}",
                    termion::cursor::Goto(
                        x_offset + 1,
                        y_offset + (1 + idx / DISPLAY_WIDTH) as u16
                    )
                )
                .unwrap();
            }
            // https://en.wikipedia.org/wiki/ANSI_escape_code#8-bit
            match *pixel {
                PX_OFF => {
                    self.framebuf += &format!("{}█", color::Fg(color::Black));
                }
                PX_ON => {
                    self.framebuf += &format!("{}█", color::Fg(color::White));
                }
            }
        }

        self
    }

    fn drive_display(&mut self) {
        write!(self.screen, "{}", self.framebuf).unwrap();
        self.screen.flush().unwrap();
    }
}

impl AudioDevice for Termion {
    fn receive_signal(&mut self, _tone_on: bool) -> &mut dyn AudioDevice {
        // Terminals cannot sustain a tone; the beep happens in play_sound
        self
    }

    fn play_sound(&mut self) {
        write!(self.screen, "\x07").unwrap();
        self.screen.flush().unwrap();
    }
}
