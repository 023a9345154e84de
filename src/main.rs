mod chip8;
mod driver;
mod emulator;
mod error;

use std::cell::RefCell;
use std::path::Path;
use std::{fs, process};

use chip8::{Quirks, ShiftQuirk, SpriteQuirk};
use driver::{minifb::Minifb, rodio::Rodio, termion::Termion};
use emulator::Emulator;

// Command line arguments
struct Args {
    rom: String,
    gui: bool,
    native_audio: bool,
    debug: bool,
    clockspeed: u32,
    quirks: Quirks,
}

fn parse_args() -> Result<Args, lexopt::Error> {
    use lexopt::prelude::*;

    let help_msg = "\
USAGE:
    crisp8 [OPTIONS] [ROM]

ARGS:
    <ROM>    Filepath to the CHIP-8 ROM to be read by the interpreter. A list
             of ROMs released to the public domain can be found at:
                 - https://zophar.net/pdroms/chip8/chip-8-games-pack.html
                 - https://johnearnest.github.io/chip8Archive/?sort=platform

OPTIONS:
    -h, --help            Print this help message.
    -g, --gui             GUI mode — run this program in a native window.
    -t, --tui             TUI mode — run this program in the terminal. (default)
    -a                    Use the native audio host API. You may want to enable
                            this if your terminal emulator does not support the
                            BEL control code. Always on with --gui.
    -c, --clockspeed=NUM  Set the instruction rate (Hz) to uint NUM in the
                            range 1–2000. The 60 Hz timers are unaffected.
                            (default: 700)
    -d, --debug           Log at debug level; reports every unrecognized
                            instruction word with its address.
        --shift=MODE      8XY6/8XYE compatibility: 'original' reads Vy,
                            'modern' shifts Vx in place. (default: original)
        --sprite=MODE     Sprite pixels past the screen edge: 'clip' discards
                            them, 'wrap' folds them around. (default: clip)
        --inc-i           FX55/FX65 leave I pointing past the copied block.

KEYMAP:
    +---+---+---+---+
    | 1 | 2 | 3 | 4 |
    +---+---+---+---+
    | Q | W | E | R |
    +---+---+---+---+
    | A | S | D | F |
    +---+---+---+---+
    | Z | X | C | V |
    +---+---+---+---+    ";

    let mut rom = None;
    let mut gui = false;
    let mut native_audio = false;
    let mut debug = false;
    let mut clockspeed = emulator::DEFAULT_CLOCK_FREQ as u32;
    let mut quirks = Quirks::default();

    let mut parser = lexopt::Parser::from_env();

    while let Some(arg) = parser.next()? {
        match arg {
            Short('g') | Long("gui") => {
                gui = true;
                native_audio = true;
            }
            Short('t') | Long("tui") => {
                gui = false;
            }
            Short('a') => {
                native_audio = true;
            }
            Short('c') | Long("clockspeed") => {
                clockspeed = parser.value()?.parse()?;
                if !(1..=2000).contains(&clockspeed) {
                    return Err("out of bounds value for option '--clockspeed'".into());
                }
            }
            Short('d') | Long("debug") => {
                debug = true;
            }
            Long("shift") => {
                quirks.shift = match parser.value()?.string()?.as_str() {
                    "original" => ShiftQuirk::Original,
                    "modern" => ShiftQuirk::Modern,
                    _ => return Err("unrecognized value for option '--shift'".into()),
                };
            }
            Long("sprite") => {
                quirks.sprite = match parser.value()?.string()?.as_str() {
                    "clip" => SpriteQuirk::Clip,
                    "wrap" => SpriteQuirk::Wrap,
                    _ => return Err("unrecognized value for option '--sprite'".into()),
                };
            }
            Long("inc-i") => {
                quirks.load_store_increments_i = true;
            }
            Value(path) if rom.is_none() => {
                rom = Some(path.string()?);
            }

            Short('h') | Long("help") => {
                println!("{}", help_msg);
                process::exit(0);
            }
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(Args {
        rom: rom.ok_or(
            "missing argument <ROM>\n
  Refer to --help for more information",
        )?,
        gui,
        native_audio,
        debug,
        clockspeed,
        quirks,
    })
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(1);
        }
    };

    env_logger::Builder::new()
        .filter_level(if args.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let rom = match fs::read(&args.rom) {
        Ok(rom) => rom,
        Err(err) => {
            eprintln!("error: cannot read '{}': {}", args.rom, err);
            process::exit(1);
        }
    };

    let program_name = Path::new(&args.rom)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("CHIP-8");

    let code = if args.gui {
        let gui = RefCell::new(Minifb::new(program_name));
        let speaker = RefCell::new(Rodio::new());
        let mut emu = Emulator::with_peripherals(&gui, &gui, &speaker);
        boot(&mut emu, &args, &rom)
    } else if args.native_audio {
        let tui = RefCell::new(Termion::new());
        let speaker = RefCell::new(Rodio::new());
        let mut emu = Emulator::with_peripherals(&tui, &tui, &speaker);
        boot(&mut emu, &args, &rom)
    } else {
        let tui = RefCell::new(Termion::new());
        let mut emu = Emulator::with_peripherals(&tui, &tui, &tui);
        boot(&mut emu, &args, &rom)
    };

    process::exit(code);
}

fn boot(emu: &mut Emulator, args: &Args, rom: &[u8]) -> i32 {
    emu.set_clock_speed(args.clockspeed as f32);
    emu.set_quirks(args.quirks);

    if let Err(err) = emu.load_program(rom) {
        eprintln!("error: {}", err);
        return 1;
    }

    match emu.run() {
        Ok(()) => 0,
        Err(_fault) => 1, // already logged by the run loop
    }
}
