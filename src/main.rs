use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use chip8vm::display::{Display, MonoTermDisplay};
use chip8vm::input::{Command, RawTerminal, TermInput};
use chip8vm::{EmulatorConfig, Scheduler, Speed, State, TimerMode};

/// roughly 60 frames a second
const FRAME: Duration = Duration::from_micros(16_667);

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Timers {
    /// once per instruction
    PerTick,
    /// 60Hz whatever the speed
    #[value(name = "60hz")]
    Hz60,
}

impl From<Timers> for TimerMode {
    fn from(t: Timers) -> Self {
        match t {
            Timers::PerTick => TimerMode::PerTick,
            Timers::Hz60 => TimerMode::Fixed60Hz,
        }
    }
}

/// Run a CHIP-8 program in the terminal.
///
/// Keys 1234/qwer/asdf/zxcv are the hex keypad; p pauses, F5/F6/F7 set the
/// speed to slow/normal/fast and Esc quits.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// ROM to load at 0x200
    rom: PathBuf,

    /// milliseconds between instructions
    #[arg(long, default_value_t = 5)]
    speed_ms: u64,

    /// how the delay and sound timers are clocked
    #[arg(long, value_enum, default_value_t = Timers::PerTick)]
    timers: Timers,

    /// seed for the random number instruction
    #[arg(long)]
    seed: Option<u64>,
}

fn title(machine: &Scheduler) -> String {
    match machine.state() {
        State::Paused => "CHIP-8 [paused]".to_string(),
        _ => format!("CHIP-8 [{:?}/tick]", machine.speed()),
    }
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    let rom = std::fs::read(&args.rom)
        .with_context(|| format!("can't read ROM {}", args.rom.display()))?;

    let mut config = EmulatorConfig::default()
        .with_speed(Duration::from_millis(args.speed_ms))
        .with_timer_mode(args.timers.into());
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    // initialise
    let mut machine = Scheduler::new(&config);
    machine
        .load(&rom)
        .with_context(|| format!("can't load ROM {}", args.rom.display()))?;

    let _raw = RawTerminal::enable()?;
    let mut display = MonoTermDisplay::new()?;
    let mut input = TermInput::new();
    let framebuffer = machine.framebuffer();
    let keypad = machine.keypad();
    display.set_title(title(&machine));
    display.render()?;

    loop {
        let mut retitle = false;
        for cmd in input.poll(&keypad)? {
            match cmd {
                Command::Quit => return Ok(()),
                Command::TogglePause => {
                    match machine.state() {
                        State::Paused => machine.resume()?,
                        _ => machine.pause()?,
                    }
                    retitle = true;
                }
                Command::Speed(speed) => {
                    apply_speed(&mut machine, speed)?;
                    retitle = true;
                }
            }
        }

        if retitle {
            display.set_title(title(&machine));
            display.update(&mut chip8vm::framebuffer::lock(&framebuffer));
            display.render()?;
        } else {
            display.present(&framebuffer)?;
        }
        spin_sleep::sleep(FRAME);
    }
}

/// new speed takes effect by restarting the ticker, unless we're paused
fn apply_speed(machine: &mut Scheduler, speed: Speed) -> chip8vm::Result<()> {
    machine.set_speed(speed.interval());
    if machine.state() == State::Running {
        machine.pause()?;
        machine.resume()?;
    }
    Ok(())
}
