//! Interactive session host.
//!
//! A deliberately thin consumer of the engine: it reads one command per
//! line, ticks the sequencer at the current wall time before applying the
//! command, and prints what happened. All timing logic lives in the engine.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use tracing::debug;

use pacelab_core::{now_ms, Event, TrialSequencer};

use crate::settings::Settings;
use crate::table::{self, Mode};

pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub mode: Option<Mode>,
    pub output_dir: Option<PathBuf>,
    pub json: bool,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    let config = args.config.unwrap_or(settings.trial_table);
    let mode = args
        .mode
        .or(settings.default_mode)
        .ok_or("no mode configured: pass --mode stopwatch|timer")?;
    let output_dir = args.output_dir.unwrap_or(settings.output_dir);

    let trials = table::read_trials(&config, mode)?;
    debug!(trials = trials.len(), config = %config.display(), "trial table loaded");
    let mut seq = TrialSequencer::new(trials)?;

    println!("pacelab session: {} trials from {}", seq.trial_count(), config.display());
    println!("commands: start, mark, next, prev, reset, trial <n>, status, done, quit");
    print_status(&seq, now_ms());

    let stdin = io::stdin();
    let mut out = io::stdout();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let now = now_ms();
        for event in seq.tick(now) {
            print_event(&event, args.json)?;
        }

        let mut words = line.split_whitespace();
        match words.next().unwrap_or("") {
            "" | "status" => print_status(&seq, now),
            "start" => match seq.start(now) {
                Ok(event) => print_event(&event, args.json)?,
                Err(e) => eprintln!("error: {e}"),
            },
            "mark" | "change" => match seq.mark(now) {
                Ok(event) => print_event(&event, args.json)?,
                Err(e) => eprintln!("error: {e}"),
            },
            "next" => {
                let event = seq.next(now);
                print_event(&event, args.json)?;
                print_status(&seq, now);
            }
            "prev" | "previous" => {
                let event = seq.previous(now);
                print_event(&event, args.json)?;
                print_status(&seq, now);
            }
            "reset" => {
                let event = seq.reset(now);
                print_event(&event, args.json)?;
            }
            "trial" => match words.next().and_then(|w| w.parse::<usize>().ok()) {
                Some(n) if n >= 1 => match seq.select_exact(n - 1, now) {
                    Ok(event) => {
                        print_event(&event, args.json)?;
                        print_status(&seq, now);
                    }
                    Err(e) => eprintln!("error: {e}"),
                },
                _ => eprintln!("usage: trial <n>  (1-indexed)"),
            },
            "done" => {
                let path = table::write_report(&output_dir, mode, &seq.export())?;
                println!("results written to {}", path.display());
                break;
            }
            "quit" | "exit" => break,
            other => eprintln!("unknown command '{other}' (try: start, mark, next, prev, reset, status, done)"),
        }
    }
    Ok(())
}

fn print_status(seq: &TrialSequencer, now_ms: u64) {
    println!(
        "{}  {}  pace {:.3}  [{}]",
        seq.trial_label(),
        seq.render(now_ms),
        seq.current_rate(),
        if seq.running() { "running" } else { "stopped" },
    );
}

fn print_event(event: &Event, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    match event {
        Event::TrialSelected { trial_num, .. } => println!("selected trial {trial_num}"),
        Event::ClockStarted { rate, .. } => println!("started at pace {rate:.3}"),
        Event::PaceChanged { rate, .. } => println!("pace changed to {rate:.3}"),
        Event::DeadlineReset { .. } => println!("deadline reached, clock reset"),
        Event::CountdownTick { remaining_secs, .. } => {
            println!("countdown: {remaining_secs} s remaining")
        }
        Event::CycleCompleted { rate, .. } => {
            println!("countdown cycle complete, next cycle at pace {rate:.3}")
        }
        Event::Marked { record, .. } => match record.simulated_secs {
            Some(simulated) => println!(
                "marked: {simulated:.3} s simulated at pace {:.3}",
                record.pace
            ),
            None => println!("marked at pace {:.3}", record.pace),
        },
        Event::TrialReset { trial_num, .. } => println!("trial {trial_num} reset"),
    }
    Ok(())
}
