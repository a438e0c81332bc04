//! Trial-table validation without running a session.

use std::path::PathBuf;

use pacelab_core::TrialMode;

use crate::table::{self, Mode};

pub fn run(config: PathBuf, mode: Mode) -> Result<(), Box<dyn std::error::Error>> {
    let trials = table::read_trials(&config, mode)?;
    println!("{}: {} trials ok", config.display(), trials.len());
    for trial in &trials {
        match trial.mode {
            TrialMode::CountUp {
                change_interval_secs,
                deadline_secs,
            } => println!(
                "  trial {}: base_pace {}, change every {} s, increment {}, deadline {} s",
                trial.trial_num,
                trial.base_pace,
                change_interval_secs,
                trial.increment,
                deadline_secs,
            ),
            TrialMode::CountDown { countdown_secs } => println!(
                "  trial {}: base_pace {}, countdown {} s, increment {} per cycle",
                trial.trial_num, trial.base_pace, countdown_secs, trial.increment,
            ),
        }
    }
    Ok(())
}
