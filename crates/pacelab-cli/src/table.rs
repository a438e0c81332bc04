//! Trial-table input and result-table output.
//!
//! Thin I/O collaborators around the engine: the input is a CSV with one row
//! per trial (columns depend on the mode), the output is the same table with
//! the recorded mark columns appended. Cells for trials that were never
//! marked are written as `NAN`.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use pacelab_core::{ConfigError, EngineError, TrialConfig, TrialMode, TrialReport};

/// Which instrument the session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Count-up clock with scheduled pace changes and an auto-reset deadline.
    Stopwatch,
    /// Count-down clock whose pace changes once per completed cycle.
    Timer,
}

const COUNT_UP_COLUMNS: [&str; 5] = [
    "trial_num",
    "base_pace",
    "frequency_of_change",
    "add_increment",
    "stop_time",
];

const COUNT_DOWN_COLUMNS: [&str; 4] = ["trial_num", "base_pace", "countdown_time", "add_increment"];

/// Read and validate a trial table.
pub fn read_trials(path: &Path, mode: Mode) -> Result<Vec<TrialConfig>, EngineError> {
    let text = fs::read_to_string(path)?;
    parse_trials(&text, &path.display().to_string(), mode).map_err(Into::into)
}

fn parse_trials(text: &str, path: &str, mode: Mode) -> Result<Vec<TrialConfig>, ConfigError> {
    let mut lines = text.lines().enumerate();
    let (_, header) = lines.next().ok_or(ConfigError::EmptyTrialTable)?;
    let headers: Vec<&str> = header.split(',').map(str::trim).collect();

    let columns: &[&str] = match mode {
        Mode::Stopwatch => &COUNT_UP_COLUMNS,
        Mode::Timer => &COUNT_DOWN_COLUMNS,
    };
    let mut pos = [0usize; 5];
    for (i, &column) in columns.iter().enumerate() {
        pos[i] = headers
            .iter()
            .position(|h| *h == column)
            .ok_or_else(|| ConfigError::MissingColumn {
                path: path.to_string(),
                column,
            })?;
    }

    let mut trials = Vec::new();
    for (idx, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        let cell = |p: usize| -> Result<f64, ConfigError> {
            cells
                .get(p)
                .and_then(|c| c.parse::<f64>().ok())
                .ok_or_else(|| ConfigError::ParseFailed {
                    path: path.to_string(),
                    line: line_no,
                    message: format!("expected a number in column '{}'", headers[p]),
                })
        };
        let trial_num = cell(pos[0])? as u32;
        let base_pace = cell(pos[1])?;
        let config = match mode {
            Mode::Stopwatch => TrialConfig {
                trial_num,
                base_pace,
                increment: cell(pos[3])?,
                mode: TrialMode::CountUp {
                    change_interval_secs: cell(pos[2])?,
                    deadline_secs: cell(pos[4])?,
                },
            },
            Mode::Timer => TrialConfig {
                trial_num,
                base_pace,
                increment: cell(pos[3])?,
                mode: TrialMode::CountDown {
                    countdown_secs: cell(pos[2])? as u32,
                },
            },
        };
        config.validate()?;
        trials.push(config);
    }
    if trials.is_empty() {
        return Err(ConfigError::EmptyTrialTable);
    }
    Ok(trials)
}

/// Write the session's result table to `OUTPUT_<HH-MM-SS>.csv` under `dir`
/// and return the path.
pub fn write_report(dir: &Path, mode: Mode, reports: &[TrialReport]) -> Result<PathBuf, EngineError> {
    let stamp = chrono::Local::now().format("%H-%M-%S");
    let path = dir.join(format!("OUTPUT_{stamp}.csv"));
    fs::write(&path, render_report(mode, reports))?;
    Ok(path)
}

fn render_report(mode: Mode, reports: &[TrialReport]) -> String {
    let mut out = String::new();
    match mode {
        Mode::Stopwatch => {
            out.push_str(
                "trial_num,base_pace,frequency_of_change,add_increment,stop_time,\
                 time_elapsed_at_keypress,pace_at_keypress\n",
            );
            for r in reports {
                let (interval, deadline) = match r.config.mode {
                    TrialMode::CountUp {
                        change_interval_secs,
                        deadline_secs,
                    } => (change_interval_secs, deadline_secs),
                    TrialMode::CountDown { .. } => continue,
                };
                let elapsed = r
                    .mark
                    .and_then(|m| m.simulated_secs)
                    .map_or("NAN".to_string(), |v| format!("{v:.3}"));
                let pace = r
                    .mark
                    .map_or("NAN".to_string(), |m| m.pace.to_string());
                out.push_str(&format!(
                    "{},{},{},{},{},{},{}\n",
                    r.config.trial_num,
                    r.config.base_pace,
                    interval,
                    r.config.increment,
                    deadline,
                    elapsed,
                    pace,
                ));
            }
        }
        Mode::Timer => {
            out.push_str(
                "trial_num,base_pace,countdown_time,add_increment,\
                 pace_at_keypress,timer_count,time_elapsed\n",
            );
            for r in reports {
                let countdown = match r.config.mode {
                    TrialMode::CountDown { countdown_secs } => countdown_secs,
                    TrialMode::CountUp { .. } => continue,
                };
                let pace = r
                    .mark
                    .map_or("NAN".to_string(), |m| m.pace.to_string());
                let count = r
                    .mark
                    .and_then(|m| m.cycles_completed)
                    .map_or("NAN".to_string(), |v| v.to_string());
                let elapsed = r
                    .mark
                    .and_then(|m| m.elapsed_secs)
                    .map_or("NAN".to_string(), |v| v.to_string());
                out.push_str(&format!(
                    "{},{},{},{},{},{},{}\n",
                    r.config.trial_num,
                    r.config.base_pace,
                    countdown,
                    r.config.increment,
                    pace,
                    count,
                    elapsed,
                ));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pacelab_core::MarkRecord;

    #[test]
    fn parses_stopwatch_table() {
        let csv = indoc! {"
            trial_num,base_pace,frequency_of_change,add_increment,stop_time
            1,1.0,5,0.1,20
            2,2.0,3,-0.5,30
        "};
        let trials = parse_trials(csv, "config.csv", Mode::Stopwatch).unwrap();
        assert_eq!(trials.len(), 2);
        assert_eq!(trials[0].trial_num, 1);
        assert!((trials[1].base_pace - 2.0).abs() < 1e-12);
        assert!(matches!(
            trials[0].mode,
            TrialMode::CountUp {
                change_interval_secs,
                deadline_secs,
            } if change_interval_secs == 5.0 && deadline_secs == 20.0
        ));
    }

    #[test]
    fn parses_timer_table() {
        let csv = indoc! {"
            trial_num,base_pace,countdown_time,add_increment
            1,1.0,5,0.1
        "};
        let trials = parse_trials(csv, "config.csv", Mode::Timer).unwrap();
        assert!(matches!(
            trials[0].mode,
            TrialMode::CountDown { countdown_secs: 5 }
        ));
    }

    #[test]
    fn column_order_does_not_matter() {
        let csv = indoc! {"
            add_increment,trial_num,countdown_time,base_pace
            0.1,1,5,1.0
        "};
        let trials = parse_trials(csv, "config.csv", Mode::Timer).unwrap();
        assert!((trials[0].increment - 0.1).abs() < 1e-12);
        assert!((trials[0].base_pace - 1.0).abs() < 1e-12);
    }

    #[test]
    fn missing_column_is_an_error() {
        let csv = "trial_num,base_pace,add_increment\n1,1.0,0.1\n";
        let err = parse_trials(csv, "config.csv", Mode::Timer).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingColumn {
                column: "countdown_time",
                ..
            }
        ));
    }

    #[test]
    fn bad_cell_reports_line() {
        let csv = indoc! {"
            trial_num,base_pace,countdown_time,add_increment
            1,1.0,5,0.1
            2,fast,5,0.1
        "};
        let err = parse_trials(csv, "config.csv", Mode::Timer).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed { line: 3, .. }));
    }

    #[test]
    fn invalid_row_rejected_by_validation() {
        let csv = indoc! {"
            trial_num,base_pace,countdown_time,add_increment
            1,0,5,0.1
        "};
        let err = parse_trials(csv, "config.csv", Mode::Timer).unwrap_err();
        assert!(matches!(err, ConfigError::NonPositiveBasePace { .. }));
    }

    #[test]
    fn empty_table_is_an_error() {
        let csv = "trial_num,base_pace,countdown_time,add_increment\n";
        let err = parse_trials(csv, "config.csv", Mode::Timer).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyTrialTable));
    }

    #[test]
    fn report_round_trip_with_unmarked_sentinels() {
        let trials = parse_trials(
            indoc! {"
                trial_num,base_pace,frequency_of_change,add_increment,stop_time
                1,1,5,0.1,20
                2,1,5,0.1,20
            "},
            "config.csv",
            Mode::Stopwatch,
        )
        .unwrap();
        let reports = vec![
            TrialReport {
                config: trials[0],
                mark: Some(MarkRecord {
                    simulated_secs: Some(7.2),
                    pace: 1.1,
                    cycles_completed: None,
                    elapsed_secs: None,
                }),
            },
            TrialReport {
                config: trials[1],
                mark: None,
            },
        ];

        let dir = tempfile::tempdir().unwrap();
        let path = write_report(dir.path(), Mode::Stopwatch, &reports).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next().unwrap(),
            "trial_num,base_pace,frequency_of_change,add_increment,stop_time,\
             time_elapsed_at_keypress,pace_at_keypress"
        );
        assert_eq!(lines.next().unwrap(), "1,1,5,0.1,20,7.200,1.1");
        assert_eq!(lines.next().unwrap(), "2,1,5,0.1,20,NAN,NAN");
    }

    #[test]
    fn timer_report_includes_cycle_columns() {
        let config = parse_trials(
            "trial_num,base_pace,countdown_time,add_increment\n1,1,5,0.1\n",
            "config.csv",
            Mode::Timer,
        )
        .unwrap()[0];
        let reports = vec![TrialReport {
            config,
            mark: Some(MarkRecord {
                simulated_secs: None,
                pace: 1.1,
                cycles_completed: Some(2.0),
                elapsed_secs: Some(5.0 / 1.1),
            }),
        }];
        let rendered = render_report(Mode::Timer, &reports);
        let row = rendered.lines().nth(1).unwrap();
        assert!(row.starts_with("1,1,5,0.1,1.1,2,"));
    }
}
