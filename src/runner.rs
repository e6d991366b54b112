use std::path::Path;

use tracing::{error, info, instrument, warn};

use crate::dispatcher::{Dispatcher, RideService, DEFAULT_CAPACITY};
use crate::errors::{DispatchError, SerializerError};
use crate::fs::{read_commands, save_output};
use crate::parser::{parse_line, RideCommand};
use crate::reply::{OutputFormat, Reply};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub capacity: usize,
    pub format: OutputFormat,
    pub halt_on_duplicate: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            format: OutputFormat::Text,
            halt_on_duplicate: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Commands applied to the dispatcher.
    pub commands: usize,
    /// Lines that didn't parse or named an unknown command.
    pub skipped: usize,
    /// Reply lines produced.
    pub lines: usize,
}

/// Feeds parsed commands to a ride service and turns the outcomes into
/// replies.
#[derive(Debug)]
pub struct Runner<S> {
    svc: S,
    options: RunOptions,
}

impl<S: RideService> Runner<S> {
    pub fn new(svc: S, options: RunOptions) -> Self {
        Self { svc, options }
    }

    pub fn service(&self) -> &S {
        &self.svc
    }

    /// Applies one command. Commands that only mutate produce no reply.
    pub fn apply(&mut self, cmd: RideCommand) -> Option<Reply> {
        match cmd {
            RideCommand::Insert(id, cost, duration) => match self.svc.insert(id, cost, duration) {
                Ok(()) => None,
                Err(err) => rejection(err),
            },
            RideCommand::Print(id) => Some(Reply::found(self.svc.find(id))),
            RideCommand::PrintRange(lo, hi) => Some(Reply::listing(self.svc.range(lo, hi))),
            RideCommand::GetNextRide => match self.svc.dispatch() {
                Ok(ride) => Some(Reply::Ride { ride }),
                Err(DispatchError::Empty) => Some(Reply::NoActiveRides),
                Err(err) => rejection(err),
            },
            RideCommand::CancelRide(id) => {
                self.svc.cancel(id);
                None
            }
            RideCommand::UpdateTrip(id, duration) => {
                match self.svc.update_duration(id, duration) {
                    Ok(_) => None,
                    Err(DispatchError::NotFound(id)) => {
                        warn!(id, "trip update for unknown ride ignored");
                        None
                    }
                    Err(err) => rejection(err),
                }
            }
            RideCommand::Unknown(name) => {
                warn!(name, "unknown command ignored");
                None
            }
        }
    }

    /// Runs a whole batch of command lines and returns the rendered reply
    /// lines.
    pub fn execute(&mut self, input: &str) -> Result<(Vec<String>, RunSummary), SerializerError> {
        let mut lines = Vec::new();
        let mut summary = RunSummary::default();

        for (lineno, line) in input.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let cmd = match parse_line(line) {
                Ok(RideCommand::Unknown(name)) => {
                    warn!(line = lineno + 1, name, "skipping unknown command");
                    summary.skipped += 1;
                    continue;
                }
                Ok(cmd) => cmd,
                Err(err) => {
                    warn!(line = lineno + 1, cause = %err, "skipping line");
                    summary.skipped += 1;
                    continue;
                }
            };

            summary.commands += 1;
            let Some(reply) = self.apply(cmd) else {
                continue;
            };

            lines.push(self.options.format.render(&reply)?);
            if reply.is_fatal() {
                error!(line = lineno + 1, "halting on broken ride links");
                break;
            }
            if reply.halts() && self.options.halt_on_duplicate {
                info!(line = lineno + 1, "halting after duplicate ride number");
                break;
            }
        }

        summary.lines = lines.len();
        Ok((lines, summary))
    }
}

fn rejection(err: DispatchError) -> Option<Reply> {
    match err {
        DispatchError::DuplicateKey(id) => Some(Reply::DuplicateRide { id }),
        DispatchError::CapacityExceeded(capacity) => Some(Reply::CapacityExceeded { capacity }),
        DispatchError::Unlinked => {
            error!("ride index and queue are out of sync");
            Some(Reply::Unlinked)
        }
        err => {
            error!(cause = %err, "command failed");
            None
        }
    }
}

/// Reads commands from `input`, runs them against a fresh dispatcher and
/// writes the replies to `output`.
#[instrument(skip(options))]
pub async fn run(input: &Path, output: &Path, options: RunOptions) -> anyhow::Result<RunSummary> {
    info!(capacity = options.capacity, format = ?options.format, "starting batch");

    let commands = read_commands(input).await?;
    let mut runner = Runner::new(Dispatcher::with_capacity(options.capacity), options);
    let (lines, summary) = runner.execute(&commands)?;

    save_output(output, lines.join("\n").as_bytes()).await?;

    info!(
        commands = summary.commands,
        skipped = summary.skipped,
        lines = summary.lines,
        "batch finished"
    );
    Ok(summary)
}
