//! In-memory command runner for exercising `CliOracle` without the real tools.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::{OracleError, Result};
use crate::runner::{CommandOutput, CommandRunner};

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
}

/// Replays queued outputs per program, in order, and records every call.
/// A call with nothing queued behaves like a missing binary.
#[derive(Default)]
pub struct ScriptedRunner {
    responses: Mutex<HashMap<String, VecDeque<CommandOutput>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, program: &str, stdout: &str) -> Self {
        self.respond_full(
            program,
            CommandOutput {
                success: true,
                code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        )
    }

    pub fn fail(self, program: &str, stderr: &str) -> Self {
        self.respond_full(
            program,
            CommandOutput {
                success: false,
                code: Some(1),
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        )
    }

    pub fn respond_full(self, program: &str, output: CommandOutput) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(program.to_string())
            .or_default()
            .push_back(output);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls whose first argument is `subcommand`.
    pub fn calls_to(&self, program: &str, subcommand: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.program == program && c.args.first().map(String::as_str) == Some(subcommand))
            .count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(RecordedCall {
            program: program.to_string(),
            args: args.to_vec(),
        });

        let next = self
            .responses
            .lock()
            .unwrap()
            .get_mut(program)
            .and_then(VecDeque::pop_front);

        next.ok_or_else(|| OracleError::Spawn {
            program: program.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no scripted response"),
        })
    }
}
