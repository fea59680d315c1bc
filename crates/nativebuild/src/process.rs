//! Foreground toolchain subprocesses with line-streamed output.

use std::collections::BTreeMap;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread;

use crate::spec::{BuildError, BuildResult};

/// Which pipe a streamed line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumOutputStream {
    Stdout,
    Stderr,
}

/// One command to run: program, arguments, working directory, extra env.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecProcess {
    pub program: String,
    pub args: Vec<String>,
    pub path_dir: PathBuf,
    /// Added on top of the inherited environment.
    pub envs: BTreeMap<String, String>,
    /// Inherit the terminal instead of streaming through the callback.
    pub if_tty: bool,
}

impl SpecProcess {
    pub fn new<I, S>(program: &str, args: I, path_dir: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            path_dir: path_dir.to_path_buf(),
            envs: BTreeMap::new(),
            if_tty: false,
        }
    }

    pub fn with_envs(mut self, envs: BTreeMap<String, String>) -> Self {
        self.envs = envs;
        self
    }

    pub fn with_tty(mut self, if_tty: bool) -> Self {
        self.if_tty = if_tty;
        self
    }

    /// Display form, e.g. `npm run build:mac`.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs toolchain commands to completion.
pub trait ProcessRunner {
    /// Run `spec_process`, feeding each output line to `on_line`, and fail
    /// unless it exits successfully.
    fn run(
        &self,
        spec_process: &SpecProcess,
        on_line: &mut dyn FnMut(EnumOutputStream, &str),
    ) -> BuildResult<()>;
}

/// Echo a streamed line to the matching standard stream.
pub fn echo_line(stream: EnumOutputStream, line: &str) {
    match stream {
        EnumOutputStream::Stdout => println!("{line}"),
        EnumOutputStream::Stderr => eprintln!("{line}"),
    }
}

/// [`ProcessRunner`] over `std::process::Command`.
///
/// No timeout and no retry: the call blocks until the child exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(
        &self,
        spec_process: &SpecProcess,
        on_line: &mut dyn FnMut(EnumOutputStream, &str),
    ) -> BuildResult<()> {
        let c_command = spec_process.command_line();
        log::debug!(
            "Running `{c_command}` in {}",
            spec_process.path_dir.display()
        );

        let mut command = Command::new(resolve_program(&spec_process.program));
        command
            .args(&spec_process.args)
            .current_dir(&spec_process.path_dir)
            .envs(&spec_process.envs);

        let spawn_err = |e| BuildError::Spawn {
            command: c_command.clone(),
            source: e,
        };

        if spec_process.if_tty {
            let status = command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .map_err(spawn_err)?;
            return check_status(&c_command, status);
        }

        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        let (tx, rx) = mpsc::channel();
        let mut l_readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            l_readers.push((
                EnumOutputStream::Stdout,
                spawn_line_reader(stdout, EnumOutputStream::Stdout, tx.clone()),
            ));
        }
        if let Some(stderr) = child.stderr.take() {
            l_readers.push((
                EnumOutputStream::Stderr,
                spawn_line_reader(stderr, EnumOutputStream::Stderr, tx.clone()),
            ));
        }
        drop(tx);

        for (stream, line) in rx {
            on_line(stream, &line);
        }
        for (stream, reader) in l_readers {
            match reader.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::warn!("Reading {stream:?} of `{c_command}` failed: {e}"),
                Err(_) => log::warn!("{stream:?} reader of `{c_command}` panicked"),
            }
        }

        let status = child.wait().map_err(spawn_err)?;
        check_status(&c_command, status)
    }
}

fn spawn_line_reader<R>(
    pipe: R,
    stream: EnumOutputStream,
    tx: Sender<(EnumOutputStream, String)>,
) -> thread::JoinHandle<io::Result<()>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || forward_lines(pipe, stream, &tx))
}

/// Send every line of `pipe` until EOF or until the receiver is gone.
fn forward_lines<R: Read>(
    pipe: R,
    stream: EnumOutputStream,
    tx: &Sender<(EnumOutputStream, String)>,
) -> io::Result<()> {
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']).to_string();
        if tx.send((stream, line)).is_err() {
            return Ok(());
        }
    }
}

fn check_status(c_command: &str, status: ExitStatus) -> BuildResult<()> {
    if status.success() {
        return Ok(());
    }
    Err(BuildError::Subprocess {
        command: c_command.to_string(),
        code: status.code(),
    })
}

/// Node and Composer ship batch shims on Windows that `Command` will not
/// find by bare name.
fn resolve_program(program: &str) -> String {
    if cfg!(windows) {
        match program {
            "npm" | "npx" => return format!("{program}.cmd"),
            "composer" => return "composer.bat".to_string(),
            _ => {}
        }
    }
    program.to_string()
}

/// Records every request instead of spawning anything.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingRunner {
    calls: std::cell::RefCell<Vec<SpecProcess>>,
    program_failing: Option<String>,
}

#[cfg(test)]
impl RecordingRunner {
    pub(crate) fn failing_on(program: &str) -> Self {
        Self {
            program_failing: Some(program.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<SpecProcess> {
        self.calls.borrow().clone()
    }
}

#[cfg(test)]
impl ProcessRunner for RecordingRunner {
    fn run(
        &self,
        spec_process: &SpecProcess,
        on_line: &mut dyn FnMut(EnumOutputStream, &str),
    ) -> BuildResult<()> {
        self.calls.borrow_mut().push(spec_process.clone());
        on_line(EnumOutputStream::Stdout, &spec_process.command_line());
        if self.program_failing.as_deref() == Some(spec_process.program.as_str()) {
            return Err(BuildError::Subprocess {
                command: spec_process.command_line(),
                code: Some(1),
            });
        }
        Ok(())
    }
}
