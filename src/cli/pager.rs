use std::io::{self, Write};
use std::process::{Child, Command, Stdio};

use crossterm::tty::IsTty;

/// Output sink that pipes through `$PAGER` when stdout is a terminal.
///
/// The pager runs as a child process reading from a pipe. Dropping the guard
/// closes the pipe and waits for the child, so the pager has exited before the
/// program does on every path, including early returns on error.
pub struct Pager {
    child: Option<Child>,
}

impl Pager {
    /// Start the pager, or fall back to plain stdout if paging is disabled,
    /// stdout is not a terminal, or the pager cannot be spawned.
    pub fn start(enabled: bool) -> Pager {
        if !enabled || !io::stdout().is_tty() {
            return Pager { child: None };
        }
        let child = pager_command().and_then(|mut cmd| match cmd.stdin(Stdio::piped()).spawn() {
            Ok(child) => Some(child),
            Err(e) => {
                log::debug!("pager unavailable, writing to stdout: {}", e);
                None
            }
        });
        Pager { child }
    }

    /// Write lines, each followed by a newline.
    ///
    /// A pager that quits early (closing its end of the pipe) is not an error.
    pub fn write_lines(&mut self, lines: &[String]) -> io::Result<()> {
        let mut text = lines.join("\n");
        if !lines.is_empty() {
            text.push('\n');
        }
        let result = match self.child.as_mut().and_then(|c| c.stdin.as_mut()) {
            Some(stdin) => stdin.write_all(text.as_bytes()),
            None => {
                let mut out = io::stdout().lock();
                out.write_all(text.as_bytes()).and_then(|_| out.flush())
            }
        };
        match result {
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            other => other,
        }
    }

    /// Close the pipe and wait for the pager to exit.
    pub fn finish(mut self) -> io::Result<()> {
        self.close()
    }

    fn close(&mut self) -> io::Result<()> {
        if let Some(mut child) = self.child.take() {
            drop(child.stdin.take());
            let status = child.wait()?;
            log::debug!("pager exited: {}", status);
        }
        Ok(())
    }
}

impl Drop for Pager {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("pager: {}", e);
        }
    }
}

/// `$PAGER` split on whitespace, or `less -FRX`. An empty `$PAGER` disables paging.
fn pager_command() -> Option<Command> {
    let command = std::env::var("PAGER").unwrap_or_else(|_| "less -FRX".to_string());
    let mut words = command.split_whitespace();
    let program = words.next()?;
    let mut cmd = Command::new(program);
    cmd.args(words);
    Some(cmd)
}
