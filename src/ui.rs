use std::cell::RefCell;
use std::path::Path;
use std::time::SystemTimeError;

use anyhow::Result;
use colored::{ColoredString, Colorize};

use util::Timer;

use crate::settings::Settings;

/// Terminal output of `fpr`: status lines, the `clean` confirmation prompt,
/// and (with `-v`) progress and timing info. Everything goes to stderr.
pub struct Ui {
    /// `-v` given at least once
    verbose: bool,
    /// `-y`: answer yes to the `clean` prompt
    assume_yes: bool,
    /// started when the command starts
    timer: Timer,
    /// holds the user's answer to a prompt
    answer: RefCell<String>,
}

impl Ui {
    pub fn new(settings: &Settings) -> Self {
        Self {
            verbose: settings.verbose > 0,
            assume_yes: settings.yes,
            timer: Timer::now(),
            answer: RefCell::new(String::with_capacity(8)),
        }
    }

    /// Ask a yes/no question; anything but an answer starting with 'y' is no.
    pub fn confirm(&self, question: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        eprintln!("{question} (y/N)");

        let mut answer = self.answer.borrow_mut();
        answer.clear();
        std::io::stdin().read_line(&mut answer)?;
        Ok(answer.trim_start().starts_with(['y', 'Y']))
    }

    pub fn start_timer(&mut self) {
        self.timer.reset();
    }

    /// With `-v`, print how long the command took.
    pub fn print_elapsed(&self, what: &str) -> Result<(), SystemTimeError> {
        if self.verbose {
            self.timer.print_elapsed(what)?;
        }
        Ok(())
    }

    /// With `-v`, start a progress line about `path`; finish it with `done`.
    pub fn progress(&self, msg: &str, path: &Path) {
        if self.verbose {
            eprint!("{} {}... ", msg.magenta(), path.display());
        }
    }

    pub fn done(&self) {
        if self.verbose {
            eprintln!("{}.", "done".green());
        }
    }

    /// e.g. "WROTE 12 manifest entries to study.fp-manifest"
    pub fn status(&self, label: &str, msg: &str) {
        Self::line(label.green(), msg);
    }

    pub fn failure(&self, label: &str, msg: &str) {
        Self::line(label.red(), msg);
    }

    fn line(label: ColoredString, msg: &str) {
        eprintln!("{label} {msg}");
    }
}
