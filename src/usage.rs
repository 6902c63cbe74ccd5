//! Plain-text usage screens.
//!
//! Flags are laid out in two columns inside an 80 character line:
//!
//! ```text
//! | prefix (2) | flag names (25) | gap (3) | description (50) |
//! ```
//!
//! Names that don't fit get a line of their own, and descriptions wrap at the
//! last space before the column edge.

use std::fmt::Write;

use crate::{command::Command, flag::Flag};

const PREFIX_LEN: usize = 2;
const POSTFIX_LEN: usize = 3;
const FLAGS_LEN: usize = 25;
const USAGE_LEN: usize = 50;
const TOTAL_LEN: usize = 80;

impl Command {
    /// `<trail> [<command>] [<args>]` followed by a blank line.
    pub(crate) fn usage_title(&self, trail: &[String]) -> String {
        let mut buf = trail.join(" ");
        if self.has_commands() {
            buf.push_str(" [<command>]");
        }
        if self.flags().next().is_some() {
            buf.push_str(" [<args>]");
        }
        buf.push_str("\n\n");
        buf
    }

    /// The subcommand table followed by the required and optional flags.
    pub fn usage(&self) -> String {
        let mut buf = String::new();

        let visible = self.commands.iter().filter(|it| !it.hidden).collect::<Vec<_>>();
        if self.has_commands() {
            let width = visible.iter().map(|it| it.name.len()).max().unwrap_or(0);
            for cmd in &visible {
                let line = format!("  {:width$}   {}", cmd.name, cmd.desc);
                w!(buf, "{}\n", line.trim_end());
            }
            buf.push('\n');
        }

        let (required, optional): (Vec<&Flag>, Vec<&Flag>) =
            self.flags().filter(|it| !it.is_hidden()).partition(|it| it.is_required());
        for (title, flags) in [("Required Flags", required), ("Optional Flags", optional)] {
            if flags.is_empty() {
                continue;
            }
            w!(buf, "{title}:\n\n");
            for flag in flags {
                buf.push_str(&flag.usage_string());
            }
            buf.push('\n');
        }

        buf
    }

    fn has_commands(&self) -> bool {
        !self.commands.is_empty()
    }
}

impl Flag {
    fn usage_string(&self) -> String {
        if self.is_hidden() {
            return String::new();
        }

        let mut buf = String::new();
        let names = self.names_column();
        let lines = split_description(self.desc());
        let indent = TOTAL_LEN - USAGE_LEN;

        if names.len() > FLAGS_LEN {
            w!(buf, "{:PREFIX_LEN$}{names}\n", "");
            w!(buf, "{}\n", format!("{:indent$}{}", "", lines[0]).trim_end());
        } else {
            let width = FLAGS_LEN + POSTFIX_LEN;
            let line = format!("{:PREFIX_LEN$}{names:width$}{}", "", lines[0]);
            w!(buf, "{}\n", line.trim_end());
        }
        for line in &lines[1..] {
            w!(buf, "{:indent$}{line}\n", "");
        }

        buf
    }

    fn names_column(&self) -> String {
        match (self.short().is_empty(), self.long().is_empty()) {
            (false, false) => format!("-{},--{}", self.short(), self.long()),
            (true, _) => format!("   --{}", self.long()),
            (false, true) => format!("-{}", self.short()),
        }
    }
}

/// Breaks `desc` into lines of at most [`USAGE_LEN`] bytes, preferring to
/// break at a space. Always returns at least one line.
fn split_description(mut desc: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    while desc.len() > USAGE_LEN {
        match desc.as_bytes()[..=USAGE_LEN].iter().rposition(|&b| b == b' ') {
            Some(idx) => {
                lines.push(&desc[..idx]);
                desc = &desc[idx + 1..];
            }
            None => {
                let mut idx = USAGE_LEN;
                while !desc.is_char_boundary(idx) {
                    idx -= 1;
                }
                lines.push(&desc[..idx]);
                desc = &desc[idx..];
            }
        }
    }
    lines.push(desc);
    lines
}
