//! Terminal UI.
//!
//! Command output goes to `out`; warnings and errors go to `err`. Prompts
//! read from `input`. The `v3-*` commands open with the experimental banner
//! on `out`; `v3-push` prints it as a warning instead.

use std::io::{self, BufRead, Write};

/// Banner printed by experimental commands.
pub const EXPERIMENTAL_WARNING: &str =
    "This command is in EXPERIMENTAL stage and may change without notice";

/// Columns are separated by this many spaces.
pub const DEFAULT_TABLE_PADDING: usize = 3;

/// Output and input streams for one command invocation.
pub struct Ui {
    out: Box<dyn Write>,
    err: Box<dyn Write>,
    input: Box<dyn BufRead>,
}

impl std::fmt::Debug for Ui {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ui").finish_non_exhaustive()
    }
}

impl Ui {
    /// Build a UI over arbitrary streams.
    pub fn new(out: Box<dyn Write>, err: Box<dyn Write>, input: Box<dyn BufRead>) -> Self {
        Self { out, err, input }
    }

    /// UI over the process's stdout, stderr and stdin.
    pub fn stdio() -> Self {
        Self::new(
            Box::new(io::stdout()),
            Box::new(io::stderr()),
            Box::new(io::BufReader::new(io::stdin())),
        )
    }

    /// Print one line.
    pub fn display_text(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    /// Print the experimental banner and a blank line.
    pub fn display_experimental_warning(&mut self) -> io::Result<()> {
        writeln!(self.out, "{EXPERIMENTAL_WARNING}")?;
        writeln!(self.out)
    }

    /// Print an empty line.
    pub fn display_newline(&mut self) -> io::Result<()> {
        writeln!(self.out)
    }

    /// Print `OK`.
    pub fn display_ok(&mut self) -> io::Result<()> {
        writeln!(self.out, "OK")
    }

    /// Print one warning on the error stream.
    pub fn display_warning(&mut self, warning: &str) -> io::Result<()> {
        writeln!(self.err, "{warning}")
    }

    /// Print each warning on its own line on the error stream.
    pub fn display_warnings(&mut self, warnings: &[String]) -> io::Result<()> {
        for warning in warnings {
            self.display_warning(warning)?;
        }
        Ok(())
    }

    /// Print a failure: the message on the error stream, `FAILED` on out.
    pub fn display_error(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.err, "{message}")?;
        writeln!(self.out, "FAILED")
    }

    /// Print `key: value` rows aligned on the value column.
    pub fn display_key_value_table(&mut self, prefix: &str, rows: &[Vec<String>]) -> io::Result<()> {
        self.display_table(prefix, rows, 1)
    }

    /// Print rows as a non-wrapping table.
    ///
    /// Every column but the last is padded to its widest cell plus `padding`.
    pub fn display_table(&mut self, prefix: &str, rows: &[Vec<String>], padding: usize) -> io::Result<()> {
        for line in render_table(prefix, rows, padding) {
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }

    /// Ask a yes/no question and return the answer.
    ///
    /// Empty input or end of input picks `default`. Anything other than
    /// `y`, `yes`, `n` or `no` is rejected and the question asked again.
    pub fn display_bool_prompt(&mut self, default: bool, prompt: &str) -> io::Result<bool> {
        let choices = if default { "[Yn]" } else { "[yN]" };
        loop {
            write!(self.out, "{prompt} {choices}: ")?;
            self.out.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(default);
            }
            match line.trim().to_ascii_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.out, "invalid input (not y, n, yes, or no)")?,
            }
        }
    }

    /// Flush both output streams.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()?;
        self.err.flush()
    }
}

fn render_table(prefix: &str, rows: &[Vec<String>], padding: usize) -> Vec<String> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    rows.iter()
        .map(|row| {
            let mut line = String::from(prefix);
            for (i, cell) in row.iter().enumerate() {
                line.push_str(cell);
                if i + 1 < row.len() {
                    let fill = widths[i] - cell.chars().count() + padding;
                    line.extend(std::iter::repeat_n(' ', fill));
                }
            }
            line.trim_end().to_string()
        })
        .collect()
}

#[cfg(test)]
pub(crate) use test_support::Captured;

#[cfg(test)]
mod test_support {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use super::Ui;

    /// In-memory sink shared between a [`Ui`] and the test reading it.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// What a test UI has printed so far.
    pub(crate) struct Captured {
        out: SharedBuffer,
        err: SharedBuffer,
    }

    impl Captured {
        pub(crate) fn out(&self) -> String {
            String::from_utf8(self.out.0.lock().expect("lock").clone()).expect("utf8")
        }

        pub(crate) fn err(&self) -> String {
            String::from_utf8(self.err.0.lock().expect("lock").clone()).expect("utf8")
        }
    }

    impl Ui {
        /// A UI that answers prompts from `input` and captures its output.
        pub(crate) fn for_test(input: &str) -> (Self, Captured) {
            let out = SharedBuffer::default();
            let err = SharedBuffer::default();
            let ui = Self::new(
                Box::new(out.clone()),
                Box::new(err.clone()),
                Box::new(io::Cursor::new(input.as_bytes().to_vec())),
            );
            (ui, Captured { out, err })
        }
    }
}
