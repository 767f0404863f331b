use std::io::{self, Write};

use crate::client::transcript::{Role, Transcript};

pub const ASSISTANT_PREFIX: &str = "Assistant> ";

pub trait Render {
    fn render(&mut self, transcript: &Transcript) -> io::Result<()>;
}

/// Prints assistant entries as they grow. User entries are skipped since the user already
/// typed them on screen.
pub struct TerminalRenderer<W: Write> {
    out: W,
    rendered: usize,
    printed: usize,
    generation: u64,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            rendered: 0,
            printed: 0,
            generation: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Render for TerminalRenderer<W> {
    fn render(&mut self, transcript: &Transcript) -> io::Result<()> {
        let entries = transcript.entries();
        if transcript.generation() != self.generation {
            // cleared since the last render
            self.generation = transcript.generation();
            self.rendered = 0;
            self.printed = 0;
        }

        while let Some(entry) = entries.get(self.rendered) {
            if entry.role == Role::User {
                self.rendered += 1;
                continue;
            }

            if self.printed == 0 {
                write!(self.out, "{ASSISTANT_PREFIX}")?;
            }
            match entry.content.get(self.printed..) {
                Some(rest) => write!(self.out, "{rest}")?,
                None => write!(self.out, "\n{}", entry.content)?,
            }
            self.printed = entry.content.len();

            if entry.is_open() {
                break;
            }
            writeln!(self.out)?;
            self.rendered += 1;
            self.printed = 0;
        }

        self.out.flush()
    }
}
