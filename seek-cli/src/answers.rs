//! Reads Scale Detective answers from the keyboard, one line per note.

use std::io::{BufRead, Write};

use seek_core::scale::{Answer, AnswerSource};
use seek_core::{SeekError, SeekResult};

/// Maps a typed line to an answer. An empty line means "in tune".
pub fn parse_answer(line: &str) -> Option<Answer> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "ok" => Some(Answer::InTune),
        "/" | "z" | "x" => Some(Answer::OutOfTune),
        "u" | "+" | "up" | "h" => Some(Answer::Higher),
        "d" | "-" | "down" | "l" => Some(Answer::Lower),
        _ => None,
    }
}

/// Prompts on `output` and reads answers from `input`.
pub struct LineAnswers<R, W> {
    input: R,
    output: W,
    hard_mode: bool,
}

impl<R: BufRead, W: Write> LineAnswers<R, W> {
    pub fn new(input: R, output: W, hard_mode: bool) -> Self {
        Self {
            input,
            output,
            hard_mode,
        }
    }

    fn prompt(&mut self) -> std::io::Result<()> {
        if self.hard_mode {
            writeln!(self.output, "Press: u (too high), d (too low), Enter (in tune)")?;
        } else {
            writeln!(self.output, "Press: / (out of tune), Enter (in tune)")?;
        }
        self.output.flush()
    }
}

impl<R: BufRead, W: Write> AnswerSource for LineAnswers<R, W> {
    fn answer(&mut self, _position: usize) -> SeekResult<Answer> {
        self.prompt().map_err(input_error)?;
        loop {
            let mut line = String::new();
            let read = self.input.read_line(&mut line).map_err(input_error)?;
            if read == 0 {
                return Err(SeekError::Input("input closed".to_string()));
            }
            match parse_answer(&line) {
                Some(answer) => return Ok(answer),
                None => self.prompt().map_err(input_error)?,
            }
        }
    }
}

fn input_error(err: std::io::Error) -> SeekError {
    SeekError::Input(err.to_string())
}
