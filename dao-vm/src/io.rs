//! Program input.
//!
//! INPUT pulls one byte at a time from a [`ByteSource`]. Once a source runs
//! dry it keeps yielding zero.

use std::collections::VecDeque;
use std::io::Read;

pub trait ByteSource {
    /// The next input byte, or `0` once input is exhausted.
    fn next_byte(&mut self) -> u8;
}

/// No input at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyInput;

impl ByteSource for EmptyInput {
    fn next_byte(&mut self) -> u8 {
        0
    }
}

/// Input held in memory, as given after `@` on the command line.
#[derive(Debug, Default, Clone)]
pub struct BufferedInput {
    bytes: VecDeque<u8>,
}

impl BufferedInput {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into().into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len()
    }
}

impl From<&str> for BufferedInput {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes())
    }
}

impl ByteSource for BufferedInput {
    fn next_byte(&mut self) -> u8 {
        self.bytes.pop_front().unwrap_or(0)
    }
}

/// Input streamed from any reader. A read error ends input like EOF.
#[derive(Debug)]
pub struct ReaderInput<R> {
    reader: R,
    done: bool,
}

impl<R: Read> ReaderInput<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            done: false,
        }
    }
}

impl<R: Read> ByteSource for ReaderInput<R> {
    fn next_byte(&mut self) -> u8 {
        if self.done {
            return 0;
        }
        let mut byte = [0u8; 1];
        match self.reader.read(&mut byte) {
            Ok(1) => byte[0],
            Ok(_) => {
                self.done = true;
                0
            }
            Err(err) => {
                tracing::debug!(%err, "input closed");
                self.done = true;
                0
            }
        }
    }
}
