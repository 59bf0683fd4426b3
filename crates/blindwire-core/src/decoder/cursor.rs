//! Sequential read cursor with single-level checkpoint/rollback.

use super::wire;
use crate::error::{Error, Result};
use bytes::Bytes;

/// A saved cursor position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

impl Checkpoint {
    /// Returns the saved position
    pub fn position(&self) -> usize {
        self.0
    }
}

/// Read cursor over an immutable buffer.
///
/// Invariant: `0 <= position <= buffer.len()`. Failed reads never move the
/// cursor, so rolling back after one is always safe but never required.
#[derive(Debug, Clone)]
pub struct ByteCursor {
    buffer: Bytes,
    position: usize,
    checkpoint: Option<Checkpoint>,
}

impl ByteCursor {
    /// Creates a cursor positioned at the start of `buffer`
    pub fn new(buffer: impl Into<Bytes>) -> Self {
        Self {
            buffer: buffer.into(),
            position: 0,
            checkpoint: None,
        }
    }

    /// Current read position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of unread bytes
    pub fn bytes_left(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// Total length of the underlying buffer
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if the underlying buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the next byte without advancing
    pub fn peek(&self) -> Option<u8> {
        self.buffer.get(self.position).copied()
    }

    /// Returns the unread tail without advancing
    pub fn remaining(&self) -> Bytes {
        self.buffer.slice(self.position..)
    }

    /// Saves the current position, replacing any earlier checkpoint
    pub fn set_checkpoint(&mut self) -> Checkpoint {
        let checkpoint = Checkpoint(self.position);
        self.checkpoint = Some(checkpoint);
        checkpoint
    }

    /// Restores the position saved by the last [`set_checkpoint`](Self::set_checkpoint).
    ///
    /// Does nothing if no checkpoint was ever set.
    pub fn rollback(&mut self) {
        if let Some(checkpoint) = self.checkpoint {
            self.position = checkpoint.0;
        }
    }

    /// Reads a varint at the current position and advances past it
    pub fn read_varint(&mut self) -> Result<u64> {
        let (value, consumed) = wire::read_varint(&self.buffer, self.position)?;
        self.position += consumed;
        Ok(value)
    }

    /// Reads the next `n` bytes and advances past them
    pub fn read_exact(&mut self, n: usize) -> Result<Bytes> {
        let available = self.bytes_left();
        if n > available {
            return Err(Error::overflow(self.position, n, available));
        }
        let start = self.position;
        self.position += n;
        Ok(self.buffer.slice(start..self.position))
    }

    /// Reads exactly `N` bytes into an array and advances past them
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_exact(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&bytes);
        Ok(out)
    }
}
