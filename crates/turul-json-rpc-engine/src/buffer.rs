//! Append-only text buffers used to assemble responses, and the pool that
//! recycles them between requests.

use std::fmt;

use tracing::trace;

/// Default initial capacity of a fresh buffer, in bytes
pub const DEFAULT_BUFFER_CAPACITY: usize = 128;

/// Growable, append-only text buffer.
///
/// Capacity doubles whenever an append would not fit, so a response assembled
/// token by token costs a handful of reallocations instead of one per token.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    text: String,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity.max(1)),
        }
    }

    /// Append `s`, growing by doubling if needed
    pub fn push_str(&mut self, s: &str) {
        self.reserve_for(s.len());
        self.text.push_str(s);
    }

    pub fn push(&mut self, c: char) {
        self.reserve_for(c.len_utf8());
        self.text.push(c);
    }

    /// Append formatted text, the buffer's `printf`
    pub fn print(&mut self, args: fmt::Arguments<'_>) {
        // Writing into a String cannot fail
        let _ = fmt::Write::write_fmt(self, args);
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.text.capacity()
    }

    /// Drop the contents but keep the allocation
    pub fn rewind(&mut self) {
        self.text.clear();
    }

    fn reserve_for(&mut self, additional: usize) {
        let needed = self.text.len() + additional;
        let mut capacity = self.text.capacity().max(1);
        if needed <= capacity {
            return;
        }
        while capacity < needed {
            capacity *= 2;
        }
        self.text.reserve_exact(capacity - self.text.len());
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Write for OutputBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

/// Small pool of idle [`OutputBuffer`]s.
///
/// Buffers are checked out by value and handed back when done, so nested users
/// (a batch assembling element responses, each element assembling its result)
/// never share a buffer no matter how deep they nest. Only `retain` idle buffers
/// are kept; extras are dropped on release.
#[derive(Debug)]
pub struct BufferPool {
    idle: Vec<OutputBuffer>,
    retain: usize,
    buffer_capacity: usize,
}

impl BufferPool {
    pub fn new(retain: usize, buffer_capacity: usize) -> Self {
        Self {
            idle: Vec::with_capacity(retain),
            retain,
            buffer_capacity,
        }
    }

    /// Check out an empty buffer, reusing an idle one when available
    pub fn acquire(&mut self) -> OutputBuffer {
        match self.idle.pop() {
            Some(buffer) => buffer,
            None => {
                trace!(capacity = self.buffer_capacity, "Allocating output buffer");
                OutputBuffer::with_capacity(self.buffer_capacity)
            }
        }
    }

    /// Return a buffer to the pool
    pub fn release(&mut self, mut buffer: OutputBuffer) {
        if self.idle.len() < self.retain {
            buffer.rewind();
            self.idle.push(buffer);
        }
    }

    /// Number of idle buffers currently held
    pub fn idle(&self) -> usize {
        self.idle.len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(3, DEFAULT_BUFFER_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_doubles() {
        let mut buffer = OutputBuffer::with_capacity(4);
        buffer.push_str("abcd");
        assert_eq!(buffer.capacity(), 4);

        buffer.push('e');
        assert_eq!(buffer.capacity(), 8);

        buffer.push_str("0123456789");
        assert_eq!(buffer.capacity(), 16);
        assert_eq!(buffer.as_str(), "abcde0123456789");
    }

    #[test]
    fn test_print_and_rewind() {
        let mut buffer = OutputBuffer::new();
        buffer.print(format_args!("{{\"n\":{}}}", 19));
        assert_eq!(buffer.as_str(), r#"{"n":19}"#);

        let capacity = buffer.capacity();
        buffer.rewind();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), capacity);
    }

    #[test]
    fn test_pool_reuses_and_bounds_idle_buffers() {
        let mut pool = BufferPool::new(1, 16);
        let mut first = pool.acquire();
        let second = pool.acquire();
        first.push_str("dirty");

        pool.release(first);
        pool.release(second);
        assert_eq!(pool.idle(), 1);

        let reused = pool.acquire();
        assert!(reused.is_empty());
        assert_eq!(pool.idle(), 0);
    }
}
