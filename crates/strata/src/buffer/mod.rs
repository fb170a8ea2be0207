// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cursor-based byte buffers over pluggable backing storage.
//!
//! A [`Buffer`] pairs a [`Storage`] strategy with a `position`/`limit` cursor:
//!
//! ```text
//! 0 <= position <= limit <= capacity
//!
//! write mode:  [ written ........ | free ............... ]  limit == capacity
//!                                  ^position
//! read mode:   [ consumed | readable ......... ] (unused)   limit == end of data
//!                          ^position           ^limit
//! ```
//!
//! `flip()` switches from writing to reading, `clear()` switches back.
//! Backing strategies:
//!
//! - [`SliceBuffer`]: fixed, borrowed external array
//! - [`FixedBuffer`]: fixed, owned heap segment
//! - [`GrowableBuffer`]: reallocating storage with an optional ceiling
//! - [`PooledBuffer`]: fixed segment borrowed from a shared [`BufferPool`]
//!
//! A buffer is thread-confined; only [`BufferPool`] is shared across threads.

mod pool;
mod storage;

pub use pool::{BufferPool, PoolConfig, PoolExhaustion, PooledSegment};
pub use storage::{Growable, Storage};

use std::fmt;

/// Buffer failure modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// A write needed more room than the limit (and storage could not grow).
    Overflow {
        position: usize,
        needed: usize,
        limit: usize,
    },
    /// A read needed more bytes than remain before the limit.
    Underflow {
        position: usize,
        needed: usize,
        limit: usize,
    },
    /// Position set beyond the limit.
    InvalidPosition { position: usize, limit: usize },
    /// Limit set beyond the capacity.
    InvalidLimit { limit: usize, capacity: usize },
    /// Shift source or destination falls outside the storage.
    InvalidShift {
        start: usize,
        end: usize,
        delta: isize,
    },
    /// Growable storage hit its ceiling.
    CapacityExceeded { requested: usize, max: usize },
    /// Pool had no free segment and its policy is `Fail`.
    PoolExhausted,
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::Overflow {
                position,
                needed,
                limit,
            } => write!(
                f,
                "buffer overflow: {} bytes at position {} exceed limit {}",
                needed, position, limit
            ),
            BufferError::Underflow {
                position,
                needed,
                limit,
            } => write!(
                f,
                "buffer underflow: {} bytes at position {} exceed limit {}",
                needed, position, limit
            ),
            BufferError::InvalidPosition { position, limit } => {
                write!(f, "position {} beyond limit {}", position, limit)
            }
            BufferError::InvalidLimit { limit, capacity } => {
                write!(f, "limit {} beyond capacity {}", limit, capacity)
            }
            BufferError::InvalidShift { start, end, delta } => {
                write!(f, "invalid shift of [{}, {}) by {}", start, end, delta)
            }
            BufferError::CapacityExceeded { requested, max } => {
                write!(f, "requested capacity {} exceeds maximum {}", requested, max)
            }
            BufferError::PoolExhausted => write!(f, "buffer pool exhausted"),
        }
    }
}

impl std::error::Error for BufferError {}

pub type BufferResult<T> = Result<T, BufferError>;

/// Buffer over a borrowed external array.
pub type SliceBuffer<'a> = Buffer<&'a mut [u8]>;
/// Buffer over an owned fixed-size segment.
pub type FixedBuffer = Buffer<Box<[u8]>>;
/// Buffer over reallocating storage.
pub type GrowableBuffer = Buffer<Growable>;
/// Buffer over a segment borrowed from a [`BufferPool`].
pub type PooledBuffer = Buffer<PooledSegment>;

/// Generate cursor-advancing put methods for fixed-width numbers.
macro_rules! impl_put {
    ($name:ident, $type:ty, $to_bytes:ident) => {
        pub fn $name(&mut self, value: $type) -> BufferResult<()> {
            self.put_bytes(&value.$to_bytes())
        }
    };
}

/// Generate cursor-advancing get methods for fixed-width numbers.
macro_rules! impl_get {
    ($name:ident, $type:ty, $from_bytes:ident) => {
        pub fn $name(&mut self) -> BufferResult<$type> {
            let mut bytes = [0u8; std::mem::size_of::<$type>()];
            self.get_bytes(&mut bytes)?;
            Ok(<$type>::$from_bytes(bytes))
        }
    };
}

/// Read/write cursor over a [`Storage`] strategy.
#[derive(Debug)]
pub struct Buffer<S: Storage> {
    storage: S,
    position: usize,
    limit: usize,
}

impl<'a> Buffer<&'a mut [u8]> {
    /// Wrap an external array in write mode.
    pub fn wrap(bytes: &'a mut [u8]) -> Self {
        Self::from_storage(bytes)
    }
}

impl Buffer<Box<[u8]>> {
    /// Allocate a zeroed fixed segment in write mode.
    pub fn allocate(capacity: usize) -> Self {
        Self::from_storage(vec![0u8; capacity].into_boxed_slice())
    }

    /// Take ownership of `bytes` in read mode (limit at the end of the data).
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let mut buffer = Self::from_storage(bytes.into_boxed_slice());
        buffer.position = buffer.limit;
        buffer.flip();
        buffer
    }
}

impl Buffer<Growable> {
    /// Growable buffer without a capacity ceiling.
    pub fn growable(initial_capacity: usize) -> Self {
        Self::from_storage(Growable::new(initial_capacity, None))
    }

    /// Growable buffer that refuses to grow past `max_capacity`.
    pub fn bounded(initial_capacity: usize, max_capacity: usize) -> Self {
        Self::from_storage(Growable::new(
            initial_capacity.min(max_capacity),
            Some(max_capacity),
        ))
    }

    /// Consume the buffer, returning the bytes written so far.
    pub fn into_vec(self) -> Vec<u8> {
        let mut bytes = self.storage.into_inner();
        bytes.truncate(self.position);
        bytes
    }
}

impl<S: Storage> Buffer<S> {
    /// Build a write-mode buffer over `storage`.
    pub fn from_storage(storage: S) -> Self {
        let limit = storage.bytes().len();
        Self {
            storage,
            position: 0,
            limit,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn capacity(&self) -> usize {
        self.storage.bytes().len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) -> BufferResult<()> {
        if position > self.limit {
            return Err(BufferError::InvalidPosition {
                position,
                limit: self.limit,
            });
        }
        self.position = position;
        Ok(())
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Set the limit; the position is clamped to it.
    pub fn set_limit(&mut self, limit: usize) -> BufferResult<()> {
        let capacity = self.capacity();
        if limit > capacity {
            return Err(BufferError::InvalidLimit { limit, capacity });
        }
        self.limit = limit;
        self.position = self.position.min(limit);
        Ok(())
    }

    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    pub fn has_remaining(&self) -> bool {
        self.position < self.limit
    }

    /// Switch to read mode: the current position becomes the limit.
    pub fn flip(&mut self) {
        self.limit = self.position;
        self.position = 0;
    }

    /// Switch to write mode from zero. Contents are not erased.
    pub fn clear(&mut self) {
        self.position = 0;
        self.limit = self.capacity();
    }

    /// Bytes in `[0, position)`.
    pub fn written(&self) -> &[u8] {
        &self.storage.bytes()[..self.position]
    }

    /// Bytes in `[position, limit)`.
    pub fn readable(&self) -> &[u8] {
        &self.storage.bytes()[self.position..self.limit]
    }

    /// Whole backing storage, independent of the cursor.
    pub fn as_slice(&self) -> &[u8] {
        self.storage.bytes()
    }

    /// Grow storage to at least `min_capacity`. A write-mode limit follows
    /// the new capacity.
    fn grow_to(&mut self, min_capacity: usize) -> BufferResult<()> {
        let old_capacity = self.capacity();
        if min_capacity <= old_capacity {
            return Ok(());
        }
        self.storage.grow(min_capacity)?;
        if self.limit == old_capacity {
            self.limit = self.capacity();
        }
        Ok(())
    }

    fn ensure_writable(&mut self, needed: usize) -> BufferResult<()> {
        let end = self.position.checked_add(needed);
        if end.is_some_and(|end| end <= self.limit) {
            return Ok(());
        }
        if let Some(end) = end {
            if self.limit == self.capacity() && self.grow_to(end).is_ok() {
                return Ok(());
            }
        }
        Err(BufferError::Overflow {
            position: self.position,
            needed,
            limit: self.limit,
        })
    }

    fn ensure_readable(&self, needed: usize) -> BufferResult<()> {
        if needed > self.limit.saturating_sub(self.position) {
            return Err(BufferError::Underflow {
                position: self.position,
                needed,
                limit: self.limit,
            });
        }
        Ok(())
    }

    pub fn put_u8(&mut self, value: u8) -> BufferResult<()> {
        self.ensure_writable(1)?;
        self.storage.bytes_mut()[self.position] = value;
        self.position += 1;
        Ok(())
    }

    pub fn get_u8(&mut self) -> BufferResult<u8> {
        self.ensure_readable(1)?;
        let value = self.storage.bytes()[self.position];
        self.position += 1;
        Ok(value)
    }

    pub fn put_i8(&mut self, value: i8) -> BufferResult<()> {
        self.put_u8(value as u8)
    }

    pub fn get_i8(&mut self) -> BufferResult<i8> {
        Ok(self.get_u8()? as i8)
    }

    impl_put!(put_u16_le, u16, to_le_bytes);
    impl_put!(put_u16_be, u16, to_be_bytes);
    impl_put!(put_u32_le, u32, to_le_bytes);
    impl_put!(put_u32_be, u32, to_be_bytes);
    impl_put!(put_u64_le, u64, to_le_bytes);
    impl_put!(put_u64_be, u64, to_be_bytes);
    impl_put!(put_i16_le, i16, to_le_bytes);
    impl_put!(put_i16_be, i16, to_be_bytes);
    impl_put!(put_i32_le, i32, to_le_bytes);
    impl_put!(put_i32_be, i32, to_be_bytes);
    impl_put!(put_i64_le, i64, to_le_bytes);
    impl_put!(put_i64_be, i64, to_be_bytes);
    impl_put!(put_f32_le, f32, to_le_bytes);
    impl_put!(put_f64_le, f64, to_le_bytes);

    impl_get!(get_u16_le, u16, from_le_bytes);
    impl_get!(get_u16_be, u16, from_be_bytes);
    impl_get!(get_u32_le, u32, from_le_bytes);
    impl_get!(get_u32_be, u32, from_be_bytes);
    impl_get!(get_u64_le, u64, from_le_bytes);
    impl_get!(get_u64_be, u64, from_be_bytes);
    impl_get!(get_i16_le, i16, from_le_bytes);
    impl_get!(get_i16_be, i16, from_be_bytes);
    impl_get!(get_i32_le, i32, from_le_bytes);
    impl_get!(get_i32_be, i32, from_be_bytes);
    impl_get!(get_i64_le, i64, from_le_bytes);
    impl_get!(get_i64_be, i64, from_be_bytes);
    impl_get!(get_f32_le, f32, from_le_bytes);
    impl_get!(get_f64_le, f64, from_le_bytes);

    pub fn put_bytes(&mut self, data: &[u8]) -> BufferResult<()> {
        self.ensure_writable(data.len())?;
        let start = self.position;
        self.storage.bytes_mut()[start..start + data.len()].copy_from_slice(data);
        self.position += data.len();
        Ok(())
    }

    /// Write `src[offset..offset + len]`.
    pub fn put_slice(&mut self, src: &[u8], offset: usize, len: usize) -> BufferResult<()> {
        let chunk = src
            .get(offset..offset.saturating_add(len))
            .ok_or(BufferError::Underflow {
                position: offset,
                needed: len,
                limit: src.len(),
            })?;
        self.put_bytes(chunk)
    }

    /// Fill `dst` completely from the cursor.
    pub fn get_bytes(&mut self, dst: &mut [u8]) -> BufferResult<()> {
        let len = dst.len();
        dst.copy_from_slice(self.take(len)?);
        Ok(())
    }

    /// Read `len` bytes into `dst[offset..offset + len]`.
    pub fn get_slice(&mut self, dst: &mut [u8], offset: usize, len: usize) -> BufferResult<()> {
        let capacity = dst.len();
        let target = dst
            .get_mut(offset..offset.saturating_add(len))
            .ok_or(BufferError::Overflow {
                position: offset,
                needed: len,
                limit: capacity,
            })?;
        target.copy_from_slice(self.take(len)?);
        Ok(())
    }

    /// Borrow the next `len` readable bytes and advance past them.
    pub fn take(&mut self, len: usize) -> BufferResult<&[u8]> {
        self.ensure_readable(len)?;
        let start = self.position;
        self.position += len;
        Ok(&self.storage.bytes()[start..start + len])
    }

    /// Skip `len` readable bytes.
    pub fn skip(&mut self, len: usize) -> BufferResult<()> {
        self.ensure_readable(len)?;
        self.position += len;
        Ok(())
    }

    /// Write `count` zero bytes.
    pub fn pad(&mut self, count: usize) -> BufferResult<()> {
        self.ensure_writable(count)?;
        let start = self.position;
        self.storage.bytes_mut()[start..start + count].fill(0);
        self.position += count;
        Ok(())
    }

    /// Write one byte at `index` without moving the cursor.
    pub fn put_u8_at(&mut self, index: usize, value: u8) -> BufferResult<()> {
        self.put_bytes_at(index, &[value])
    }

    /// Read one byte at `index` without moving the cursor.
    pub fn get_u8_at(&self, index: usize) -> BufferResult<u8> {
        self.storage
            .bytes()
            .get(index)
            .copied()
            .ok_or(BufferError::Underflow {
                position: index,
                needed: 1,
                limit: self.capacity(),
            })
    }

    /// Write `data` at `index` without moving the cursor.
    pub fn put_bytes_at(&mut self, index: usize, data: &[u8]) -> BufferResult<()> {
        let overflow = BufferError::Overflow {
            position: index,
            needed: data.len(),
            limit: self.capacity(),
        };
        let end = index.checked_add(data.len()).ok_or(overflow.clone())?;
        if end > self.capacity() {
            self.grow_to(end).map_err(|_| overflow)?;
        }
        self.storage.bytes_mut()[index..end].copy_from_slice(data);
        Ok(())
    }

    /// Move bytes `[start, end)` by `delta` positions in place.
    ///
    /// Bytes outside the source and destination ranges are untouched; bytes
    /// uncovered by the move keep their old contents. The cursor does not move.
    pub fn shift(&mut self, start: usize, end: usize, delta: isize) -> BufferResult<()> {
        let invalid = BufferError::InvalidShift { start, end, delta };
        if start > end || end > self.capacity() {
            return Err(invalid);
        }
        let dest_start = start.checked_add_signed(delta).ok_or(invalid.clone())?;
        let dest_end = dest_start.checked_add(end - start).ok_or(invalid.clone())?;
        if dest_end > self.capacity() {
            self.grow_to(dest_end).map_err(|_| invalid)?;
        }
        self.storage
            .bytes_mut()
            .copy_within(start..end, dest_start);
        Ok(())
    }
}
