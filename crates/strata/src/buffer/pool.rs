// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared pool of fixed-size buffer segments.
//!
//! Free segments live in a lock-free `ArrayQueue`; a borrowed segment has
//! exactly one owner until its [`PooledSegment`] is dropped, which returns it.
//! Released segments are not zeroed.
//!
//! # Exhaustion
//!
//! What happens when no segment is free is explicit per pool:
//!
//! - [`PoolExhaustion::Fail`]: `acquire` returns `BufferError::PoolExhausted`
//! - [`PoolExhaustion::Allocate`]: a fresh segment is allocated; on release it
//!   joins the free list only if there is room, otherwise it is freed
//! - [`PoolExhaustion::Block`]: the caller parks until a segment is released

use super::{Buffer, BufferError, BufferResult, PooledBuffer, Storage};
use crossbeam::queue::ArrayQueue;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;

/// Behavior of [`BufferPool::acquire`] when every segment is borrowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(rename_all = "snake_case"))]
pub enum PoolExhaustion {
    Fail,
    #[default]
    Allocate,
    Block,
}

/// Pool sizing and exhaustion policy.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(default))]
pub struct PoolConfig {
    /// Bytes per segment.
    pub segment_size: usize,
    /// Segments allocated up front.
    pub segments: usize,
    pub exhaustion: PoolExhaustion,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            segment_size: 64 * 1024,
            segments: 16,
            exhaustion: PoolExhaustion::Allocate,
        }
    }
}

impl PoolConfig {
    pub fn with_segment_size(mut self, segment_size: usize) -> Self {
        self.segment_size = segment_size;
        self
    }

    pub fn with_segments(mut self, segments: usize) -> Self {
        self.segments = segments;
        self
    }

    pub fn with_exhaustion(mut self, exhaustion: PoolExhaustion) -> Self {
        self.exhaustion = exhaustion;
        self
    }
}

struct PoolShared {
    free: ArrayQueue<Box<[u8]>>,
    segment_size: usize,
    exhaustion: PoolExhaustion,
    /// Guards the condvar; blocked acquirers wait here.
    waiters: Mutex<usize>,
    released: Condvar,
}

impl PoolShared {
    fn release(&self, segment: Box<[u8]>) {
        if self.free.push(segment).is_err() {
            // Overflow-allocated segment with no free slot left; drop it.
            return;
        }
        let waiters = self.waiters.lock();
        if *waiters > 0 {
            self.released.notify_one();
        }
    }
}

/// Thread-safe pool of fixed-size segments. Cloning shares the pool.
#[derive(Clone)]
pub struct BufferPool {
    shared: Arc<PoolShared>,
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("segment_size", &self.shared.segment_size)
            .field("available", &self.shared.free.len())
            .field("exhaustion", &self.shared.exhaustion)
            .finish()
    }
}

impl BufferPool {
    pub fn new(config: PoolConfig) -> Self {
        let slots = config.segments.max(1);
        let free = ArrayQueue::new(slots);
        for _ in 0..config.segments {
            let _ = free.push(vec![0u8; config.segment_size].into_boxed_slice());
        }
        Self {
            shared: Arc::new(PoolShared {
                free,
                segment_size: config.segment_size,
                exhaustion: config.exhaustion,
                waiters: Mutex::new(0),
                released: Condvar::new(),
            }),
        }
    }

    pub fn segment_size(&self) -> usize {
        self.shared.segment_size
    }

    /// Segments currently free.
    pub fn available(&self) -> usize {
        self.shared.free.len()
    }

    /// Borrow a free segment without applying the exhaustion policy.
    pub fn try_acquire(&self) -> Option<PooledBuffer> {
        self.shared
            .free
            .pop()
            .map(|segment| self.wrap(segment))
    }

    /// Borrow a segment, applying the pool's exhaustion policy.
    pub fn acquire(&self) -> BufferResult<PooledBuffer> {
        if let Some(buffer) = self.try_acquire() {
            return Ok(buffer);
        }
        match self.shared.exhaustion {
            PoolExhaustion::Fail => {
                log::debug!("[POOL] exhausted, failing acquire");
                Err(BufferError::PoolExhausted)
            }
            PoolExhaustion::Allocate => {
                log::debug!(
                    "[POOL] exhausted, allocating overflow segment of {} bytes",
                    self.shared.segment_size
                );
                let segment = vec![0u8; self.shared.segment_size].into_boxed_slice();
                Ok(self.wrap(segment))
            }
            PoolExhaustion::Block => Ok(self.acquire_blocking()),
        }
    }

    fn acquire_blocking(&self) -> PooledBuffer {
        loop {
            if let Some(buffer) = self.try_acquire() {
                return buffer;
            }
            let mut waiters = self.shared.waiters.lock();
            *waiters += 1;
            while self.shared.free.is_empty() {
                self.shared.released.wait(&mut waiters);
            }
            *waiters -= 1;
        }
    }

    fn wrap(&self, segment: Box<[u8]>) -> PooledBuffer {
        Buffer::from_storage(PooledSegment {
            data: Some(segment),
            shared: Arc::clone(&self.shared),
        })
    }
}

/// A segment on loan from a [`BufferPool`]; returned on drop.
pub struct PooledSegment {
    data: Option<Box<[u8]>>,
    shared: Arc<PoolShared>,
}

impl fmt::Debug for PooledSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledSegment")
            .field("len", &self.bytes().len())
            .finish()
    }
}

impl Storage for PooledSegment {
    fn bytes(&self) -> &[u8] {
        match &self.data {
            Some(data) => &data[..],
            None => &[],
        }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        match &mut self.data {
            Some(data) => &mut data[..],
            None => &mut [],
        }
    }
}

impl Drop for PooledSegment {
    fn drop(&mut self) {
        if let Some(segment) = self.data.take() {
            self.shared.release(segment);
        }
    }
}
