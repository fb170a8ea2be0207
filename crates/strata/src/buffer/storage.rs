// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Backing storage strategies for [`Buffer`](super::Buffer).

use super::{BufferError, BufferResult};

/// Backing bytes of a buffer.
///
/// The visible length of `bytes()` is the buffer capacity.
pub trait Storage {
    fn bytes(&self) -> &[u8];

    fn bytes_mut(&mut self) -> &mut [u8];

    /// Grow to at least `min_capacity` bytes, preserving existing contents.
    ///
    /// Fixed storage refuses.
    fn grow(&mut self, min_capacity: usize) -> BufferResult<()> {
        Err(BufferError::CapacityExceeded {
            requested: min_capacity,
            max: self.bytes().len(),
        })
    }
}

impl Storage for &mut [u8] {
    fn bytes(&self) -> &[u8] {
        self
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        self
    }
}

impl Storage for Box<[u8]> {
    fn bytes(&self) -> &[u8] {
        self
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        self
    }
}

const MIN_GROWABLE_CAPACITY: usize = 16;
const MAX_ALLOCATION: usize = isize::MAX as usize;

/// Reallocating storage.
///
/// Capacity doubles (or jumps to the exact requirement when doubling is not
/// enough) up to an optional ceiling.
#[derive(Debug, Clone)]
pub struct Growable {
    data: Vec<u8>,
    max_capacity: Option<usize>,
}

impl Growable {
    pub fn new(initial_capacity: usize, max_capacity: Option<usize>) -> Self {
        Self {
            data: vec![0u8; initial_capacity],
            max_capacity,
        }
    }

    pub fn max_capacity(&self) -> Option<usize> {
        self.max_capacity
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl Storage for Growable {
    fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn grow(&mut self, min_capacity: usize) -> BufferResult<()> {
        let current = self.data.len();
        if min_capacity <= current {
            return Ok(());
        }
        // A Vec never holds more than isize::MAX bytes.
        let max = self
            .max_capacity
            .map_or(MAX_ALLOCATION, |max| max.min(MAX_ALLOCATION));
        let exceeded = BufferError::CapacityExceeded {
            requested: min_capacity,
            max,
        };
        if min_capacity > max {
            return Err(exceeded);
        }
        let doubled = current.saturating_mul(2).max(MIN_GROWABLE_CAPACITY);
        let new_capacity = doubled.max(min_capacity).min(max);
        log::trace!(
            "[BUFFER] growing storage {} -> {} bytes",
            current,
            new_capacity
        );
        if self.data.try_reserve_exact(new_capacity - current).is_err() {
            log::warn!("[BUFFER] allocation of {} bytes failed", new_capacity);
            return Err(exceeded);
        }
        self.data.resize(new_capacity, 0);
        Ok(())
    }
}
