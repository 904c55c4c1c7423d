// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Append-only streaming buffer for per-draw uniform and storage data.
//!
//! The [`StreamingBuffer`] avoids both per-upload allocation and CPU/GPU
//! synchronization. Each upload writes one fixed-size chunk just past the
//! previous one through an unsynchronized mapping; once the next chunk would not
//! fit, the storage is orphaned (re-specified) and writing restarts at offset 0
//! in fresh memory, while in-flight draws keep reading the old allocation.
//!
//! # Architecture
//!
//! ```text
//! upload #1:  [c0|  |  | .. |  ]            offset 0
//! upload #2:  [c0|c1|  | .. |  ]            offset chunk
//! ...
//! upload #n:  [c0|c1|c2| .. |cn]  full  ->  orphan, new storage
//! upload #n+1:[c0|  |  | .. |  ]            offset 0 again
//! ```
//!
//! No region of one allocation is written twice, so no fence is needed.

use crate::renderer::{
    api::{BufferDescriptor, BufferId, BufferTarget, BufferUsage, DEFAULT_STREAM_CAPACITY},
    error::ResourceError,
    traits::GlDevice,
};
use std::borrow::Cow;

/// Minimum number of chunks one allocation must hold.
pub const MIN_CHUNKS_PER_STREAM: u64 = 8;

/// A fixed-capacity buffer object written one chunk at a time.
///
/// # Example
///
/// ```ignore
/// // During initialization:
/// let mut stream = StreamingBuffer::new(device, size_of::<Transform>() as u64, "Transforms")?;
///
/// // Per draw:
/// stream.upload(device, bytemuck::bytes_of(&transform))?;
/// stream.bind_range(device, BufferTarget::Uniform, 0)?;
/// ```
#[derive(Debug)]
pub struct StreamingBuffer {
    buffer: BufferId,
    capacity: u64,
    chunk_size: u64,
    /// Write cursor; the last chunk occupies `offset - chunk_size..offset`.
    offset: u64,
    orphan_count: u64,
    label: &'static str,
}

impl StreamingBuffer {
    /// Creates a streaming buffer with the default 1 MiB capacity.
    ///
    /// # Errors
    ///
    /// See [`with_capacity`](Self::with_capacity).
    pub fn new(
        device: &dyn GlDevice,
        chunk_size: u64,
        label: &'static str,
    ) -> Result<Self, ResourceError> {
        Self::with_capacity(device, chunk_size, DEFAULT_STREAM_CAPACITY, label)
    }

    /// Creates a streaming buffer and allocates its storage.
    ///
    /// # Arguments
    ///
    /// * `device` - The device to allocate the buffer object on.
    /// * `chunk_size` - The exact size of every upload, in bytes.
    /// * `capacity` - Size of one allocation, at least eight chunks.
    /// * `label` - A debug label for the buffer (e.g., "Transforms").
    ///
    /// # Errors
    ///
    /// [`ResourceError::ChunkTooLarge`] if `chunk_size` is zero or more than
    /// an eighth of `capacity`, or the device error if allocation fails.
    pub fn with_capacity(
        device: &dyn GlDevice,
        chunk_size: u64,
        capacity: u64,
        label: &'static str,
    ) -> Result<Self, ResourceError> {
        let fits = chunk_size
            .checked_mul(MIN_CHUNKS_PER_STREAM)
            .is_some_and(|needed| needed <= capacity);
        if chunk_size == 0 || !fits {
            return Err(ResourceError::ChunkTooLarge {
                chunk_size,
                capacity,
            });
        }

        let buffer = device.create_buffer(&BufferDescriptor {
            label: Some(Cow::Borrowed(label)),
            size: capacity,
            usage: BufferUsage::StreamDraw,
        })?;

        Ok(Self {
            buffer,
            capacity,
            chunk_size,
            offset: 0,
            orphan_count: 0,
            label,
        })
    }

    /// Writes one chunk and returns the byte offset it was written at.
    ///
    /// When the chunk does not fit after the cursor, the storage is orphaned
    /// first and the chunk lands at offset 0.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::ChunkSizeMismatch`] if `data` is not exactly one chunk.
    /// - [`ResourceError::BufferMapFailed`] if the driver refuses the mapping;
    ///   the cursor is left where it was, or at 0 if the storage was just
    ///   orphaned.
    pub fn upload(&mut self, device: &dyn GlDevice, data: &[u8]) -> Result<u64, ResourceError> {
        let size = data.len() as u64;
        if size != self.chunk_size {
            return Err(ResourceError::ChunkSizeMismatch {
                expected: self.chunk_size,
                found: size,
            });
        }

        if self.offset + self.chunk_size > self.capacity {
            device.reallocate_buffer(self.buffer, self.capacity, BufferUsage::StreamDraw)?;
            // Old chunks are gone with the old storage.
            self.offset = 0;
            self.orphan_count += 1;
            log::debug!(
                "StreamingBuffer({}): Orphaned storage (orphan #{})",
                self.label,
                self.orphan_count
            );
        }

        let offset = self.offset;
        device.write_buffer_unsynchronized(self.buffer, offset, data)?;
        self.offset = offset + self.chunk_size;
        Ok(offset)
    }

    /// Binds the most recently uploaded chunk to binding point `index`.
    ///
    /// # Errors
    ///
    /// [`ResourceError::NothingUploaded`] if no chunk has been written yet.
    pub fn bind_range(
        &self,
        device: &dyn GlDevice,
        target: BufferTarget,
        index: u32,
    ) -> Result<(), ResourceError> {
        let start = self
            .last_chunk_offset()
            .ok_or(ResourceError::NothingUploaded)?;
        device.bind_buffer_range(target, index, self.buffer, start, self.chunk_size)
    }

    /// Binds the whole buffer object to `target`.
    pub fn bind(&self, device: &dyn GlDevice, target: BufferTarget) -> Result<(), ResourceError> {
        device.bind_buffer(target, self.buffer)
    }

    /// Offset of the most recent chunk, if any.
    pub fn last_chunk_offset(&self) -> Option<u64> {
        self.offset.checked_sub(self.chunk_size)
    }

    /// The buffer object.
    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    /// The write cursor, in bytes.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Size of one allocation, in bytes.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Size of every upload, in bytes.
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// How many times the storage has been orphaned.
    pub fn orphan_count(&self) -> u64 {
        self.orphan_count
    }

    /// Destroys the buffer object.
    ///
    /// This must be called during shutdown to release GPU memory.
    pub fn destroy(self, device: &dyn GlDevice) {
        if let Err(e) = device.destroy_buffer(self.buffer) {
            log::warn!(
                "StreamingBuffer({}): Failed to destroy buffer: {:?}",
                self.label,
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCall, MockGlDevice};

    fn stream(device: &MockGlDevice, chunk: u64, capacity: u64) -> StreamingBuffer {
        StreamingBuffer::with_capacity(device, chunk, capacity, "Test").unwrap()
    }

    #[test]
    fn creation_allocates_full_capacity() {
        let device = MockGlDevice::new();
        let ring = StreamingBuffer::new(&device, 64, "Test").unwrap();

        assert_eq!(ring.capacity(), 1 << 20);
        assert_eq!(ring.offset(), 0);
        assert_eq!(
            device.calls(),
            vec![MockCall::CreateBuffer {
                id: ring.buffer(),
                size: 1 << 20,
                usage: BufferUsage::StreamDraw,
                data: None,
            }]
        );
        ring.destroy(&device);
    }

    #[test]
    fn rejects_chunks_above_an_eighth_of_capacity() {
        let device = MockGlDevice::new();
        assert!(matches!(
            StreamingBuffer::with_capacity(&device, 129, 1024, "Test"),
            Err(ResourceError::ChunkTooLarge {
                chunk_size: 129,
                capacity: 1024
            })
        ));
        assert!(StreamingBuffer::with_capacity(&device, 128, 1024, "Test").is_ok());
        assert!(StreamingBuffer::with_capacity(&device, 0, 1024, "Test").is_err());
        assert!(StreamingBuffer::with_capacity(&device, u64::MAX, 1024, "Test").is_err());
    }

    #[test]
    fn uploads_advance_by_one_chunk() {
        let device = MockGlDevice::new();
        let mut ring = stream(&device, 16, 256);

        assert_eq!(ring.upload(&device, &[1; 16]).unwrap(), 0);
        assert_eq!(ring.upload(&device, &[2; 16]).unwrap(), 16);
        assert_eq!(ring.upload(&device, &[3; 16]).unwrap(), 32);
        assert_eq!(ring.offset(), 48);
        assert_eq!(ring.orphan_count(), 0);
    }

    #[test]
    fn wrap_orphans_and_restarts_at_zero() {
        let device = MockGlDevice::new();
        let mut ring = stream(&device, 32, 256);

        let offsets: Vec<u64> = (0..10)
            .map(|i| ring.upload(&device, &[i as u8; 32]).unwrap())
            .collect();

        assert_eq!(offsets, vec![0, 32, 64, 96, 128, 160, 192, 224, 0, 32]);
        assert_eq!(ring.orphan_count(), 1);
        assert!(device.calls().contains(&MockCall::ReallocateBuffer {
            id: ring.buffer(),
            size: 256,
            usage: BufferUsage::StreamDraw,
        }));
    }

    #[test]
    fn capacity_not_a_multiple_of_chunk_wraps_early() {
        let device = MockGlDevice::new();
        let mut ring = stream(&device, 10, 85);

        for _ in 0..8 {
            ring.upload(&device, &[0; 10]).unwrap();
        }
        assert_eq!(ring.offset(), 80);
        assert_eq!(ring.upload(&device, &[0; 10]).unwrap(), 0);
        assert_eq!(ring.orphan_count(), 1);
    }

    #[test]
    fn wrong_size_upload_is_rejected() {
        let device = MockGlDevice::new();
        let mut ring = stream(&device, 16, 256);

        assert!(matches!(
            ring.upload(&device, &[0; 15]),
            Err(ResourceError::ChunkSizeMismatch {
                expected: 16,
                found: 15
            })
        ));
        assert_eq!(ring.offset(), 0);
    }

    #[test]
    fn refused_mapping_keeps_cursor() {
        let device = MockGlDevice::new();
        let mut ring = stream(&device, 16, 256);
        ring.upload(&device, &[0; 16]).unwrap();
        device.fail_map.set(true);

        assert!(matches!(
            ring.upload(&device, &[0; 16]),
            Err(ResourceError::BufferMapFailed)
        ));
        assert_eq!(ring.offset(), 16);
    }

    #[test]
    fn failed_write_after_orphan_leaves_nothing_to_bind() {
        let device = MockGlDevice::new();
        let mut ring = stream(&device, 16, 128);
        for _ in 0..8 {
            ring.upload(&device, &[0; 16]).unwrap();
        }
        device.fail_map.set(true);

        assert!(matches!(
            ring.upload(&device, &[0; 16]),
            Err(ResourceError::BufferMapFailed)
        ));
        assert_eq!(ring.orphan_count(), 1);
        assert_eq!(ring.offset(), 0);
        assert_eq!(ring.last_chunk_offset(), None);
        assert!(matches!(
            ring.bind_range(&device, BufferTarget::Uniform, 0),
            Err(ResourceError::NothingUploaded)
        ));

        device.fail_map.set(false);
        assert_eq!(ring.upload(&device, &[1; 16]).unwrap(), 0);
        assert_eq!(ring.orphan_count(), 1);
    }

    #[test]
    fn bind_range_targets_last_chunk() {
        let device = MockGlDevice::new();
        let mut ring = stream(&device, 16, 256);
        ring.upload(&device, &[0; 16]).unwrap();
        ring.upload(&device, &[0; 16]).unwrap();
        device.clear_calls();

        ring.bind_range(&device, BufferTarget::Uniform, 3).unwrap();

        assert_eq!(
            device.calls(),
            vec![MockCall::BindBufferRange {
                target: BufferTarget::Uniform,
                index: 3,
                id: ring.buffer(),
                offset: 16,
                size: 16,
            }]
        );
    }

    #[test]
    fn bind_range_before_upload_fails() {
        let device = MockGlDevice::new();
        let ring = stream(&device, 16, 256);
        assert!(matches!(
            ring.bind_range(&device, BufferTarget::ShaderStorage, 0),
            Err(ResourceError::NothingUploaded)
        ));
    }

    #[test]
    fn destroy_releases_buffer() {
        let device = MockGlDevice::new();
        let ring = stream(&device, 16, 256);
        let id = ring.buffer();

        ring.destroy(&device);

        assert_eq!(device.calls().last(), Some(&MockCall::DestroyBuffer(id)));
    }
}
