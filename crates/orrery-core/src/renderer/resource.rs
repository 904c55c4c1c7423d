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

//! Single-owner slots for GPU object handles.
//!
//! A [`ResourceSlot`] holds at most one live handle. Rebuilding a program or
//! re-uploading a texture goes through [`ResourceSlot::replace`], which installs
//! the new handle before releasing the old one, so a slot never observes a
//! released handle and a failed rebuild (which never reaches `replace`) leaves
//! the previous object in place.

use crate::renderer::{
    api::{ProgramId, TextureId},
    error::ResourceError,
    traits::{GlDevice, GpuResource},
};

/// Owns at most one GPU object handle.
///
/// Slots are move-only. Dropping a slot that still holds a handle cannot
/// release it (no device is available in `Drop`), so it is reported as a leak.
#[derive(Debug)]
pub struct ResourceSlot<H: GpuResource> {
    handle: Option<H>,
    label: &'static str,
}

/// A slot holding a linked (or compiled) program.
pub type ProgramSlot = ResourceSlot<ProgramId>;

/// A slot holding an uploaded texture.
pub type TextureSlot = ResourceSlot<TextureId>;

impl<H: GpuResource> ResourceSlot<H> {
    /// Creates an empty slot. `label` only appears in log messages.
    pub const fn new(label: &'static str) -> Self {
        Self {
            handle: None,
            label,
        }
    }

    /// The current handle, if any.
    pub fn get(&self) -> Option<H> {
        self.handle
    }

    /// Whether the slot currently holds a handle.
    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    /// The slot's label.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Installs `handle`, then releases the previous one.
    ///
    /// A failure to release the previous handle is logged; the new handle is
    /// installed regardless.
    pub fn replace(&mut self, device: &dyn GlDevice, handle: H) {
        if let Some(previous) = self.handle.replace(handle) {
            if let Err(e) = previous.release(device) {
                log::warn!(
                    "ResourceSlot({}): Failed to release replaced handle {:?}: {}",
                    self.label,
                    previous,
                    e
                );
            }
        }
    }

    /// Releases the held handle, leaving the slot empty.
    ///
    /// # Errors
    ///
    /// Returns the device error if the release fails; the slot is empty either way.
    pub fn destroy(&mut self, device: &dyn GlDevice) -> Result<(), ResourceError> {
        match self.handle.take() {
            Some(handle) => handle.release(device),
            None => Ok(()),
        }
    }

    /// Removes the handle without releasing it; the caller becomes its owner.
    pub fn take(&mut self) -> Option<H> {
        self.handle.take()
    }
}

impl<H: GpuResource> Drop for ResourceSlot<H> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle {
            log::warn!(
                "ResourceSlot({}): Dropped while holding {:?}; the GPU object leaks",
                self.label,
                handle
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCall, MockGlDevice};

    #[test]
    fn replace_releases_previous_after_install() {
        let device = MockGlDevice::new();
        let mut slot = ProgramSlot::new("test");
        assert!(!slot.is_valid());

        slot.replace(&device, ProgramId(1));
        slot.replace(&device, ProgramId(2));

        assert_eq!(slot.get(), Some(ProgramId(2)));
        assert_eq!(device.calls(), vec![MockCall::DestroyProgram(ProgramId(1))]);
        slot.destroy(&device).unwrap();
    }

    #[test]
    fn destroy_empties_slot() {
        let device = MockGlDevice::new();
        let mut slot = TextureSlot::new("test");
        slot.replace(&device, TextureId(7));

        slot.destroy(&device).unwrap();

        assert!(!slot.is_valid());
        assert_eq!(device.calls(), vec![MockCall::DestroyTexture(TextureId(7))]);
        // A second destroy is a no-op.
        slot.destroy(&device).unwrap();
        assert_eq!(device.calls().len(), 1);
    }

    #[test]
    fn take_transfers_ownership_without_release() {
        let device = MockGlDevice::new();
        let mut slot = TextureSlot::new("test");
        slot.replace(&device, TextureId(3));

        assert_eq!(slot.take(), Some(TextureId(3)));
        assert!(device.calls().is_empty());
        assert!(!slot.is_valid());
    }
}
