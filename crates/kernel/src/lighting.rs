//! The scene's light list and the flat buffer the renderer uploads.
//!
//! # Invariants
//! - `len() <= MAX_LIGHTS`; adds beyond the cap are rejected.
//! - The mirror buffer is rewritten by every mutation, so it never lags
//!   the list.

use bytemuck::{Pod, Zeroable};
use cellops_common::Light;
use glam::Vec3;

pub const MAX_LIGHTS: usize = 8;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LightError {
    #[error("light list is full ({max} lights)")]
    CapacityExceeded { max: usize },
    #[error("light index {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    pub position: [f32; 3],
    pub attenuation: f32,
    pub color: [f32; 3],
    pub _pad: f32,
}

/// Uniform-buffer layout: ambient color, active light count, then a fixed
/// array of lights. Entries past `num_lights` are zeroed.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LightingBuffer {
    pub ambient: [f32; 3],
    pub num_lights: u32,
    pub lights: [GpuLight; MAX_LIGHTS],
}

impl Default for LightingBuffer {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl LightingBuffer {
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// The first `num_lights` entries, never more than [`MAX_LIGHTS`].
    pub fn active(&self) -> &[GpuLight] {
        let count = (self.num_lights as usize).min(MAX_LIGHTS);
        &self.lights[..count]
    }
}

#[derive(Debug, Clone, Default)]
pub struct LightList {
    lights: Vec<Light>,
    ambient: Vec3,
    buffer: LightingBuffer,
}

impl LightList {
    pub fn new(ambient: Vec3) -> Self {
        let mut list = Self {
            ambient,
            ..Self::default()
        };
        list.refresh();
        list
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Light> {
        self.lights.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Light> {
        self.lights.iter()
    }

    pub fn ambient(&self) -> Vec3 {
        self.ambient
    }

    pub fn set_ambient(&mut self, ambient: Vec3) {
        self.ambient = ambient;
        self.refresh();
    }

    pub fn add(&mut self, light: Light) -> Result<usize, LightError> {
        if self.lights.len() >= MAX_LIGHTS {
            return Err(LightError::CapacityExceeded { max: MAX_LIGHTS });
        }
        self.lights.push(light);
        self.refresh();
        Ok(self.lights.len() - 1)
    }

    pub fn set(&mut self, index: usize, light: Light) -> Result<(), LightError> {
        let len = self.lights.len();
        let slot = self
            .lights
            .get_mut(index)
            .ok_or(LightError::OutOfRange { index, len })?;
        *slot = light;
        self.refresh();
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Light, LightError> {
        if index >= self.lights.len() {
            return Err(LightError::OutOfRange {
                index,
                len: self.lights.len(),
            });
        }
        let light = self.lights.remove(index);
        self.refresh();
        Ok(light)
    }

    pub fn clear(&mut self) {
        self.lights.clear();
        self.refresh();
    }

    pub fn buffer(&self) -> &LightingBuffer {
        &self.buffer
    }

    /// Rewrite the whole mirror from the list.
    pub fn refresh(&mut self) {
        let mut buffer = LightingBuffer::zeroed();
        buffer.ambient = self.ambient.to_array();
        buffer.num_lights = self.lights.len() as u32;
        for (slot, light) in buffer.lights.iter_mut().zip(&self.lights) {
            *slot = GpuLight {
                position: light.position.to_array(),
                attenuation: light.attenuation(),
                color: light.color.to_array(),
                _pad: 0.0,
            };
        }
        self.buffer = buffer;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light(x: f32) -> Light {
        Light {
            position: Vec3::new(x, 0.0, 0.0),
            color: Vec3::ONE,
            range: 100.0,
        }
    }

    #[test]
    fn add_mirrors_into_buffer() {
        let mut list = LightList::new(Vec3::splat(0.1));
        list.add(light(1.0)).unwrap();
        list.add(light(2.0)).unwrap();

        let buf = list.buffer();
        assert_eq!(buf.num_lights, 2);
        assert_eq!(buf.ambient, [0.1, 0.1, 0.1]);
        assert_eq!(buf.lights[1].position, [2.0, 0.0, 0.0]);
        assert!((buf.lights[0].attenuation - 1.0 / 101.0).abs() < 1e-7);
        assert_eq!(buf.lights[2], GpuLight::default());
    }

    #[test]
    fn cap_is_enforced_without_touching_mirror() {
        let mut list = LightList::new(Vec3::ZERO);
        for i in 0..MAX_LIGHTS {
            list.add(light(i as f32)).unwrap();
        }
        let before = *list.buffer();
        assert_eq!(
            list.add(light(99.0)),
            Err(LightError::CapacityExceeded { max: MAX_LIGHTS })
        );
        assert_eq!(list.len(), MAX_LIGHTS);
        assert_eq!(*list.buffer(), before);
    }

    #[test]
    fn edits_and_removals_refresh() {
        let mut list = LightList::new(Vec3::ZERO);
        list.add(light(1.0)).unwrap();
        list.add(light(2.0)).unwrap();
        list.set(0, light(5.0)).unwrap();
        assert_eq!(list.buffer().lights[0].position, [5.0, 0.0, 0.0]);

        list.remove(0).unwrap();
        assert_eq!(list.buffer().num_lights, 1);
        assert_eq!(list.buffer().lights[0].position, [2.0, 0.0, 0.0]);
        assert_eq!(list.buffer().lights[1], GpuLight::default());

        assert_eq!(
            list.set(3, light(0.0)),
            Err(LightError::OutOfRange { index: 3, len: 1 })
        );
    }

    #[test]
    fn active_slice_follows_count_and_cap() {
        let mut list = LightList::new(Vec3::ZERO);
        list.add(light(1.0)).unwrap();
        assert_eq!(list.buffer().active().len(), 1);
        assert_eq!(list.buffer().active()[0].position, [1.0, 0.0, 0.0]);

        let mut forged = *list.buffer();
        forged.num_lights = u32::MAX;
        assert_eq!(forged.active().len(), MAX_LIGHTS);
    }

    #[test]
    fn buffer_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<GpuLight>(), 32);
        assert_eq!(
            LightList::new(Vec3::ZERO).buffer().as_bytes().len(),
            16 + 32 * MAX_LIGHTS
        );
    }
}
