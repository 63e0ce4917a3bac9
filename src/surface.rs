use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use glam::Mat4;
use log::{trace, warn};
use parking_lot::Mutex;

use crate::buffers::PointCloudBuffers;
use crate::color::Color;

/// Which of the two particle fields a cloud belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Galaxy,
    Stars,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Galaxy => f.write_str("galaxy"),
            Self::Stars => f.write_str("stars"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blending {
    Normal,
    Additive,
}

/// Material settings that accompany a published buffer pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointStyle {
    pub size: f32,
    pub size_attenuation: bool,
    pub depth_write: bool,
    pub blending: Blending,
    /// Use the per-point colour buffer instead of `color`.
    pub vertex_colors: bool,
    pub color: Color,
}

impl PointStyle {
    /// Additive, depth-unaware points sized in world units.
    pub fn additive(size: f32) -> Self {
        Self {
            size,
            size_attenuation: true,
            depth_write: false,
            blending: Blending::Additive,
            vertex_colors: true,
            color: Color::WHITE,
        }
    }

    pub fn uniform(size: f32, color: Color) -> Self {
        Self {
            vertex_colors: false,
            color,
            ..Self::additive(size)
        }
    }
}

/// A generated field ready to be shown.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    pub kind: FieldKind,
    pub buffers: PointCloudBuffers,
    pub style: PointStyle,
}

/// Opaque identifier a surface hands out for each published cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(u64);

impl SurfaceHandle {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Consumer of generated point clouds, typically a renderer's scene.
pub trait DisplaySurface {
    /// Uploads `cloud` and starts drawing it every frame.
    fn publish(&mut self, cloud: &PointCloud) -> SurfaceHandle;

    /// Stops drawing the cloud and frees whatever storage backs it.
    fn release(&mut self, handle: SurfaceHandle);

    /// Sets the model transform used for the next frame.
    fn present(&mut self, _handle: SurfaceHandle, _transform: Mat4) {}
}

impl<T> DisplaySurface for Box<T>
where
    T: DisplaySurface + ?Sized,
{
    fn publish(&mut self, cloud: &PointCloud) -> SurfaceHandle {
        (**self).publish(cloud)
    }

    fn release(&mut self, handle: SurfaceHandle) {
        (**self).release(handle)
    }

    fn present(&mut self, handle: SurfaceHandle, transform: Mat4) {
        (**self).present(handle, transform)
    }
}

/// Summary of a cloud held by a [`RecordingSurface`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveCloud {
    pub kind: FieldKind,
    pub points: usize,
    pub style: PointStyle,
    pub transform: Mat4,
}

#[derive(Debug, Default)]
struct SurfaceLog {
    next_id: u64,
    publishes: usize,
    releases: usize,
    invalid_releases: usize,
    presents: usize,
    live: HashMap<SurfaceHandle, LiveCloud>,
}

/// Headless surface that keeps a ledger of publish and release calls.
///
/// Clones share the same ledger, so a copy kept by the caller can inspect a
/// surface that has been moved into a controller.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    log: Arc<Mutex<SurfaceLog>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish_count(&self) -> usize {
        self.log.lock().publishes
    }

    pub fn release_count(&self) -> usize {
        self.log.lock().releases
    }

    /// Releases of handles that were never published or already released.
    pub fn invalid_release_count(&self) -> usize {
        self.log.lock().invalid_releases
    }

    pub fn present_count(&self) -> usize {
        self.log.lock().presents
    }

    pub fn live_count(&self) -> usize {
        self.log.lock().live.len()
    }

    /// Live clouds of the given kind.
    pub fn live(&self, kind: FieldKind) -> Vec<(SurfaceHandle, LiveCloud)> {
        let mut clouds: Vec<_> = self
            .log
            .lock()
            .live
            .iter()
            .filter(|(_, cloud)| cloud.kind == kind)
            .map(|(handle, cloud)| (*handle, *cloud))
            .collect();
        clouds.sort_by_key(|(handle, _)| handle.id());
        clouds
    }

    pub fn get(&self, handle: SurfaceHandle) -> Option<LiveCloud> {
        self.log.lock().live.get(&handle).copied()
    }
}

impl DisplaySurface for RecordingSurface {
    fn publish(&mut self, cloud: &PointCloud) -> SurfaceHandle {
        let mut log = self.log.lock();
        log.next_id += 1;
        log.publishes += 1;
        let handle = SurfaceHandle::new(log.next_id);
        log.live.insert(
            handle,
            LiveCloud {
                kind: cloud.kind,
                points: cloud.buffers.len(),
                style: cloud.style,
                transform: Mat4::IDENTITY,
            },
        );
        trace!(
            "published {} cloud #{} ({} points)",
            cloud.kind,
            handle.id(),
            cloud.buffers.len()
        );
        handle
    }

    fn release(&mut self, handle: SurfaceHandle) {
        let mut log = self.log.lock();
        log.releases += 1;
        if log.live.remove(&handle).is_none() {
            warn!("release of unknown cloud #{}", handle.id());
            log.invalid_releases += 1;
        }
    }

    fn present(&mut self, handle: SurfaceHandle, transform: Mat4) {
        let mut log = self.log.lock();
        log.presents += 1;
        if let Some(cloud) = log.live.get_mut(&handle) {
            cloud.transform = transform;
        }
    }
}
