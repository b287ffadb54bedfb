use crate::coords::Extent;
use crate::device::GpuContext;
use crate::raster::RasterCanvas;

use super::ElementId;

/// Which kind of native context a backend draws with.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SurfaceKind {
    Gpu,
    Raster,
}

/// The native drawing context owned by a surface.
#[derive(Debug)]
pub enum NativeContext {
    Gpu(GpuContext),
    Raster(RasterCanvas),
}

impl NativeContext {
    pub fn kind(&self) -> SurfaceKind {
        match self {
            NativeContext::Gpu(_) => SurfaceKind::Gpu,
            NativeContext::Raster(_) => SurfaceKind::Raster,
        }
    }
}

/// One drawing context plus the element it is attached as.
///
/// Not `Clone`: exactly one handle exists per acquired surface. After
/// release the context is gone and every accessor returns `None`.
#[derive(Debug)]
pub struct SurfaceHandle {
    pub(crate) element: ElementId,
    pub(crate) kind: SurfaceKind,
    pub(crate) size: Extent,
    pub(crate) context: Option<NativeContext>,
}

impl SurfaceHandle {
    #[inline]
    pub fn element(&self) -> ElementId {
        self.element
    }

    #[inline]
    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    /// Drawable size in physical pixels, as last synchronized.
    #[inline]
    pub fn size(&self) -> Extent {
        self.size
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.context.is_none()
    }

    pub fn context(&self) -> Option<&NativeContext> {
        self.context.as_ref()
    }

    pub fn raster(&self) -> Option<&RasterCanvas> {
        match self.context.as_ref()? {
            NativeContext::Raster(canvas) => Some(canvas),
            NativeContext::Gpu(_) => None,
        }
    }

    pub fn raster_mut(&mut self) -> Option<&mut RasterCanvas> {
        match self.context.as_mut()? {
            NativeContext::Raster(canvas) => Some(canvas),
            NativeContext::Gpu(_) => None,
        }
    }

    pub fn gpu(&self) -> Option<&GpuContext> {
        match self.context.as_ref()? {
            NativeContext::Gpu(gpu) => Some(gpu),
            NativeContext::Raster(_) => None,
        }
    }

    pub fn gpu_mut(&mut self) -> Option<&mut GpuContext> {
        match self.context.as_mut()? {
            NativeContext::Gpu(gpu) => Some(gpu),
            NativeContext::Raster(_) => None,
        }
    }

    /// Copies the current frame out as tightly packed RGBA8.
    ///
    /// Raster surfaces hand out their premultiplied pixmap bytes; GPU
    /// surfaces read back their offscreen texture.
    pub fn snapshot_rgba(&self) -> anyhow::Result<Vec<u8>> {
        match self.context.as_ref() {
            Some(NativeContext::Raster(canvas)) => Ok(canvas.pixmap().data().to_vec()),
            Some(NativeContext::Gpu(gpu)) => gpu.read_pixels(),
            None => anyhow::bail!("surface has been released"),
        }
    }
}
