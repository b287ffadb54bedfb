use anyhow::{Context, Result};

use crate::coords::Extent;
use crate::device::{GpuContext, GpuInit};
use crate::raster::RasterCanvas;

use super::{Container, ElementId, NativeContext, SurfaceHandle, SurfaceKind};

/// Surface acquisition policy.
#[derive(Debug, Clone)]
pub struct SurfaceOptions {
    /// When false, GPU acquisition fails immediately (no adapter lookup).
    pub allow_gpu: bool,

    /// Parameters for GPU contexts.
    pub gpu: GpuInit,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            allow_gpu: true,
            gpu: GpuInit::default(),
        }
    }
}

/// Creates, resizes and releases [`SurfaceHandle`]s.
#[derive(Debug, Clone, Default)]
pub struct SurfaceLifecycle {
    options: SurfaceOptions,
}

impl SurfaceLifecycle {
    pub fn new(options: SurfaceOptions) -> Self {
        Self { options }
    }

    #[inline]
    pub fn options(&self) -> &SurfaceOptions {
        &self.options
    }

    /// Creates one native context sized to the container's content box and
    /// attaches its element to the container.
    ///
    /// Nothing is attached when context creation fails.
    pub fn acquire<C>(&self, container: &mut C, kind: SurfaceKind) -> Result<SurfaceHandle>
    where
        C: Container + ?Sized,
    {
        let size = container.content_size();

        let context = match kind {
            SurfaceKind::Raster => NativeContext::Raster(
                RasterCanvas::new(size).context("failed to create raster surface")?,
            ),
            SurfaceKind::Gpu => {
                if !self.options.allow_gpu {
                    anyhow::bail!("GPU surfaces are disabled");
                }
                let target = container.gpu_target();
                let gpu = pollster::block_on(GpuContext::new(target, size, &self.options.gpu))
                    .context("failed to create GPU surface")?;
                NativeContext::Gpu(gpu)
            }
        };

        let element = ElementId::next();
        container.append_child(element);
        log::debug!(
            "surface {:?} acquired: {:?} {}x{}",
            element,
            kind,
            size.width,
            size.height
        );

        Ok(SurfaceHandle {
            element,
            kind,
            size,
            context: Some(context),
        })
    }

    /// Synchronizes the native context with a new container size.
    ///
    /// A no-op on a released handle.
    pub fn resize(&self, handle: &mut SurfaceHandle, width: u32, height: u32) -> Result<()> {
        let size = Extent::new(width, height);
        let Some(context) = handle.context.as_mut() else {
            return Ok(());
        };

        match context {
            NativeContext::Raster(canvas) => canvas.resize(size)?,
            NativeContext::Gpu(gpu) => gpu.resize(size),
        }
        handle.size = size;
        Ok(())
    }

    /// Drops the native context and detaches the element.
    ///
    /// Idempotent. The context is dropped even when detaching fails.
    pub fn release<C>(&self, container: &mut C, handle: &mut SurfaceHandle) -> Result<()>
    where
        C: Container + ?Sized,
    {
        let Some(context) = handle.context.take() else {
            return Ok(());
        };
        drop(context);

        if !container.remove_child(handle.element) {
            anyhow::bail!("surface {:?} was not attached to its container", handle.element);
        }
        log::debug!("surface {:?} released", handle.element);
        Ok(())
    }
}
