use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use thiserror::Error as ThisError;
use winit::window::Window;

use crate::app::{PlayerView, Simulation};

use super::canvas::{Canvas, Sprite};
use super::compositor::{compose_frame, StructureArt};
use super::transform::{TileCoord, ViewportConfig};

#[derive(Debug, ThisError)]
pub enum AssetError {
    #[error("failed to open sprite {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode sprite {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("sprite {path} has zero width or height")]
    Empty { path: PathBuf },
}

pub fn load_sprite(path: &Path) -> Result<Sprite, AssetError> {
    let reader = ImageReader::open(path).map_err(|source| AssetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader.decode().map_err(|source| AssetError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let image = decoded.to_rgba8();
    Sprite::from_rgba(image.width(), image.height(), image.into_raw()).ok_or_else(|| {
        AssetError::Empty {
            path: path.to_path_buf(),
        }
    })
}

/// Panel and tile sizes that stay fixed while the window is resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelLayout {
    pub side_panel_width: u32,
    pub bottom_panel_height: u32,
    pub tile_size: u32,
}

impl PanelLayout {
    pub fn viewport_config(&self, window_width: u32, window_height: u32) -> ViewportConfig {
        ViewportConfig::from_window(
            window_width,
            window_height,
            self.side_panel_width,
            self.bottom_panel_height,
            self.tile_size,
        )
    }
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    layout: PanelLayout,
    config: ViewportConfig,
    frame_size: (u32, u32),
    pending_size: Option<(u32, u32)>,
    art: StructureArt,
}

impl Renderer {
    pub fn new(window: Arc<Window>, layout: PanelLayout, art: StructureArt) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            layout,
            config: layout.viewport_config(size.width, size.height),
            frame_size: (size.width, size.height),
            pending_size: None,
            art,
        })
    }

    pub fn viewport_config(&self) -> &ViewportConfig {
        &self.config
    }

    /// Records a new window size. The surface is rebuilt before the next frame so a frame
    /// never mixes old and new dimensions.
    pub fn request_resize(&mut self, width: u32, height: u32) {
        self.pending_size = Some((width, height));
    }

    fn apply_pending_resize(&mut self) -> Result<(), Error> {
        let Some((width, height)) = self.pending_size.take() else {
            return Ok(());
        };
        if width == 0 || height == 0 {
            self.frame_size = (0, 0);
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.config = self.layout.viewport_config(width, height);
        self.frame_size = (width, height);
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    /// Draws and presents one frame. Returns the player view the camera was centered on, or
    /// `None` when the window is minimized.
    pub(crate) fn render(
        &mut self,
        simulation: &dyn Simulation,
        hover: Option<TileCoord>,
    ) -> Result<Option<PlayerView>, Error> {
        self.apply_pending_resize()?;
        let (width, height) = self.frame_size;
        if width == 0 || height == 0 {
            return Ok(None);
        }

        let mut canvas = Canvas::new(self.pixels.frame_mut(), width, height);
        let player = compose_frame(&mut canvas, simulation, &self.config, hover, &self.art);
        self.pixels.render()?;
        Ok(Some(player))
    }
}
