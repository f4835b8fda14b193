use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::camera::{color_from_hex, Camera, IgnoreTarget};
use crate::app::display::{DisplayKind, DisplayObject, GraphicsCommand};
use crate::app::font::{measure_lines, wrap_lines};
use crate::app::scene::SceneMachine;
use crate::app::world::{Entity, RenderableKind, SceneWorld, Vec2};
use crate::assets::{AssetKind, AssetRegistry};

use super::raster::{sheet_frame_region, LoadedSprite, Raster, SpriteRegion};
use super::{Viewport, PLACEHOLDER_HALF_SIZE_PX};

const CLEAR_COLOR: [u8; 4] = [20, 22, 28, 255];
const MISSING_SPRITE_COLOR: [u8; 4] = [220, 220, 240, 255];

pub struct Renderer {
    pixels: Pixels<'static>,
    viewport: Viewport,
    asset_root: PathBuf,
    sprite_cache: SpriteCache,
}

impl Renderer {
    /// The frame buffer keeps the game's logical size; window resizes only
    /// rescale the surface it is presented on.
    pub fn new(
        window: Arc<Window>,
        asset_root: PathBuf,
        buffer_width: u32,
        buffer_height: u32,
    ) -> Result<Self, Error> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width.max(1), size.height.max(1), window);
        let pixels = Pixels::new(buffer_width.max(1), buffer_height.max(1), surface)?;
        Ok(Self {
            pixels,
            viewport: Viewport {
                width: buffer_width.max(1),
                height: buffer_height.max(1),
            },
            asset_root,
            sprite_cache: SpriteCache::default(),
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels.resize_surface(width, height)?;
        Ok(())
    }

    /// Maps a physical window position onto the frame buffer, `None` when it
    /// falls in the letterbox.
    pub fn window_to_buffer(&self, x: f32, y: f32) -> Option<Vec2> {
        self.pixels
            .window_pos_to_pixel((x, y))
            .ok()
            .map(|(px, py)| Vec2::new(px as f32, py as f32))
    }

    /// Draws every running scene through each of its cameras, in scene
    /// registration order, then presents the frame.
    pub fn render(&mut self, scenes: &SceneMachine) -> Result<(), Error> {
        let Viewport { width, height } = self.viewport;
        let frame = self.pixels.frame_mut();
        for pixel in frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&CLEAR_COLOR);
        }

        let mut painter = Painter {
            assets: scenes.assets(),
            asset_root: &self.asset_root,
            cache: &mut self.sprite_cache,
        };
        for (_, world) in scenes.rendered_worlds() {
            for camera in world.cameras().iter() {
                let mut raster = Raster::new(frame, width, height)
                    .with_clip(camera.viewport)
                    .with_mask(camera.mask());
                painter.draw_world(&mut raster, world, camera);
            }
        }
        self.pixels.render()
    }
}

#[derive(Default)]
struct SpriteCache {
    sprites: HashMap<String, Option<LoadedSprite>>,
    warned_keys: HashSet<String>,
}

impl SpriteCache {
    fn resolve(&mut self, assets: &AssetRegistry, root: &Path, key: &str) -> Option<&LoadedSprite> {
        if !self.sprites.contains_key(key) {
            let loaded = match assets.get(key) {
                Some(entry) if entry.kind.is_drawable() => {
                    let path = root.join(&entry.path);
                    match load_sprite_rgba(&path) {
                        Ok(sprite) => Some(sprite),
                        Err(reason) => {
                            self.warn_once(key, Some(&path), &reason);
                            None
                        }
                    }
                }
                Some(_) => {
                    self.warn_once(key, None, "not_drawable");
                    None
                }
                None => {
                    self.warn_once(key, None, "unregistered_key");
                    None
                }
            };
            self.sprites.insert(key.to_string(), loaded);
        }
        self.sprites.get(key).and_then(Option::as_ref)
    }

    fn warn_once(&mut self, key: &str, path: Option<&Path>, reason: &str) {
        if !self.warned_keys.insert(key.to_string()) {
            return;
        }
        let path_display = path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<unresolved>".to_string());
        warn!(
            asset_key = key,
            path = %path_display,
            reason,
            "renderer_sprite_load_failed_using_placeholder"
        );
    }
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

/// Region of `frame` for a registered key: whole image or one sheet cell.
fn frame_region(kind: Option<AssetKind>, sprite: &LoadedSprite, frame: u32) -> Option<SpriteRegion> {
    match kind {
        Some(AssetKind::Spritesheet {
            frame_width,
            frame_height,
        }) => sheet_frame_region(sprite.width, sprite.height, frame_width, frame_height, frame),
        _ => Some(SpriteRegion {
            x: 0,
            y: 0,
            width: sprite.width,
            height: sprite.height,
        }),
    }
}

struct Painter<'a> {
    assets: &'a AssetRegistry,
    asset_root: &'a Path,
    cache: &'a mut SpriteCache,
}

impl Painter<'_> {
    fn draw_world(&mut self, raster: &mut Raster<'_>, world: &SceneWorld, camera: &Camera) {
        if let Some(background) = camera.background() {
            raster.fill_clip(background);
        }

        let mut entities = world
            .entities()
            .iter()
            .filter(|entity| entity.visible && !camera.ignores_entity(entity.id, entity.tag))
            .collect::<Vec<_>>();
        entities.sort_by_key(|entity| entity.applied_spawn_order());
        for entity in entities {
            self.draw_entity(raster, entity, camera);
        }

        for object in world.display().sorted_for_draw() {
            if !object.visible || camera.is_ignored(IgnoreTarget::Display(object.id)) {
                continue;
            }
            self.draw_display_object(raster, object, camera);
        }
    }

    fn draw_entity(&mut self, raster: &mut Raster<'_>, entity: &Entity, camera: &Camera) {
        let center = camera.world_to_screen(entity.transform.position, 1.0);
        let scale = entity.transform.scale * camera.zoom();
        let placeholder_half = entity
            .body
            .map(|body| body.half_size)
            .unwrap_or(Vec2::new(PLACEHOLDER_HALF_SIZE_PX, PLACEHOLDER_HALF_SIZE_PX));

        let (color, sprite_key, frame) = match &entity.renderable.kind {
            RenderableKind::Placeholder { color } => (*color, None, 0),
            RenderableKind::Sprite { key, frame } => (MISSING_SPRITE_COLOR, Some(key.as_str()), *frame),
        };
        if let Some(key) = sprite_key {
            let kind = self.assets.get(key).map(|entry| entry.kind);
            if let Some(sprite) = self.cache.resolve(self.assets, self.asset_root, key) {
                if let Some(region) = frame_region(kind, sprite, frame) {
                    let left = center.x - region.width as f32 * scale * 0.5;
                    let top = center.y - region.height as f32 * scale * 0.5;
                    raster.blit(sprite, region, left, top, scale, entity.transform.flip_x, 1.0);
                    return;
                }
            }
        }
        let half_x = placeholder_half.x * camera.zoom();
        let half_y = placeholder_half.y * camera.zoom();
        raster.fill_rect(
            center.x - half_x,
            center.y - half_y,
            half_x * 2.0,
            half_y * 2.0,
            color,
            1.0,
        );
    }

    fn draw_display_object(&mut self, raster: &mut Raster<'_>, object: &DisplayObject, camera: &Camera) {
        let zoom = camera.zoom();
        match &object.kind {
            DisplayKind::Image { key, frame } => {
                let kind = self.assets.get(key).map(|entry| entry.kind);
                let sprite = self.cache.resolve(self.assets, self.asset_root, key);
                let region = sprite.and_then(|sprite| frame_region(kind, sprite, *frame));
                let size = match (object.natural_size, region) {
                    (Some(size), _) => size,
                    (None, Some(region)) => Vec2::new(region.width as f32, region.height as f32),
                    (None, None) => Vec2::new(
                        PLACEHOLDER_HALF_SIZE_PX * 2.0,
                        PLACEHOLDER_HALF_SIZE_PX * 2.0,
                    ),
                };
                let top_left = Vec2::new(
                    object.position.x - object.origin.x * size.x * object.scale,
                    object.position.y - object.origin.y * size.y * object.scale,
                );
                let screen = camera.world_to_screen(top_left, object.scroll_factor);
                match (sprite, region) {
                    (Some(sprite), Some(region)) => {
                        let scale = object.scale * zoom * size.x / region.width.max(1) as f32;
                        raster.blit(sprite, region, screen.x, screen.y, scale, false, object.alpha);
                    }
                    _ => raster.fill_rect(
                        screen.x,
                        screen.y,
                        size.x * object.scale * zoom,
                        size.y * object.scale * zoom,
                        MISSING_SPRITE_COLOR,
                        object.alpha,
                    ),
                }
            }
            DisplayKind::Text { content, style } => {
                let lines = wrap_lines(content, style.cell_size, style.wrap_width);
                let (width, height) = measure_lines(&lines, style.cell_size);
                let top_left = Vec2::new(
                    object.position.x - object.origin.x * width * object.scale,
                    object.position.y - object.origin.y * height * object.scale,
                );
                let screen = camera.world_to_screen(top_left, object.scroll_factor);
                raster.draw_text(
                    &lines,
                    screen.x,
                    screen.y,
                    style.cell_size * object.scale * zoom,
                    style.color,
                    object.alpha,
                );
            }
            DisplayKind::Graphics(graphics) => {
                let scale = object.scale * zoom;
                for command in graphics.commands() {
                    match *command {
                        GraphicsCommand::FillRect { rect, color } => {
                            let origin = Vec2::new(
                                object.position.x + rect.x * object.scale,
                                object.position.y + rect.y * object.scale,
                            );
                            let screen = camera.world_to_screen(origin, object.scroll_factor);
                            raster.fill_rect(
                                screen.x,
                                screen.y,
                                rect.width * scale,
                                rect.height * scale,
                                color_from_hex(color),
                                object.alpha,
                            );
                        }
                        GraphicsCommand::FillCircle {
                            center,
                            radius,
                            color,
                        } => {
                            let world = Vec2::new(
                                object.position.x + center.x * object.scale,
                                object.position.y + center.y * object.scale,
                            );
                            let screen = camera.world_to_screen(world, object.scroll_factor);
                            raster.fill_circle(
                                screen.x,
                                screen.y,
                                radius * scale,
                                color_from_hex(color),
                                object.alpha,
                            );
                        }
                    }
                }
            }
        }
    }
}
