use super::font::{measure_lines, wrap_lines};
use super::world::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DisplayId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Edge length of one font cell before the object's scale applies.
    pub cell_size: f32,
    pub color: [u8; 4],
    pub wrap_width: Option<f32>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            cell_size: 2.0,
            color: [255, 255, 255, 255],
            wrap_width: None,
        }
    }
}

impl TextStyle {
    pub fn with_color(mut self, color: [u8; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn with_wrap_width(mut self, wrap_width: f32) -> Self {
        self.wrap_width = Some(wrap_width);
        self
    }
}

/// Unscaled size of `content` laid out with `style`.
pub fn text_bounds(content: &str, style: &TextStyle) -> (f32, f32) {
    let lines = wrap_lines(content, style.cell_size, style.wrap_width);
    measure_lines(&lines, style.cell_size)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GraphicsCommand {
    FillRect { rect: Rect, color: u32 },
    FillCircle { center: Vec2, radius: f32, color: u32 },
}

/// Retained list of filled shapes in the object's local space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graphics {
    fill_color: u32,
    commands: Vec<GraphicsCommand>,
}

impl Graphics {
    pub fn fill_style(&mut self, color: u32) -> &mut Self {
        self.fill_color = color;
        self
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> &mut Self {
        self.commands.push(GraphicsCommand::FillRect {
            rect: Rect::new(x, y, width, height),
            color: self.fill_color,
        });
        self
    }

    pub fn fill_circle(&mut self, x: f32, y: f32, radius: f32) -> &mut Self {
        self.commands.push(GraphicsCommand::FillCircle {
            center: Vec2::new(x, y),
            radius,
            color: self.fill_color,
        });
        self
    }

    pub fn clear(&mut self) -> &mut Self {
        self.commands.clear();
        self
    }

    pub fn commands(&self) -> &[GraphicsCommand] {
        &self.commands
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayKind {
    Image { key: String, frame: u32 },
    Text { content: String, style: TextStyle },
    Graphics(Graphics),
}

#[derive(Debug, Clone)]
pub struct DisplayObject {
    pub id: DisplayId,
    pub kind: DisplayKind,
    pub position: Vec2,
    pub scale: f32,
    pub origin: Vec2,
    /// 0 pins the object to the camera viewport, 1 moves it with the world.
    pub scroll_factor: f32,
    pub alpha: f32,
    pub visible: bool,
    pub depth: i32,
    /// Unscaled image size; text measures itself.
    pub natural_size: Option<Vec2>,
    hit_area: Option<Rect>,
    insertion_order: u64,
}

impl DisplayObject {
    pub fn set_origin(&mut self, x: f32, y: f32) -> &mut Self {
        self.origin = Vec2::new(x, y);
        self
    }

    pub fn set_scale(&mut self, scale: f32) -> &mut Self {
        self.scale = scale;
        self
    }

    pub fn set_scroll_factor(&mut self, scroll_factor: f32) -> &mut Self {
        self.scroll_factor = scroll_factor;
        self
    }

    pub fn set_depth(&mut self, depth: i32) -> &mut Self {
        self.depth = depth;
        self
    }

    pub fn set_visible(&mut self, visible: bool) -> &mut Self {
        self.visible = visible;
        self
    }

    pub fn set_natural_size(&mut self, width: f32, height: f32) -> &mut Self {
        self.natural_size = Some(Vec2::new(width, height));
        self
    }

    /// Registers a hit region in unscaled local space, relative to the
    /// object's top-left corner.
    pub fn set_interactive(&mut self, hit_area: Rect) -> &mut Self {
        self.hit_area = Some(hit_area);
        self
    }

    pub fn disable_interactive(&mut self) -> &mut Self {
        self.hit_area = None;
        self
    }

    pub fn hit_area(&self) -> Option<Rect> {
        self.hit_area
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, DisplayKind::Text { .. })
    }

    pub fn insertion_order(&self) -> u64 {
        self.insertion_order
    }

    /// Unscaled frame size: measured for text, `natural_size` for images.
    pub fn frame_size(&self) -> Vec2 {
        match &self.kind {
            DisplayKind::Text { content, style } => {
                let (width, height) = text_bounds(content, style);
                Vec2::new(width, height)
            }
            DisplayKind::Image { .. } => self.natural_size.unwrap_or(Vec2::ZERO),
            DisplayKind::Graphics(_) => Vec2::ZERO,
        }
    }

    /// Top-left of the scaled frame in the object's scroll space.
    pub fn top_left(&self) -> Vec2 {
        let size = self.frame_size();
        Vec2::new(
            self.position.x - self.origin.x * size.x * self.scale,
            self.position.y - self.origin.y * size.y * self.scale,
        )
    }

    /// Scaled bounds in the object's scroll space.
    pub fn bounds(&self) -> Rect {
        let size = self.frame_size();
        let top_left = self.top_left();
        Rect::new(
            top_left.x,
            top_left.y,
            size.x * self.scale,
            size.y * self.scale,
        )
    }

    pub fn hit_test(&self, point: Vec2) -> bool {
        let Some(hit_area) = self.hit_area else {
            return false;
        };
        if !self.visible || self.scale <= 0.0 {
            return false;
        }
        let top_left = self.top_left();
        let local = Vec2::new(
            (point.x - top_left.x) / self.scale,
            (point.y - top_left.y) / self.scale,
        );
        hit_area.contains(local)
    }
}

#[derive(Debug, Default)]
pub struct DisplayList {
    next_id: u64,
    objects: Vec<DisplayObject>,
}

impl DisplayList {
    fn insert(&mut self, kind: DisplayKind, position: Vec2, origin: Vec2) -> DisplayId {
        let id = DisplayId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.objects.push(DisplayObject {
            id,
            kind,
            position,
            scale: 1.0,
            origin,
            scroll_factor: 1.0,
            alpha: 1.0,
            visible: true,
            depth: 0,
            natural_size: None,
            hit_area: None,
            insertion_order: id.0,
        });
        id
    }

    /// Images default to a centred origin, text and graphics to top-left.
    pub fn add_image(&mut self, x: f32, y: f32, key: &str) -> DisplayId {
        self.insert(
            DisplayKind::Image {
                key: key.to_string(),
                frame: 0,
            },
            Vec2::new(x, y),
            Vec2::new(0.5, 0.5),
        )
    }

    pub fn add_text(&mut self, x: f32, y: f32, content: &str, style: TextStyle) -> DisplayId {
        self.insert(
            DisplayKind::Text {
                content: content.to_string(),
                style,
            },
            Vec2::new(x, y),
            Vec2::ZERO,
        )
    }

    pub fn add_graphics(&mut self) -> DisplayId {
        self.insert(
            DisplayKind::Graphics(Graphics::default()),
            Vec2::ZERO,
            Vec2::ZERO,
        )
    }

    pub fn get(&self, id: DisplayId) -> Option<&DisplayObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    pub fn get_mut(&mut self, id: DisplayId) -> Option<&mut DisplayObject> {
        self.objects.iter_mut().find(|object| object.id == id)
    }

    pub fn contains(&self, id: DisplayId) -> bool {
        self.get(id).is_some()
    }

    pub fn graphics_mut(&mut self, id: DisplayId) -> Option<&mut Graphics> {
        match self.get_mut(id).map(|object| &mut object.kind) {
            Some(DisplayKind::Graphics(graphics)) => Some(graphics),
            _ => None,
        }
    }

    /// Replaces the content of a text object. Returns `false` for non-text ids.
    pub fn set_text(&mut self, id: DisplayId, content: &str) -> bool {
        match self.get_mut(id).map(|object| &mut object.kind) {
            Some(DisplayKind::Text { content: current, .. }) => {
                content.clone_into(current);
                true
            }
            _ => false,
        }
    }

    pub fn text(&self, id: DisplayId) -> Option<&str> {
        match self.get(id).map(|object| &object.kind) {
            Some(DisplayKind::Text { content, .. }) => Some(content.as_str()),
            _ => None,
        }
    }

    pub fn destroy(&mut self, id: DisplayId) -> bool {
        let before = self.objects.len();
        self.objects.retain(|object| object.id != id);
        self.objects.len() != before
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DisplayObject> {
        self.objects.iter()
    }

    /// Draw order: ascending depth, then creation order.
    pub fn sorted_for_draw(&self) -> Vec<&DisplayObject> {
        let mut sorted = self.objects.iter().collect::<Vec<_>>();
        sorted.sort_by_key(|object| (object.depth, object.insertion_order));
        sorted
    }

    pub(crate) fn clear(&mut self) {
        self.objects.clear();
    }
}
