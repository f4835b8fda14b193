use engine::{text_bounds, DisplayId, DisplayKind, DisplayList, Rect, TextStyle, Vec2};

use super::dialogue::DialogueLine;

pub(crate) const TEXT_BOX_KEY: &str = "textBox";

const TEXT_BOX_OFFSET: Vec2 = Vec2::new(-10.0, 330.0);
const TEXT_BOX_SCALE: f32 = 0.5;
const LINE_TEXT_OFFSET: Vec2 = Vec2::new(5.0, 15.0);
const NAME_TEXT_OFFSET: Vec2 = Vec2::new(-185.0, -45.0);
const TEXT_SCALE: f32 = 2.5;
const LINE_WRAP_WIDTH: f32 = 199.0;
const DIALOGUE_CELL_PX: f32 = 0.8;
const HIT_PADDING_X: f32 = 15.0;
const HIT_PADDING_Y: f32 = 30.0;
const UI_DEPTH: i32 = 100;

/// Text box image plus the line and speaker texts, pinned to the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DialogueBox {
    text_box: DisplayId,
    line_text: DisplayId,
    name_text: DisplayId,
}

impl DialogueBox {
    pub(crate) fn generate(
        display: &mut DisplayList,
        anchor: Vec2,
        offset: Vec2,
        line: &DialogueLine,
    ) -> Self {
        let box_x = anchor.x + TEXT_BOX_OFFSET.x + offset.x;
        let box_y = anchor.y + TEXT_BOX_OFFSET.y + offset.y;

        let text_box = display.add_image(box_x, box_y, TEXT_BOX_KEY);
        if let Some(object) = display.get_mut(text_box) {
            object
                .set_scale(TEXT_BOX_SCALE)
                .set_scroll_factor(0.0)
                .set_depth(UI_DEPTH);
        }

        let line_style = TextStyle {
            cell_size: DIALOGUE_CELL_PX,
            ..TextStyle::default()
        }
        .with_wrap_width(LINE_WRAP_WIDTH);
        let line_text = display.add_text(
            box_x + LINE_TEXT_OFFSET.x,
            box_y + LINE_TEXT_OFFSET.y,
            &line.text,
            line_style,
        );
        let name_style = TextStyle {
            cell_size: DIALOGUE_CELL_PX,
            ..TextStyle::default()
        };
        let name_text = display.add_text(
            box_x + NAME_TEXT_OFFSET.x,
            box_y + NAME_TEXT_OFFSET.y,
            &line.speaker,
            name_style,
        );
        for id in [line_text, name_text] {
            if let Some(object) = display.get_mut(id) {
                object
                    .set_scale(TEXT_SCALE)
                    .set_origin(0.5, 0.5)
                    .set_scroll_factor(0.0)
                    .set_depth(UI_DEPTH + 1);
            }
        }

        let dialogue_box = Self {
            text_box,
            line_text,
            name_text,
        };
        dialogue_box.refresh_hit_region(display);
        dialogue_box
    }

    pub(crate) fn show_line(&self, display: &mut DisplayList, line: &DialogueLine) {
        display.set_text(self.line_text, &line.text);
        display.set_text(self.name_text, &line.speaker);
        self.refresh_hit_region(display);
    }

    /// Hit region covers the measured text plus padding.
    fn refresh_hit_region(&self, display: &mut DisplayList) {
        let Some(object) = display.get_mut(self.line_text) else {
            return;
        };
        let DisplayKind::Text { content, style } = &object.kind else {
            return;
        };
        let (width, height) = text_bounds(content, style);
        object.set_interactive(Rect::new(
            0.0,
            0.0,
            width + HIT_PADDING_X,
            height + HIT_PADDING_Y,
        ));
    }

    pub(crate) fn line_hit(&self, display: &DisplayList, point: Vec2) -> bool {
        display
            .get(self.line_text)
            .is_some_and(|object| object.hit_test(point))
    }

    #[cfg(test)]
    pub(crate) fn line_text(&self) -> DisplayId {
        self.line_text
    }

    pub(crate) fn ids(&self) -> [DisplayId; 3] {
        [self.text_box, self.line_text, self.name_text]
    }

    pub(crate) fn destroy(self, display: &mut DisplayList) {
        for id in self.ids() {
            display.destroy(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(speaker: &str, text: &str) -> DialogueLine {
        DialogueLine {
            speaker: speaker.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn layout_follows_anchor_and_offsets() {
        let mut display = DisplayList::default();
        let dialogue_box = DialogueBox::generate(
            &mut display,
            Vec2::new(400.0, 100.0),
            Vec2::new(20.0, -50.0),
            &line("Doctor", "Help!"),
        );
        let [text_box, line_text, name_text] = dialogue_box.ids();

        let text_box = display.get(text_box).expect("box");
        assert_eq!(text_box.position, Vec2::new(410.0, 380.0));
        assert_eq!(text_box.scale, 0.5);
        let line_text = display.get(line_text).expect("line");
        assert_eq!(line_text.position, Vec2::new(415.0, 395.0));
        assert_eq!(line_text.origin, Vec2::new(0.5, 0.5));
        assert_eq!(line_text.scale, 2.5);
        let name_text = display.get(name_text).expect("name");
        assert_eq!(name_text.position, Vec2::new(225.0, 335.0));
        assert_eq!(display.text(name_text.id), Some("Doctor"));
    }

    #[test]
    fn hit_region_is_padded_text_bounds() {
        let mut display = DisplayList::default();
        let dialogue_box =
            DialogueBox::generate(&mut display, Vec2::ZERO, Vec2::ZERO, &line("Doc", "Run!"));
        let object = display.get(dialogue_box.line_text()).expect("line");
        let DisplayKind::Text { content, style } = &object.kind else {
            panic!("line is text");
        };
        let (width, height) = text_bounds(content, style);
        assert_eq!(
            object.hit_area(),
            Some(Rect::new(0.0, 0.0, width + 15.0, height + 30.0))
        );
    }

    #[test]
    fn show_line_replaces_texts_and_resizes_hit_region() {
        let mut display = DisplayList::default();
        let dialogue_box =
            DialogueBox::generate(&mut display, Vec2::ZERO, Vec2::ZERO, &line("Doc", "Hi"));
        let before = display
            .get(dialogue_box.line_text())
            .and_then(|object| object.hit_area())
            .expect("hit area");

        dialogue_box.show_line(&mut display, &line("Cyborg", "A much longer reply"));

        let after = display
            .get(dialogue_box.line_text())
            .and_then(|object| object.hit_area())
            .expect("hit area");
        assert!(after.width > before.width);
        assert_eq!(
            display.text(dialogue_box.line_text()),
            Some("A much longer reply")
        );
    }

    #[test]
    fn click_on_line_centre_hits_and_destroy_removes_everything() {
        let mut display = DisplayList::default();
        let dialogue_box = DialogueBox::generate(
            &mut display,
            Vec2::new(300.0, 0.0),
            Vec2::ZERO,
            &line("Doc", "Press space"),
        );
        let centre = display
            .get(dialogue_box.line_text())
            .expect("line")
            .bounds()
            .center();
        assert!(dialogue_box.line_hit(&display, centre));
        assert!(!dialogue_box.line_hit(&display, Vec2::new(-500.0, -500.0)));

        dialogue_box.destroy(&mut display);
        assert!(display.is_empty());
    }
}
