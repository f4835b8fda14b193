use engine::{
    Body, DisplayId, DisplayList, EntityId, EventArg, RenderableDesc, SceneContext, SceneWorld,
    Transform, Vec2,
};
use tracing::debug;

use super::events::DIALOGUE;

pub(crate) const INTERACT_KEY: &str = "interact";

const PROMPT_OFFSET: Vec2 = Vec2::new(-10.0, -10.0);
const PROMPT_SCALE: f32 = 0.3;
const PROMPT_DEPTH: i32 = 10;

/// Marker shown above a prop while the player stands next to it.
/// `shown` is exactly "the marker exists".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct InteractionPrompt {
    marker: Option<DisplayId>,
}

impl InteractionPrompt {
    pub(crate) fn is_shown(&self) -> bool {
        self.marker.is_some()
    }

    #[cfg(test)]
    pub(crate) fn marker(&self) -> Option<DisplayId> {
        self.marker
    }

    /// Returns the marker only when it was created by this call.
    pub(crate) fn show(&mut self, display: &mut DisplayList, anchor: Vec2) -> Option<DisplayId> {
        if self.marker.is_some() {
            return None;
        }
        let marker = display.add_image(
            anchor.x + PROMPT_OFFSET.x,
            anchor.y + PROMPT_OFFSET.y,
            INTERACT_KEY,
        );
        if let Some(object) = display.get_mut(marker) {
            object.set_scale(PROMPT_SCALE).set_depth(PROMPT_DEPTH);
        }
        self.marker = Some(marker);
        Some(marker)
    }

    pub(crate) fn hide(&mut self, display: &mut DisplayList) -> bool {
        match self.marker.take() {
            Some(marker) => display.destroy(marker),
            None => false,
        }
    }

    /// Hides on the touching to not-touching edge only.
    pub(crate) fn sync_contact(
        &mut self,
        display: &mut DisplayList,
        touching: bool,
        was_touching: bool,
    ) -> bool {
        if !touching && was_touching && self.is_shown() {
            return self.hide(display);
        }
        false
    }
}

/// Non-player character: a static body with an interaction prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Npc {
    entity: EntityId,
    prompt: InteractionPrompt,
}

impl Npc {
    pub(crate) fn spawn(
        world: &mut SceneWorld,
        position: Vec2,
        renderable: RenderableDesc,
        half_size: Vec2,
    ) -> Self {
        let entity = world.spawn_body(
            Transform::at(position),
            renderable,
            Body::new(half_size).without_gravity(),
        );
        Self {
            entity,
            prompt: InteractionPrompt::default(),
        }
    }

    pub(crate) fn entity(&self) -> EntityId {
        self.entity
    }

    pub(crate) fn prompt(&self) -> &InteractionPrompt {
        &self.prompt
    }

    /// Shows the prompt and announces the marker with a `dialogue` event.
    pub(crate) fn on_overlap_enter(&mut self, ctx: &mut SceneContext<'_>) {
        let Some(anchor) = ctx.world().position(self.entity) else {
            return;
        };
        if let Some(marker) = self.prompt.show(ctx.world_mut().display_mut(), anchor) {
            debug!(npc = self.entity.0, "npc_prompt_shown");
            ctx.emit(DIALOGUE, vec![EventArg::Display(marker)]);
        }
    }

    /// Per-tick contact check against the body flags of the latest step.
    pub(crate) fn update(&mut self, ctx: &mut SceneContext<'_>) {
        let Some((touching, was_touching)) = ctx
            .world()
            .body(self.entity)
            .map(|body| (body.is_touching(), body.was_touching()))
        else {
            return;
        };
        if touching {
            self.on_overlap_enter(ctx);
        }
        if self
            .prompt
            .sync_contact(ctx.world_mut().display_mut(), touching, was_touching)
        {
            debug!(npc = self.entity.0, "npc_prompt_hidden");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_creates_one_marker_at_offset() {
        let mut display = DisplayList::default();
        let mut prompt = InteractionPrompt::default();

        let marker = prompt
            .show(&mut display, Vec2::new(500.0, 235.0))
            .expect("first show");
        let object = display.get(marker).expect("marker");
        assert_eq!(object.position, Vec2::new(490.0, 225.0));
        assert_eq!(object.scale, 0.3);

        assert_eq!(prompt.show(&mut display, Vec2::new(500.0, 235.0)), None);
        assert_eq!(display.len(), 1);
        assert_eq!(prompt.marker(), Some(marker));
    }

    #[test]
    fn leaving_contact_hides_exactly_once() {
        let mut display = DisplayList::default();
        let mut prompt = InteractionPrompt::default();
        prompt.show(&mut display, Vec2::ZERO);

        assert!(!prompt.sync_contact(&mut display, true, true));
        assert!(prompt.sync_contact(&mut display, false, true));
        assert!(!prompt.is_shown());
        assert!(display.is_empty());
        assert!(!prompt.sync_contact(&mut display, false, true));
        assert!(!prompt.sync_contact(&mut display, false, false));
    }

    #[test]
    fn leaving_contact_while_hidden_is_a_no_op() {
        let mut display = DisplayList::default();
        let mut prompt = InteractionPrompt::default();
        assert!(!prompt.sync_contact(&mut display, false, true));
        assert!(!prompt.is_shown());
    }

    #[test]
    fn spawned_npc_body_ignores_gravity() {
        let mut world = SceneWorld::default();
        world.set_gravity(800.0);
        let npc = Npc::spawn(
            &mut world,
            Vec2::new(500.0, 100.0),
            RenderableDesc::placeholder([0, 0, 255, 255], "doctor"),
            Vec2::new(12.0, 25.0),
        );
        world.apply_pending();
        world.step_physics(0.5);

        assert_eq!(world.position(npc.entity()), Some(Vec2::new(500.0, 100.0)));
        assert!(!npc.prompt().is_shown());
    }
}
