use super::display::DisplayId;
use super::scene::SceneKey;
use super::world::EntityId;

/// Emitted by a scene when it calls [`super::SceneContext::mark_ready`].
pub const SCENE_READY_EVENT: &str = "scene-ready";

#[derive(Debug, Clone, PartialEq)]
pub enum EventArg {
    Int(i64),
    Bool(bool),
    Entity(EntityId),
    Display(DisplayId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneEvent {
    pub name: &'static str,
    pub args: Vec<EventArg>,
}

impl SceneEvent {
    pub fn new(name: &'static str, args: Vec<EventArg>) -> Self {
        Self { name, args }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn int_arg(&self, index: usize) -> Option<i64> {
        match self.args.get(index) {
            Some(EventArg::Int(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn bool_arg(&self, index: usize) -> Option<bool> {
        match self.args.get(index) {
            Some(EventArg::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn entity_arg(&self, index: usize) -> Option<EntityId> {
        match self.args.get(index) {
            Some(EventArg::Entity(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn display_args(&self) -> impl Iterator<Item = DisplayId> + '_ {
        self.args.iter().filter_map(|arg| match arg {
            EventArg::Display(id) => Some(*id),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Subscription {
    pub(crate) subscriber: SceneKey,
    pub(crate) source: SceneKey,
    pub(crate) name: &'static str,
}

/// Who listens to which scene's events. Delivery only ever reaches scenes
/// with a matching `(source, name)` entry.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionTable {
    entries: Vec<Subscription>,
}

impl SubscriptionTable {
    pub(crate) fn add(&mut self, subscription: Subscription) {
        if !self.entries.contains(&subscription) {
            self.entries.push(subscription);
        }
    }

    pub(crate) fn remove_subscriber(&mut self, subscriber: SceneKey) {
        self.entries
            .retain(|subscription| subscription.subscriber != subscriber);
    }

    pub(crate) fn subscribers_of(&self, source: SceneKey, name: &str) -> Vec<SceneKey> {
        self.entries
            .iter()
            .filter(|subscription| subscription.source == source && subscription.name == name)
            .map(|subscription| subscription.subscriber)
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN: SceneKey = SceneKey("MainScene");
    const HUD: SceneKey = SceneKey("HUDScene");

    #[test]
    fn typed_accessors_reject_mismatched_args() {
        let event = SceneEvent::new(
            "takeDamage",
            vec![EventArg::Int(40), EventArg::Int(100), EventArg::Bool(true)],
        );
        assert_eq!(event.int_arg(0), Some(40));
        assert_eq!(event.int_arg(2), None);
        assert_eq!(event.bool_arg(2), Some(true));
        assert_eq!(event.entity_arg(0), None);
        assert!(event.is("takeDamage"));
    }

    #[test]
    fn display_args_skip_other_kinds() {
        let event = SceneEvent::new(
            "dialogue",
            vec![
                EventArg::Display(DisplayId(3)),
                EventArg::Entity(EntityId(9)),
                EventArg::Display(DisplayId(5)),
            ],
        );
        assert_eq!(
            event.display_args().collect::<Vec<_>>(),
            vec![DisplayId(3), DisplayId(5)]
        );
    }

    #[test]
    fn subscriptions_match_source_and_name_and_dedupe() {
        let mut table = SubscriptionTable::default();
        let subscription = Subscription {
            subscriber: HUD,
            source: MAIN,
            name: "takeDamage",
        };
        table.add(subscription);
        table.add(subscription);
        assert_eq!(table.len(), 1);

        assert_eq!(table.subscribers_of(MAIN, "takeDamage"), vec![HUD]);
        assert!(table.subscribers_of(HUD, "takeDamage").is_empty());
        assert!(table.subscribers_of(MAIN, "dialogue").is_empty());

        table.remove_subscriber(HUD);
        assert!(table.subscribers_of(MAIN, "takeDamage").is_empty());
    }
}
