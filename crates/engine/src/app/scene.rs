use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::assets::{AssetError, AssetRegistry};

use super::camera::CameraId;
use super::events::{EventArg, SceneEvent, Subscription, SubscriptionTable, SCENE_READY_EVENT};
use super::input::InputSnapshot;
use super::timer::{TimerHandle, TimerScheduler, TimerToken};
use super::world::{EntityId, SceneWorld};

const MAX_DISPATCH_DEPTH: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneKey(pub &'static str);

impl fmt::Display for SceneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    Entity(EntityId),
    Camera(CameraId),
    Flag(bool),
}

/// Named values handed to a scene when it is launched. Entity and camera
/// references point into the world of [`LaunchPayload::source`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaunchPayload {
    source: Option<SceneKey>,
    fields: BTreeMap<String, PayloadValue>,
}

impl LaunchPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: PayloadValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: PayloadValue) {
        self.fields.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&PayloadValue> {
        self.fields.get(name)
    }

    pub fn entity(&self, name: &str) -> Option<EntityId> {
        match self.get(name) {
            Some(PayloadValue::Entity(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn camera(&self, name: &str) -> Option<CameraId> {
        match self.get(name) {
            Some(PayloadValue::Camera(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(PayloadValue::Flag(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn source(&self) -> Option<SceneKey> {
        self.source
    }

    pub fn from_source(mut self, source: SceneKey) -> Self {
        self.source = Some(source);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneCommand {
    None,
    /// Stop the issuing scene and start the target.
    Start(SceneKey),
    /// Run the target alongside the issuer, restarting it if already running.
    Launch(SceneKey, LaunchPayload),
    Stop(SceneKey),
    StopSelf,
}

pub trait Scene {
    fn key(&self) -> SceneKey;

    fn preload(&mut self, _assets: &mut AssetRegistry) -> Result<(), AssetError> {
        Ok(())
    }

    fn create(&mut self, payload: &LaunchPayload, ctx: &mut SceneContext<'_>);

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        ctx: &mut SceneContext<'_>,
    ) -> SceneCommand;

    fn on_event(&mut self, _source: SceneKey, _event: &SceneEvent, _ctx: &mut SceneContext<'_>) {}

    fn on_timer(&mut self, _token: TimerToken, _ctx: &mut SceneContext<'_>) {}

    fn shutdown(&mut self, _ctx: &mut SceneContext<'_>) {}

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

/// Everything a scene callback may touch. Commands and events are queued
/// and applied by the [`SceneMachine`] once the callback returns.
pub struct SceneContext<'a> {
    key: SceneKey,
    world: &'a mut SceneWorld,
    peers: Vec<(SceneKey, &'a mut SceneWorld)>,
    timers: &'a mut TimerScheduler,
    assets: &'a AssetRegistry,
    outbox: &'a mut Vec<SceneEvent>,
    subscribe_requests: &'a mut Vec<(SceneKey, &'static str)>,
    commands: &'a mut Vec<SceneCommand>,
}

impl<'a> SceneContext<'a> {
    pub fn key(&self) -> SceneKey {
        self.key
    }

    pub fn world(&self) -> &SceneWorld {
        &*self.world
    }

    pub fn world_mut(&mut self) -> &mut SceneWorld {
        &mut *self.world
    }

    /// World of another running scene.
    pub fn peer_world(&self, key: SceneKey) -> Option<&SceneWorld> {
        self.peers
            .iter()
            .find(|(peer, _)| *peer == key)
            .map(|(_, world)| &**world)
    }

    pub fn peer_world_mut(&mut self, key: SceneKey) -> Option<&mut SceneWorld> {
        self.peers
            .iter_mut()
            .find(|(peer, _)| *peer == key)
            .map(|(_, world)| &mut **world)
    }

    pub fn schedule(&mut self, delay: Duration, token: TimerToken) -> TimerHandle {
        self.timers.schedule(delay, token)
    }

    pub fn schedule_ms(&mut self, delay_ms: u64, token: TimerToken) -> TimerHandle {
        self.timers.schedule_ms(delay_ms, token)
    }

    pub fn cancel_timer(&mut self, handle: TimerHandle) -> bool {
        self.timers.cancel(handle)
    }

    pub fn timers(&self) -> &TimerScheduler {
        &*self.timers
    }

    pub fn assets(&self) -> &AssetRegistry {
        self.assets
    }

    pub fn emit(&mut self, name: &'static str, args: Vec<EventArg>) {
        self.outbox.push(SceneEvent::new(name, args));
    }

    pub fn subscribe(&mut self, source: SceneKey, name: &'static str) {
        self.subscribe_requests.push((source, name));
    }

    pub fn issue(&mut self, command: SceneCommand) {
        if command != SceneCommand::None {
            self.commands.push(command);
        }
    }

    /// Publishes this scene's readiness: the arguments stay readable from
    /// the world, and a [`SCENE_READY_EVENT`] goes to current subscribers.
    pub fn mark_ready(&mut self, args: Vec<EventArg>) {
        self.world.set_ready_signal(args.clone());
        self.emit(SCENE_READY_EVENT, args);
    }
}

#[derive(Debug, Error)]
pub enum SceneMachineError {
    #[error("scene key '{0}' is registered more than once")]
    DuplicateSceneKey(SceneKey),
    #[error("no scene registered under '{0}'")]
    UnknownScene(SceneKey),
    #[error("scene '{scene}' failed to preload assets: {source}")]
    Preload {
        scene: SceneKey,
        #[source]
        source: AssetError,
    },
}

struct SceneRuntime {
    key: SceneKey,
    scene: Option<Box<dyn Scene>>,
    world: SceneWorld,
    timers: TimerScheduler,
    running: bool,
    generation: u64,
}

/// Registry and scheduler for every scene of the game. Running scenes
/// update and draw in registration order.
pub struct SceneMachine {
    runtimes: Vec<SceneRuntime>,
    assets: AssetRegistry,
    subscriptions: SubscriptionTable,
    viewport: (u32, u32),
    dispatch_depth: u32,
}

impl SceneMachine {
    pub fn new(
        scenes: Vec<Box<dyn Scene>>,
        viewport: (u32, u32),
    ) -> Result<Self, SceneMachineError> {
        let mut seen = HashSet::new();
        let mut runtimes = Vec::with_capacity(scenes.len());
        for scene in scenes {
            let key = scene.key();
            if !seen.insert(key) {
                return Err(SceneMachineError::DuplicateSceneKey(key));
            }
            runtimes.push(SceneRuntime {
                key,
                scene: Some(scene),
                world: SceneWorld::new(viewport),
                timers: TimerScheduler::default(),
                running: false,
                generation: 0,
            });
        }
        Ok(Self {
            runtimes,
            assets: AssetRegistry::default(),
            subscriptions: SubscriptionTable::default(),
            viewport,
            dispatch_depth: 0,
        })
    }

    pub fn preload_all(&mut self) -> Result<(), SceneMachineError> {
        for runtime in &mut self.runtimes {
            if let Some(scene) = runtime.scene.as_mut() {
                scene
                    .preload(&mut self.assets)
                    .map_err(|source| SceneMachineError::Preload {
                        scene: runtime.key,
                        source,
                    })?;
            }
        }
        info!(asset_count = self.assets.len(), "assets_preloaded");
        Ok(())
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    pub fn start(&mut self, key: SceneKey) -> Result<(), SceneMachineError> {
        self.launch(key, LaunchPayload::default())
    }

    pub fn launch(&mut self, key: SceneKey, payload: LaunchPayload) -> Result<(), SceneMachineError> {
        let index = self
            .index_of(key)
            .ok_or(SceneMachineError::UnknownScene(key))?;
        self.start_index(index, payload);
        Ok(())
    }

    pub fn stop(&mut self, key: SceneKey) -> Result<(), SceneMachineError> {
        let index = self
            .index_of(key)
            .ok_or(SceneMachineError::UnknownScene(key))?;
        self.stop_index(index);
        Ok(())
    }

    pub fn is_running(&self, key: SceneKey) -> bool {
        self.index_of(key)
            .is_some_and(|index| self.runtimes[index].running)
    }

    pub fn running_scenes(&self) -> Vec<SceneKey> {
        self.runtimes
            .iter()
            .filter(|runtime| runtime.running)
            .map(|runtime| runtime.key)
            .collect()
    }

    pub fn world(&self, key: SceneKey) -> Option<&SceneWorld> {
        self.index_of(key).map(|index| &self.runtimes[index].world)
    }

    pub fn world_mut(&mut self, key: SceneKey) -> Option<&mut SceneWorld> {
        self.index_of(key)
            .map(|index| &mut self.runtimes[index].world)
    }

    pub fn timers(&self, key: SceneKey) -> Option<&TimerScheduler> {
        self.index_of(key).map(|index| &self.runtimes[index].timers)
    }

    pub fn rendered_worlds(&self) -> impl Iterator<Item = (SceneKey, &SceneWorld)> {
        self.runtimes
            .iter()
            .filter(|runtime| runtime.running)
            .map(|runtime| (runtime.key, &runtime.world))
    }

    pub fn entity_count(&self) -> usize {
        self.rendered_worlds()
            .map(|(_, world)| world.entity_count())
            .sum()
    }

    /// Title of the top-most running scene that provides one.
    pub fn debug_title(&self) -> Option<String> {
        self.runtimes
            .iter()
            .rev()
            .filter(|runtime| runtime.running)
            .find_map(|runtime| {
                runtime
                    .scene
                    .as_ref()
                    .and_then(|scene| scene.debug_title(&runtime.world))
            })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        for runtime in &mut self.runtimes {
            runtime.world.resize_viewport(width, height);
        }
    }

    /// Runs one fixed step for every running scene: due timers, physics,
    /// cameras, then `update`.
    pub fn tick(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) {
        let dt = Duration::from_secs_f32(fixed_dt_seconds.max(0.0));
        for index in 0..self.runtimes.len() {
            if !self.runtimes[index].running {
                continue;
            }
            let generation = self.runtimes[index].generation;
            let fired = self.runtimes[index].timers.advance(dt);
            for token in fired {
                if !self.is_same_run(index, generation) {
                    break;
                }
                self.run_callback(index, |scene, ctx| scene.on_timer(token, ctx));
            }
            if !self.is_same_run(index, generation) {
                continue;
            }

            let runtime = &mut self.runtimes[index];
            runtime.world.step_physics(fixed_dt_seconds);
            runtime.world.update_cameras(fixed_dt_seconds);

            self.run_callback(index, |scene, ctx| {
                let command = scene.update(fixed_dt_seconds, input, ctx);
                ctx.issue(command);
            });
        }
    }

    pub fn shutdown_all(&mut self) {
        for index in (0..self.runtimes.len()).rev() {
            self.stop_index(index);
        }
    }

    fn index_of(&self, key: SceneKey) -> Option<usize> {
        self.runtimes.iter().position(|runtime| runtime.key == key)
    }

    fn is_same_run(&self, index: usize, generation: u64) -> bool {
        let runtime = &self.runtimes[index];
        runtime.running && runtime.generation == generation
    }

    fn start_index(&mut self, index: usize, payload: LaunchPayload) {
        if self.runtimes[index].running {
            self.stop_index(index);
        }
        let runtime = &mut self.runtimes[index];
        runtime.world = SceneWorld::new(self.viewport);
        runtime.timers.reset();
        runtime.running = true;
        runtime.generation = runtime.generation.saturating_add(1);
        info!(
            scene = %runtime.key,
            payload_fields = payload.fields.len(),
            source = ?payload.source.map(|key| key.0),
            "scene_started"
        );
        self.run_callback(index, |scene, ctx| scene.create(&payload, ctx));
    }

    fn stop_index(&mut self, index: usize) {
        if !self.runtimes[index].running {
            return;
        }
        self.run_callback(index, |scene, ctx| scene.shutdown(ctx));
        let runtime = &mut self.runtimes[index];
        let cancelled_timers = runtime.timers.cancel_all();
        runtime.world.clear();
        runtime.running = false;
        let key = runtime.key;
        self.subscriptions.remove_subscriber(key);
        info!(scene = %key, cancelled_timers, "scene_stopped");
    }

    fn run_callback(
        &mut self,
        index: usize,
        callback: impl FnOnce(&mut dyn Scene, &mut SceneContext<'_>),
    ) {
        if self.dispatch_depth >= MAX_DISPATCH_DEPTH {
            warn!(
                scene = %self.runtimes[index].key,
                depth = self.dispatch_depth,
                "scene_dispatch_depth_exceeded"
            );
            return;
        }
        let key = self.runtimes[index].key;
        let Some(mut scene) = self.runtimes[index].scene.take() else {
            debug!(scene = %key, "scene_callback_reentered_skipped");
            return;
        };

        let mut outbox = Vec::new();
        let mut subscribe_requests = Vec::new();
        let mut commands = Vec::new();
        {
            let (before, rest) = self.runtimes.split_at_mut(index);
            let (current, after) = rest.split_at_mut(1);
            let current = &mut current[0];
            let peers = before
                .iter_mut()
                .chain(after.iter_mut())
                .filter(|runtime| runtime.running)
                .map(|runtime| (runtime.key, &mut runtime.world))
                .collect();
            let mut ctx = SceneContext {
                key,
                world: &mut current.world,
                peers,
                timers: &mut current.timers,
                assets: &self.assets,
                outbox: &mut outbox,
                subscribe_requests: &mut subscribe_requests,
                commands: &mut commands,
            };
            callback(scene.as_mut(), &mut ctx);
            current.world.apply_pending();
        }
        self.runtimes[index].scene = Some(scene);

        for (source, name) in subscribe_requests {
            self.subscriptions.add(Subscription {
                subscriber: key,
                source,
                name,
            });
        }

        self.dispatch_depth += 1;
        for command in commands {
            self.apply_command(index, command);
        }
        for event in outbox {
            self.deliver(key, &event);
        }
        self.dispatch_depth -= 1;
    }

    fn apply_command(&mut self, issuer: usize, command: SceneCommand) {
        let issuer_key = self.runtimes[issuer].key;
        match command {
            SceneCommand::None => {}
            SceneCommand::Start(target) => {
                let Some(target_index) = self.index_of(target) else {
                    warn!(issuer = %issuer_key, target = %target, "scene_command_unknown_target");
                    return;
                };
                self.stop_index(issuer);
                self.start_index(target_index, LaunchPayload::default().from_source(issuer_key));
            }
            SceneCommand::Launch(target, payload) => {
                let Some(target_index) = self.index_of(target) else {
                    warn!(issuer = %issuer_key, target = %target, "scene_command_unknown_target");
                    return;
                };
                self.start_index(target_index, payload.from_source(issuer_key));
            }
            SceneCommand::Stop(target) => match self.index_of(target) {
                Some(target_index) => self.stop_index(target_index),
                None => {
                    warn!(issuer = %issuer_key, target = %target, "scene_command_unknown_target");
                }
            },
            SceneCommand::StopSelf => self.stop_index(issuer),
        }
    }

    fn deliver(&mut self, source: SceneKey, event: &SceneEvent) {
        for subscriber in self.subscriptions.subscribers_of(source, event.name) {
            let Some(index) = self.index_of(subscriber) else {
                continue;
            };
            if !self.runtimes[index].running {
                continue;
            }
            self.run_callback(index, |scene, ctx| scene.on_event(source, event, ctx));
        }
    }
}
