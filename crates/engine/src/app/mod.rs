mod camera;
mod display;
mod events;
mod font;
mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;
mod timer;
mod world;

pub use camera::{
    color_from_hex, Camera, CameraId, CameraRig, CircleMask, IgnoreTarget, MAX_CAMERA_ZOOM,
    MIN_CAMERA_ZOOM,
};
pub use display::{
    text_bounds, DisplayId, DisplayKind, DisplayList, DisplayObject, Graphics, GraphicsCommand,
    Rect, TextStyle,
};
pub use events::{EventArg, SceneEvent, SCENE_READY_EVENT};
pub use input::{InputAction, InputSnapshot};
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{Renderer, Viewport, PLACEHOLDER_HALF_SIZE_PX};
pub use scene::{
    LaunchPayload, PayloadValue, Scene, SceneCommand, SceneContext, SceneKey, SceneMachine,
    SceneMachineError,
};
pub use timer::{TimerHandle, TimerScheduler, TimerToken};
pub use world::{
    Body, Entity, EntityId, PhysicsBounds, RenderableDesc, RenderableKind, SceneWorld, Transform,
    Vec2,
};
