mod bootstrap;
mod config;
mod cutscene;
mod events;
mod loop_runner;
mod npc;
mod player;
mod scenes;

pub(crate) use loop_runner::run;
