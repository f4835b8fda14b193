impl MainScene {
    fn build_stage(&self, ctx: &mut SceneContext<'_>) -> Stage {
        let map_path = ctx.assets().resolve_path(&self.asset_root, MAP_KEY);
        let tiles = match load_level_tiles(map_path.as_deref()) {
            Ok(tiles) => tiles,
            Err(error) => {
                warn!(error = %error, "level_map_fallback");
                fallback_ground_tiles()
            }
        };

        let world = ctx.world_mut();
        world.set_gravity(self.config.gravity);
        world.set_physics_bounds(WORLD_WIDTH, GROUND_Y);
        let tile_count = spawn_tiles(world, &tiles);

        let player = world.spawn_body(
            Transform::at(PLAYER_SPAWN),
            RenderableDesc::sprite("player", "player"),
            Body::new(PLAYER_HALF_SIZE),
        );
        let enemy = world.spawn_body(
            Transform::at(ENEMY_SPAWN),
            RenderableDesc::sprite("meleeRobot", "melee_robot"),
            Body::new(ENEMY_HALF_SIZE),
        );
        let doctor = Npc::spawn(
            world,
            DOCTOR_SPAWN,
            RenderableDesc::sprite("doctor", "doctor"),
            DOCTOR_HALF_SIZE,
        );
        let dead_npc = world.spawn(
            Transform::at(DEAD_NPC_SPAWN),
            RenderableDesc::sprite("villager", "dead_villager"),
        );
        world.add_overlap(player, doctor.entity());
        world.add_overlap(player, enemy);
        world
            .cameras_mut()
            .main_mut()
            .set_bounds(0.0, 0.0, WORLD_WIDTH, WORLD_HEIGHT)
            .start_follow(player);
        // Later setup steps need the cast to be visible.
        world.apply_pending();
        info!(
            tiles = tile_count,
            entity_count = world.entity_count(),
            "level_loaded"
        );

        Stage {
            player: PlayerState::new(player, &self.config.player),
            enemy: EnemyState::new(enemy, &self.config.enemy),
            doctor,
            dead_npc,
            projectiles: Vec::new(),
            doctor_talked: false,
            game_over: None,
        }
    }

    fn schedule_steps(&mut self, ctx: &mut SceneContext<'_>, requests: Vec<StepRequest>) {
        for request in requests {
            let handle = ctx.schedule_ms(request.delay_ms, request.step.token());
            self.timeline.track(handle);
        }
    }
}

impl Scene for MainScene {
    fn key(&self) -> SceneKey {
        MAIN_SCENE
    }

    fn create(&mut self, _payload: &LaunchPayload, ctx: &mut SceneContext<'_>) {
        self.controls = ControlState::default();
        self.timeline = CutsceneTimeline::default();
        let stage = self.build_stage(ctx);
        let cast = stage.cast();
        let ready = vec![
            EventArg::Entity(stage.player.entity()),
            EventArg::Entity(stage.enemy.entity),
            EventArg::Int(i64::from(stage.player.health())),
            EventArg::Int(i64::from(stage.player.max_health())),
        ];
        self.stage = Some(stage);

        if self.config.tutorial_enabled {
            let requests = self
                .timeline
                .start(ctx.world_mut(), &mut self.controls, cast);
            self.schedule_steps(ctx, requests);
        }
        ctx.subscribe(TUTORIAL_CUT_SCENE, CUTSCENE_FINISHED);
        ctx.mark_ready(ready);
        ctx.issue(SceneCommand::Launch(HUD_SCENE, LaunchPayload::default()));
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        ctx: &mut SceneContext<'_>,
    ) -> SceneCommand {
        let Some(stage) = self.stage.as_mut() else {
            return SceneCommand::None;
        };
        if stage.game_over.is_some() {
            return SceneCommand::None;
        }
        stage.player.tick(fixed_dt_seconds);
        stage.doctor.update(ctx);

        if input.was_pressed(InputAction::Confirm)
            && stage.doctor.prompt().is_shown()
            && !stage.doctor_talked
            && !self.controls.dialogue_in_progress()
        {
            stage.doctor_talked = true;
            play_cut_scene(
                ctx,
                &mut self.controls,
                stage.player.entity(),
                stage.enemy.entity,
                CameraRig::MAIN,
                stage.dead_npc,
            );
            return SceneCommand::None;
        }

        stage
            .player
            .steer(ctx.world_mut(), input, &self.controls, &self.config.player);
        let killed = resolve_player_attacks(
            ctx.world_mut(),
            stage,
            input,
            &self.controls,
            &self.config.player,
            fixed_dt_seconds,
        );
        if killed {
            robot_killed(
                ctx,
                &mut self.controls,
                stage.player.entity(),
                stage.enemy.entity,
                CameraRig::MAIN,
                stage.doctor.entity(),
            );
            return SceneCommand::None;
        }

        let halted = self.controls.is_frozen() || stage.player.is_dead();
        steer_enemy(
            ctx.world_mut(),
            &stage.enemy,
            stage.player.entity(),
            &self.config.enemy,
            halted,
        );
        if apply_contact_damage(ctx, stage, &self.config.enemy) == Some(0) {
            begin_game_over(ctx, stage);
        }
        SceneCommand::None
    }

    fn on_event(&mut self, source: SceneKey, event: &SceneEvent, ctx: &mut SceneContext<'_>) {
        if source != TUTORIAL_CUT_SCENE || !event.is(CUTSCENE_FINISHED) {
            return;
        }
        let final_scene = event.bool_arg(0).unwrap_or(false);
        self.controls.release();
        if let Some(stage) = self.stage.as_ref() {
            ctx.world_mut()
                .cameras_mut()
                .main_mut()
                .start_follow(stage.player.entity());
        }
        info!(final_scene, "cutscene_controls_restored");
    }

    fn on_timer(&mut self, token: TimerToken, ctx: &mut SceneContext<'_>) {
        if token == GAME_OVER_TOKEN {
            info!("game_over_return_to_title");
            ctx.issue(SceneCommand::Start(TITLE_SCENE));
            return;
        }
        let Some(step) = CutsceneStep::from_token(token) else {
            debug!(token = token.0, "timer_unhandled");
            return;
        };
        let requests = self
            .timeline
            .run_step(step, ctx.world_mut(), &mut self.controls);
        self.schedule_steps(ctx, requests);
        if step == CutsceneStep::ShowBubbles {
            let bubbles: Vec<EventArg> = self
                .timeline
                .bubble_ids()
                .into_iter()
                .map(EventArg::Display)
                .collect();
            if !bubbles.is_empty() {
                ctx.emit(DIALOGUE, bubbles);
            }
        }
    }

    fn shutdown(&mut self, ctx: &mut SceneContext<'_>) {
        for handle in self.timeline.take_handles() {
            ctx.cancel_timer(handle);
        }
        if let Some(timer) = self.stage.take().and_then(|stage| stage.game_over) {
            ctx.cancel_timer(timer);
        }
        ctx.issue(SceneCommand::Stop(TUTORIAL_CUT_SCENE));
        ctx.issue(SceneCommand::Stop(HUD_SCENE));
    }

    fn debug_title(&self, world: &SceneWorld) -> Option<String> {
        let stage = self.stage.as_ref()?;
        Some(format!(
            "{} | hp {}/{} | entities {}",
            self.config.window_title,
            stage.player.health(),
            stage.player.max_health(),
            world.entity_count()
        ))
    }
}
