/// Tile placements `(centre, scale)` for every occupied cell of every layer.
fn load_level_tiles(path: Option<&Path>) -> Result<Vec<(Vec2, f32)>, LevelError> {
    let path = path.ok_or(LevelError::Unregistered(MAP_KEY))?;
    let map = TiledMap::load(path)?;
    let tile_w = map.tile_width as f32;
    let tile_h = map.tile_height as f32;
    // Placeholders draw 10px squares at scale 1.
    let scale = tile_w.max(tile_h) / 10.0;
    let mut tiles = Vec::new();
    for layer in map.layers() {
        for (column, row, _tile) in map.occupied_cells(layer) {
            let centre = Vec2::new(
                column as f32 * tile_w + tile_w * 0.5,
                row as f32 * tile_h + tile_h * 0.5,
            );
            tiles.push((centre, scale));
        }
    }
    Ok(tiles)
}

/// A single strip of ground tiles just below the physics floor.
fn fallback_ground_tiles() -> Vec<(Vec2, f32)> {
    let count = (WORLD_WIDTH / FALLBACK_TILE_PX).ceil() as usize;
    (0..count)
        .map(|index| {
            let centre = Vec2::new(
                index as f32 * FALLBACK_TILE_PX + FALLBACK_TILE_PX * 0.5,
                GROUND_Y + FALLBACK_TILE_PX * 0.5,
            );
            (centre, FALLBACK_TILE_PX / 10.0)
        })
        .collect()
}

fn spawn_tiles(world: &mut SceneWorld, tiles: &[(Vec2, f32)]) -> usize {
    for (centre, scale) in tiles {
        let transform = Transform {
            position: *centre,
            scale: *scale,
            flip_x: false,
        };
        world.spawn_tagged(
            transform,
            RenderableDesc::placeholder(TILE_COLOR, "tile"),
            BELOW_LAYER_TAG,
        );
    }
    tiles.len()
}

/// Horizontal speed of an enemy walking toward the player.
fn enemy_chase_velocity(enemy_x: f32, player_x: f32, tuning: &EnemyTuning, halted: bool) -> f32 {
    let dx = player_x - enemy_x;
    if halted || dx.abs() > tuning.aggro_radius || dx.abs() <= ENEMY_STOP_DISTANCE {
        return 0.0;
    }
    dx.signum() * tuning.move_speed
}

/// Melee only lands in front of the attacker.
fn in_melee_reach(attacker: Vec2, facing: f32, target: Vec2, range: f32) -> bool {
    let dx = target.x - attacker.x;
    let dy = target.y - attacker.y;
    dx * facing >= 0.0 && dx.abs() <= range + MELEE_REACH_PAD && dy.abs() <= MELEE_VERTICAL_REACH
}

fn steer_enemy(
    world: &mut SceneWorld,
    enemy: &EnemyState,
    player: EntityId,
    tuning: &EnemyTuning,
    halted: bool,
) {
    if !enemy.is_alive() {
        return;
    }
    let Some(player_x) = world.position(player).map(|position| position.x) else {
        return;
    };
    let Some(entity) = world.find_entity_mut(enemy.entity) else {
        return;
    };
    let velocity_x =
        enemy_chase_velocity(entity.transform.position.x, player_x, tuning, halted);
    if velocity_x != 0.0 {
        entity.transform.flip_x = velocity_x < 0.0;
    }
    if let Some(body) = entity.body.as_mut() {
        body.set_velocity_x(velocity_x);
    }
}

fn spawn_projectile(world: &mut SceneWorld, origin: Vec2, facing: f32, speed: f32) -> Projectile {
    let mut body = Body::new(PROJECTILE_HALF_SIZE).without_gravity();
    body.velocity = Vec2::new(facing * speed, 0.0);
    let transform = Transform {
        position: origin,
        scale: PROJECTILE_SCALE,
        flip_x: facing < 0.0,
    };
    let entity = world.spawn_tagged_body(
        transform,
        RenderableDesc::sprite("bigBlast", "player_projectile"),
        body,
        PLAYER_PROJECTILE_TAG,
    );
    Projectile {
        entity,
        remaining_seconds: PROJECTILE_LIFETIME_SECONDS,
    }
}

/// Ages every live projectile and removes the ones that expired or hit
/// `target`. Returns the number of hits.
fn step_projectiles(
    world: &mut SceneWorld,
    projectiles: &mut Vec<Projectile>,
    target: Option<EntityId>,
    fixed_dt_seconds: f32,
) -> u32 {
    let mut hits = 0;
    projectiles.retain_mut(|projectile| {
        projectile.remaining_seconds -= fixed_dt_seconds;
        let hit = target.is_some_and(|target| world.bodies_overlap(projectile.entity, target));
        if hit {
            hits += 1;
        }
        if hit || projectile.remaining_seconds <= 0.0 {
            world.despawn(projectile.entity);
            return false;
        }
        true
    });
    hits
}

/// Melee and projectile damage against the enemy. Returns true when the
/// enemy died this tick.
fn resolve_player_attacks(
    world: &mut SceneWorld,
    stage: &mut Stage,
    input: &InputSnapshot,
    controls: &ControlState,
    tuning: &PlayerTuning,
    fixed_dt_seconds: f32,
) -> bool {
    let enemy = stage.enemy.entity;
    let target = stage.enemy.is_alive().then_some(enemy);
    let hits = step_projectiles(world, &mut stage.projectiles, target, fixed_dt_seconds);
    let mut damage = hits * tuning.shot_damage;

    let player_position = world.position(stage.player.entity());
    if stage.player.try_melee(input, controls, tuning) {
        if let (Some(attacker), Some(victim), true) = (
            player_position,
            world.position(enemy),
            stage.enemy.is_alive(),
        ) {
            if in_melee_reach(attacker, stage.player.facing(), victim, tuning.melee_range) {
                damage += tuning.melee_damage;
            }
        }
    }
    if stage.player.try_shoot(input, controls, tuning) {
        if let Some(origin) = player_position {
            let projectile =
                spawn_projectile(world, origin, stage.player.facing(), tuning.shot_speed);
            stage.projectiles.push(projectile);
        }
    }

    if damage == 0 {
        return false;
    }
    let killed = stage.enemy.take_hit(damage);
    debug!(
        damage,
        health = stage.enemy.health,
        max_health = stage.enemy.max_health,
        "enemy_hit"
    );
    if killed {
        world.despawn(enemy);
        info!(enemy = enemy.0, "enemy_destroyed");
    }
    killed
}

/// Contact damage from a living enemy; emits `takeDamage` on every hit
/// that lands. Returns the player's new health.
fn apply_contact_damage(
    ctx: &mut SceneContext<'_>,
    stage: &mut Stage,
    tuning: &EnemyTuning,
) -> Option<u32> {
    if !stage.enemy.is_alive()
        || !ctx
            .world()
            .bodies_overlap(stage.player.entity(), stage.enemy.entity)
    {
        return None;
    }
    let health = stage
        .player
        .take_damage(tuning.contact_damage, tuning.invulnerability_ms)?;
    ctx.emit(
        TAKE_DAMAGE,
        vec![
            EventArg::Int(i64::from(health)),
            EventArg::Int(i64::from(stage.player.max_health())),
        ],
    );
    info!(health, max_health = stage.player.max_health(), "player_damaged");
    Some(health)
}

/// Shows the game-over card and schedules the return to the title.
fn begin_game_over(ctx: &mut SceneContext<'_>, stage: &mut Stage) {
    let world = ctx.world_mut();
    if let Some(body) = world.body_mut(stage.player.entity()) {
        body.velocity = Vec2::ZERO;
    }
    let display = world.display_mut();
    let image = display.add_image(400.0, 300.0, GAME_OVER_KEY);
    if let Some(object) = display.get_mut(image) {
        object.set_scroll_factor(0.0).set_depth(GAME_OVER_DEPTH);
    }
    stage.game_over = Some(ctx.schedule_ms(GAME_OVER_DELAY_MS, GAME_OVER_TOKEN));
    info!(delay_ms = GAME_OVER_DELAY_MS, "game_over");
}
