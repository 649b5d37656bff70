use super::*;

#[derive(Clone)]
pub(super) struct Game {
    arena: Arena,
    mode: GameMode,
    score: u32,
    high_score: u32,
    level: u32,
    progress: f64,
    level_up_until: Option<f64>,
    clock_ms: f64,
    player: Player,
    enemies: Vec<Enemy>,
    initial_enemy_count: usize,
    boss: Option<Boss>,
    projectiles: Vec<Projectile>,
    boss_projectiles: Vec<BossProjectile>,
    particles: Vec<Particle>,
    touch_anchor: Option<f64>,
    events: Vec<GameEvent>,
    prune_mask: u8,
    frame_count: u32,
    rng: SeededRng,
}

const PRUNE_ENEMIES: u8 = 1 << 0;
const PRUNE_PROJECTILES: u8 = 1 << 1;
const PRUNE_BOSS_PROJECTILES: u8 = 1 << 2;
const PRUNE_PARTICLES: u8 = 1 << 3;

const ENEMY_VEC_CAPACITY: usize = (GRID_MAX_ROWS * GRID_MAX_COLS) as usize;
const PARTICLE_VEC_CAPACITY: usize = PARTICLES_PER_BURST * 8;

impl Game {
    pub(super) fn new(seed: u32, arena: Arena) -> Self {
        let mut game = Self {
            arena,
            mode: GameMode::Playing,
            score: 0,
            high_score: 0,
            level: 1,
            progress: 0.0,
            level_up_until: None,
            clock_ms: 0.0,
            player: create_player(arena),
            enemies: Vec::with_capacity(ENEMY_VEC_CAPACITY),
            initial_enemy_count: 0,
            boss: None,
            projectiles: Vec::new(),
            boss_projectiles: Vec::new(),
            particles: Vec::with_capacity(PARTICLE_VEC_CAPACITY),
            touch_anchor: None,
            events: Vec::new(),
            prune_mask: 0,
            frame_count: 0,
            rng: SeededRng::new(seed),
        };

        game.spawn_wave();
        game
    }

    pub(super) fn world_snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            frame_count: self.frame_count,
            clock_ms: self.clock_ms,
            mode: self.mode,
            score: self.score,
            high_score: self.high_score,
            level: self.level,
            progress: self.progress,
            level_up_active: self.level_up_until.is_some(),
            arena: self.arena,
            rng_state: self.rng.state(),
            initial_enemy_count: self.initial_enemy_count,
            player: self.player,
            enemies: self.enemies.clone(),
            boss: self.boss,
            projectiles: self.projectiles.clone(),
            boss_projectiles: self.boss_projectiles.clone(),
            particles: self.particles.clone(),
        }
    }

    pub(super) fn transition_state(&self) -> TransitionState {
        TransitionState {
            frame_count: self.frame_count,
            mode: self.mode,
            score: self.score,
            level: self.level,
            enemies: self.enemies.len(),
            boss_health: self.boss.map(|boss| boss.health),
        }
    }

    #[inline]
    pub(super) fn frame_count(&self) -> u32 {
        self.frame_count
    }

    #[inline]
    pub(super) fn mode(&self) -> GameMode {
        self.mode
    }

    #[inline]
    pub(super) fn result(&self) -> ReplayResult {
        ReplayResult {
            final_score: self.score,
            final_level: self.level,
            final_rng_state: self.rng.state(),
            frame_count: self.frame_count,
        }
    }

    #[inline]
    pub(super) fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    #[inline]
    pub(super) fn set_high_score(&mut self, high_score: u32) {
        self.high_score = high_score;
    }

    pub(super) fn tick(&mut self, now_ms: f64) {
        self.frame_count += 1;
        self.sync_clock(now_ms);
        self.advance();
    }

    pub(super) fn step(&mut self, input_byte: u8) {
        self.step_decoded(FrameInput::from_bits(input_byte));
    }

    pub(super) fn step_decoded(&mut self, input: FrameInput) {
        self.frame_count += 1;
        self.sync_clock(f64::from(self.frame_count) * FRAME_MS);

        if input.pause {
            self.toggle_pause();
        }
        if input.left {
            self.move_player(-1.0);
        }
        if input.right {
            self.move_player(1.0);
        }
        if input.fire {
            self.fire();
        }

        self.advance();
    }

    pub(super) fn move_player(&mut self, direction: f64) {
        if !self.accepts_input() {
            return;
        }

        let max_x = self.arena.width - self.player.width;
        self.player.x = (self.player.x + direction * self.player.speed).clamp(0.0, max_x);
    }

    pub(super) fn fire(&mut self) -> bool {
        if !self.accepts_input() {
            return false;
        }
        if let Some(last_shot) = self.player.last_shot_ms {
            if self.clock_ms - last_shot < FIRE_COOLDOWN_MS {
                return false;
            }
        }

        self.projectiles.push(Projectile {
            x: self.player.x + self.player.width / 2.0,
            y: self.player.y,
            radius: PROJECTILE_RADIUS,
            alive: true,
        });
        self.player.last_shot_ms = Some(self.clock_ms);
        self.events.push(GameEvent::ShotFired);
        true
    }

    pub(super) fn toggle_pause(&mut self) {
        match self.mode {
            GameMode::Playing => {
                self.mode = GameMode::Paused;
                self.events.push(GameEvent::Paused);
            }
            GameMode::Paused => self.resume(),
            GameMode::Over => {}
        }
    }

    pub(super) fn resume(&mut self) {
        if matches!(self.mode, GameMode::Paused) {
            self.mode = GameMode::Playing;
            self.events.push(GameEvent::Resumed);
        }
    }

    pub(super) fn restart(&mut self) {
        self.mode = GameMode::Playing;
        self.score = 0;
        self.level = 1;
        self.progress = 0.0;
        self.level_up_until = None;
        self.player = create_player(self.arena);
        self.boss = None;
        self.projectiles.clear();
        self.boss_projectiles.clear();
        self.particles.clear();
        self.touch_anchor = None;
        self.prune_mask = 0;

        self.spawn_wave();
        self.events.push(GameEvent::Restarted);
    }

    pub(super) fn touch_start(&mut self, x: f64) {
        self.touch_anchor = Some(x);
    }

    pub(super) fn touch_move(&mut self, x: f64) {
        let Some(anchor) = self.touch_anchor else {
            return;
        };

        let delta = x - anchor;
        if delta.abs() > TOUCH_DRAG_THRESHOLD {
            self.move_player(delta.signum());
            self.touch_anchor = Some(x);
        }
    }

    pub(super) fn touch_end(&mut self) -> bool {
        self.touch_anchor = None;
        self.fire()
    }

    pub(super) fn validate_invariants(&self) -> Result<(), RuleCode> {
        let width = self.arena.width;
        let height = self.arena.height;

        if self.level == 0 {
            return Err(RuleCode::GlobalLevelNonZero);
        }

        if !(0.0..=100.0).contains(&self.progress) {
            return Err(RuleCode::GlobalProgressRange);
        }

        if !(0.0..=width - self.player.width).contains(&self.player.x) {
            return Err(RuleCode::PlayerBounds);
        }

        if self.enemies.len() > self.initial_enemy_count {
            return Err(RuleCode::EnemyCountAboveInitial);
        }

        debug_assert!(self.enemies.iter().all(|entry| entry.alive));
        debug_assert!(self.projectiles.iter().all(|entry| entry.alive));
        debug_assert!(self.boss_projectiles.iter().all(|entry| entry.alive));
        debug_assert!(self.particles.iter().all(|entry| entry.alive));

        for enemy in &self.enemies {
            let in_bounds = (0.0..=width - enemy.width).contains(&enemy.x)
                && (0.0..=height).contains(&enemy.y);
            if !in_bounds {
                return Err(RuleCode::EnemyBounds);
            }
        }

        if let Some(boss) = &self.boss {
            if !is_boss_level(self.level) {
                return Err(RuleCode::BossOutsideBossLevel);
            }
            if boss.health <= 0 || boss.health > boss.max_health {
                return Err(RuleCode::BossHealthRange);
            }
        }

        for projectile in &self.projectiles {
            if projectile.y < 0.0 || !(0.0..=width).contains(&projectile.x) {
                return Err(RuleCode::ProjectileState);
            }
        }

        for projectile in &self.boss_projectiles {
            let in_bounds =
                (0.0..=width).contains(&projectile.x) && (0.0..=height).contains(&projectile.y);
            if !in_bounds {
                return Err(RuleCode::BossProjectileState);
            }
        }

        for particle in &self.particles {
            if particle.alpha <= 0.0 || particle.alpha > 1.0 {
                return Err(RuleCode::ParticleState);
            }
        }

        Ok(())
    }

    #[inline]
    fn accepts_input(&self) -> bool {
        matches!(self.mode, GameMode::Playing) && self.level_up_until.is_none()
    }

    fn sync_clock(&mut self, now_ms: f64) {
        self.clock_ms = now_ms.max(self.clock_ms);

        if let Some(until) = self.level_up_until {
            if self.clock_ms >= until {
                self.level_up_until = None;
            }
        }
    }

    fn advance(&mut self) {
        if !self.accepts_input() {
            return;
        }

        self.update_particles();
        self.update_projectiles();
        self.update_enemies();
        self.update_boss();
        self.update_boss_projectiles();

        self.handle_collisions();
        self.prune_destroyed_entities();

        if matches!(self.mode, GameMode::Playing) && self.level_complete() {
            self.level_up();
        }
        self.update_progress();
    }

    fn spawn_wave(&mut self) {
        if is_boss_level(self.level) {
            self.spawn_boss();
        } else {
            self.spawn_enemies();
        }
    }

    fn spawn_enemies(&mut self) {
        let (rows, cols) = enemy_grid_dims(self.level);
        let spacing = (self.arena.width - 2.0 * GRID_MARGIN) / f64::from(cols - 1);

        self.enemies.clear();
        for row in 0..rows {
            for col in 0..cols {
                let pattern = MovePattern::from_index(self.rng.next_int(3));
                let phase = self.rng.next_f64() * TAU;
                self.enemies.push(Enemy {
                    x: GRID_MARGIN + f64::from(col) * spacing,
                    y: GRID_MARGIN + f64::from(row) * GRID_ROW_PITCH,
                    width: ENEMY_WIDTH,
                    height: ENEMY_HEIGHT,
                    pattern,
                    phase,
                    alive: true,
                });
            }
        }

        self.initial_enemy_count = self.enemies.len();
    }

    fn spawn_boss(&mut self) {
        let health = boss_health_for_level(self.level);
        self.enemies.clear();
        self.initial_enemy_count = 0;
        self.boss = Some(Boss {
            x: self.arena.width / 2.0 - BOSS_WIDTH / 2.0,
            y: BOSS_TOP,
            width: BOSS_WIDTH,
            height: BOSS_HEIGHT,
            health,
            max_health: health,
            pattern: 0,
            last_shot_ms: self.clock_ms,
            phase: PI / 2.0,
        });
    }

    fn spawn_particles(&mut self, x: f64, y: f64, color: &'static str) {
        for _ in 0..PARTICLES_PER_BURST {
            let radius = self.rng.next_f64() * PARTICLE_MAX_RADIUS;
            let vx = (self.rng.next_f64() - 0.5) * PARTICLE_MAX_SPEED;
            let vy = (self.rng.next_f64() - 0.5) * PARTICLE_MAX_SPEED;
            self.particles.push(Particle {
                x,
                y,
                vx,
                vy,
                radius,
                color,
                alpha: 1.0,
                alive: true,
            });
        }
    }

    fn update_particles(&mut self) {
        for particle in &mut self.particles {
            particle.alpha -= PARTICLE_ALPHA_DECAY;
            if particle.alpha <= 0.0 {
                particle.alive = false;
                self.prune_mask |= PRUNE_PARTICLES;
                continue;
            }
            particle.x += particle.vx;
            particle.y += particle.vy;
        }
    }

    fn update_projectiles(&mut self) {
        for projectile in &mut self.projectiles {
            projectile.y -= PROJECTILE_SPEED;
            if projectile.y < 0.0 {
                projectile.alive = false;
                self.prune_mask |= PRUNE_PROJECTILES;
            }
        }
    }

    fn update_enemies(&mut self) {
        let arena = self.arena;
        for enemy in &mut self.enemies {
            move_enemy(enemy, arena, &mut self.rng);
        }
    }

    fn update_boss(&mut self) {
        let Some(boss) = self.boss.as_mut() else {
            return;
        };

        let center_x = self.arena.width / 2.0 + boss.phase.cos() * self.arena.width / 3.0;
        boss.x = center_x - boss.width / 2.0;
        boss.phase += BOSS_PHASE_STEP;

        if self.clock_ms - boss.last_shot_ms <= BOSS_SHOT_INTERVAL_MS {
            return;
        }

        let origin_x = boss.x + boss.width / 2.0;
        let origin_y = boss.y + boss.height;
        if boss.pattern == 0 {
            let (target_x, target_y) = self.player.center();
            let aim = (target_y - origin_y).atan2(target_x - origin_x);
            for offset in [-BOSS_SPREAD_RAD, 0.0, BOSS_SPREAD_RAD] {
                self.boss_projectiles
                    .push(boss_projectile(origin_x, origin_y, aim + offset));
            }
        } else {
            for shot in 0..BOSS_RING_SHOTS {
                let angle = TAU * f64::from(shot) / f64::from(BOSS_RING_SHOTS);
                self.boss_projectiles
                    .push(boss_projectile(origin_x, origin_y, angle));
            }
        }

        boss.pattern = (boss.pattern + 1) % BOSS_PATTERN_COUNT;
        boss.last_shot_ms = self.clock_ms;
    }

    fn update_boss_projectiles(&mut self) {
        let width = self.arena.width;
        let height = self.arena.height;
        for projectile in &mut self.boss_projectiles {
            projectile.x += projectile.vx;
            projectile.y += projectile.vy;

            let off_screen = projectile.x < 0.0
                || projectile.x > width
                || projectile.y < 0.0
                || projectile.y > height;
            if off_screen {
                projectile.alive = false;
                self.prune_mask |= PRUNE_BOSS_PROJECTILES;
            }
        }
    }

    fn handle_collisions(&mut self) {
        for enemy_index in 0..self.enemies.len() {
            let enemy = self.enemies[enemy_index];
            if !enemy.alive {
                continue;
            }

            let hit = self.projectiles.iter().position(|projectile| {
                projectile.alive
                    && point_inside(
                        projectile.x,
                        projectile.y,
                        enemy.x,
                        enemy.y,
                        enemy.width,
                        enemy.height,
                    )
            });
            let Some(projectile_index) = hit else {
                continue;
            };

            self.projectiles[projectile_index].alive = false;
            self.enemies[enemy_index].alive = false;
            self.prune_mask |= PRUNE_PROJECTILES | PRUNE_ENEMIES;

            let (cx, cy) = enemy.center();
            self.spawn_particles(cx, cy, COLOR_ENEMY);
            self.add_score(SCORE_ENEMY);
            self.events.push(GameEvent::EnemyDestroyed { x: cx, y: cy });
        }

        self.resolve_boss_hits();

        if matches!(self.mode, GameMode::Playing) {
            let player_rect = (
                self.player.x,
                self.player.y,
                self.player.width,
                self.player.height,
            );
            let height = self.arena.height;
            let breach = self.enemies.iter().position(|enemy| {
                enemy.alive
                    && (rects_touch((enemy.x, enemy.y, enemy.width, enemy.height), player_rect)
                        || enemy.y + enemy.height >= height)
            });
            if let Some(enemy_index) = breach {
                self.enemies[enemy_index].alive = false;
                self.prune_mask |= PRUNE_ENEMIES;
                self.end_game();
            }
        }

        if matches!(self.mode, GameMode::Playing) {
            let player = self.player;
            let hit = self.boss_projectiles.iter().position(|projectile| {
                projectile.alive
                    && point_inside(
                        projectile.x,
                        projectile.y,
                        player.x,
                        player.y,
                        player.width,
                        player.height,
                    )
            });
            if let Some(projectile_index) = hit {
                self.boss_projectiles[projectile_index].alive = false;
                self.prune_mask |= PRUNE_BOSS_PROJECTILES;
                self.end_game();
            }
        }
    }

    fn resolve_boss_hits(&mut self) {
        let Some(mut boss) = self.boss else {
            return;
        };

        for projectile_index in 0..self.projectiles.len() {
            let projectile = self.projectiles[projectile_index];
            if !projectile.alive
                || !point_inside(
                    projectile.x,
                    projectile.y,
                    boss.x,
                    boss.y,
                    boss.width,
                    boss.height,
                )
            {
                continue;
            }

            self.projectiles[projectile_index].alive = false;
            self.prune_mask |= PRUNE_PROJECTILES;
            boss.health -= BOSS_DAMAGE_PER_HIT;

            let (cx, cy) = boss.center();
            self.spawn_particles(cx, cy, COLOR_BOSS);
            self.events.push(GameEvent::BossHit {
                health: boss.health,
            });

            if boss.health <= 0 {
                break;
            }
        }

        if boss.health > 0 {
            self.boss = Some(boss);
            return;
        }

        self.boss = None;
        self.add_score(SCORE_BOSS_DEFEAT);
        let (cx, cy) = boss.center();
        for _ in 0..BOSS_DEFEAT_BURSTS {
            self.spawn_particles(cx, cy, COLOR_BOSS);
        }
        self.events.push(GameEvent::BossDefeated);
    }

    fn end_game(&mut self) {
        let (cx, cy) = self.player.center();
        self.spawn_particles(cx, cy, COLOR_PLAYER);
        self.events.push(GameEvent::PlayerHit);

        self.mode = GameMode::Over;
        self.events.push(GameEvent::GameOver { score: self.score });

        if self.score > self.high_score {
            self.high_score = self.score;
            self.events
                .push(GameEvent::NewHighScore { score: self.score });
        }
    }

    #[cfg(test)]
    pub(super) fn force_game_over(&mut self, score: u32) {
        self.score = score;
        self.end_game();
    }

    fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    fn level_complete(&self) -> bool {
        if is_boss_level(self.level) {
            self.boss.is_none()
        } else {
            self.enemies.is_empty()
        }
    }

    fn level_up(&mut self) {
        self.level += 1;
        self.level_up_until = Some(self.clock_ms + LEVEL_UP_BANNER_MS);
        self.spawn_wave();
        self.events.push(GameEvent::LevelUp {
            level: self.level,
            boss: is_boss_level(self.level),
        });
    }

    fn update_progress(&mut self) {
        self.progress = if is_boss_level(self.level) {
            match &self.boss {
                Some(boss) => {
                    let remaining = f64::from(boss.health) / f64::from(boss.max_health);
                    (100.0 * (1.0 - remaining)).max(0.0)
                }
                None => 100.0,
            }
        } else if self.initial_enemy_count == 0 {
            100.0
        } else {
            let destroyed = self.initial_enemy_count - self.enemies.len();
            100.0 * destroyed as f64 / self.initial_enemy_count as f64
        };
    }

    fn prune_destroyed_entities(&mut self) {
        if self.prune_mask == 0 {
            return;
        }

        if (self.prune_mask & PRUNE_ENEMIES) != 0 {
            self.enemies.retain(|entry| entry.alive);
        }
        if (self.prune_mask & PRUNE_PROJECTILES) != 0 {
            self.projectiles.retain(|entry| entry.alive);
        }
        if (self.prune_mask & PRUNE_BOSS_PROJECTILES) != 0 {
            self.boss_projectiles.retain(|entry| entry.alive);
        }
        if (self.prune_mask & PRUNE_PARTICLES) != 0 {
            self.particles.retain(|entry| entry.alive);
        }

        self.prune_mask = 0;
    }
}

fn create_player(arena: Arena) -> Player {
    Player {
        x: arena.width / 2.0 - PLAYER_WIDTH / 2.0,
        y: arena.height - PLAYER_BOTTOM_OFFSET,
        width: PLAYER_WIDTH,
        height: PLAYER_HEIGHT,
        speed: PLAYER_SPEED,
        last_shot_ms: None,
    }
}

fn move_enemy(enemy: &mut Enemy, arena: Arena, rng: &mut SeededRng) {
    let max_x = arena.width - enemy.width;
    match enemy.pattern {
        MovePattern::Sine => {
            enemy.x = (enemy.x + enemy.phase.sin() * SINE_AMPLITUDE).clamp(0.0, max_x);
            enemy.phase += SINE_PHASE_STEP;
        }
        MovePattern::Circular => {
            let next_x = enemy.x + enemy.phase.cos() * CIRCLE_RADIUS;
            let next_y = enemy.y + enemy.phase.sin() * CIRCLE_RADIUS;
            if (0.0..=max_x).contains(&next_x) {
                enemy.x = next_x;
            }
            if (0.0..=arena.height / 2.0).contains(&next_y) {
                enemy.y = next_y;
            }
            enemy.phase += CIRCLE_PHASE_STEP;
        }
        MovePattern::Dive => {
            if rng.next_f64() < DIVE_CHANCE {
                let next_y = enemy.y + DIVE_STEP;
                if next_y <= arena.height - enemy.height {
                    enemy.y = next_y;
                }
            }
        }
    }
}

#[inline]
fn boss_projectile(x: f64, y: f64, angle: f64) -> BossProjectile {
    BossProjectile {
        x,
        y,
        vx: angle.cos() * BOSS_PROJECTILE_SPEED,
        vy: angle.sin() * BOSS_PROJECTILE_SPEED,
        radius: BOSS_PROJECTILE_RADIUS,
        alive: true,
    }
}
