//! The run controller: one play session from start to game over.
//!
//! [`Run::tick`] advances one frame: timers, physics, collision, then the
//! per-frame [`Run::update`]. Everything that the front end has to react to
//! (sounds, palette changes, game over) is returned as [`RunEvent`]s, so the
//! controller never touches the terminal or the audio device.

use std::time::Duration;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{Config, Tuning};
use crate::palette::PaletteFade;
use crate::physics::{Body, Rect, ground_correction};
use crate::sound::Sound;
use crate::timer::Timer;

/// Player sprite size in world units.
pub const PLAYER_SIZE: (f32, f32) = (88.0, 94.0);
pub const CLOUD_SIZE: (f32, f32) = (140.0, 42.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleKind {
    Single,
    Multi,
}

impl ObstacleKind {
    pub fn size(self) -> (f32, f32) {
        match self {
            ObstacleKind::Single => (50.0, 100.0),
            ObstacleKind::Multi => (102.0, 100.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    pub body: Body,
}

impl Obstacle {
    pub fn rect(&self) -> Rect {
        let (w, h) = self.kind.size();
        Rect::from_bottom_center(self.body.x, self.body.y, w, h)
    }
}

/// Decorative only.
#[derive(Debug, Clone, PartialEq)]
pub struct Cloud {
    /// Left edge.
    pub x: f32,
    pub y: f32,
    /// Units per frame, leftward.
    pub speed: f32,
}

impl Cloud {
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            w: CLOUD_SIZE.0,
            h: CLOUD_SIZE.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub body: Body,
    /// Running-animation frame, 0 or 1.
    pub frame: u8,
    /// Set on defeat.
    pub tinted: bool,
}

impl Player {
    pub fn sprite(&self) -> Rect {
        Rect::from_bottom_center(self.body.x, self.body.y, PLAYER_SIZE.0, PLAYER_SIZE.1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timers {
    pub obstacle: Timer,
    pub cloud: Timer,
    pub animation: Timer,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Sound(Sound),
    ObstacleSpawned(ObstacleKind),
    CloudSpawned,
    /// The mode changed; the colours follow once the fade-out completes.
    PaletteFlipped { dark: bool },
    /// The fade-out completed and the new colours are applied.
    PaletteSwapped { dark: bool },
    GameOver { display_score: u32, high_score: u32 },
}

pub struct Run {
    tuning: Tuning,
    rng: StdRng,
    clock: Duration,
    /// World units scrolled this run.
    distance: f32,
    phase: Phase,
    player: Player,
    obstacles: Vec<Obstacle>,
    clouds: Vec<Cloud>,
    score: u32,
    high_score: u32,
    dark_mode: bool,
    last_point_sound_score: u32,
    last_mode_switch_score: u32,
    timers: Timers,
    fade: PaletteFade,
}

impl Run {
    pub fn new(tuning: Tuning, rng: StdRng) -> Self {
        let fade = PaletteFade::new(Duration::from_millis(tuning.fade_ms));
        let mut run = Run {
            player: Self::fresh_player(&tuning),
            tuning,
            rng,
            clock: Duration::ZERO,
            distance: 0.0,
            phase: Phase::Running,
            obstacles: Vec::new(),
            clouds: Vec::new(),
            score: 0,
            high_score: 0,
            dark_mode: false,
            last_point_sound_score: 0,
            last_mode_switch_score: 0,
            timers: Timers::default(),
            fade,
        };
        run.start();
        run
    }

    pub fn from_config(config: &Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(config.tuning.clone(), rng)
    }

    fn fresh_player(tuning: &Tuning) -> Player {
        Player {
            body: Body {
                x: tuning.player_x,
                y: tuning.ground_y(),
                gravity: tuning.gravity,
                ..Body::default()
            },
            frame: 0,
            tinted: false,
        }
    }

    /// Resets everything but the high score and arms the timers.
    fn start(&mut self) {
        self.phase = Phase::Running;
        self.distance = 0.0;
        self.player = Self::fresh_player(&self.tuning);
        self.obstacles.clear();
        self.clouds.clear();
        self.score = 0;
        self.dark_mode = false;
        self.last_point_sound_score = 0;
        self.last_mode_switch_score = 0;
        self.fade = PaletteFade::new(Duration::from_millis(self.tuning.fade_ms));

        self.timers = Timers::default();
        self.timers.animation.every(
            self.clock,
            Duration::from_millis(self.tuning.animation_interval_ms),
        );
        self.schedule_obstacle();
        self.schedule_cloud();
    }

    /// Full scene restart: a fresh run that keeps the high score.
    pub fn restart(&mut self) {
        info!(
            "Restarting run (last score {}, high score {})",
            self.display_score(),
            self.high_score
        );
        self.start();
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// The restart prompt is shown for as long as the run is over.
    pub fn prompt_visible(&self) -> bool {
        self.is_game_over()
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn clouds(&self) -> &[Cloud] {
        &self.clouds
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn display_score(&self) -> u32 {
        self.score / self.tuning.score_divisor
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn is_dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn fade(&self) -> &PaletteFade {
        &self.fade
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    // ── Commands ────────────────────────────────────────────────────────────

    /// Only from a standstill on the ground. Airborne presses are dropped.
    pub fn jump(&mut self) -> Option<RunEvent> {
        if self.phase != Phase::Running {
            return None;
        }
        let body = &mut self.player.body;
        if body.y >= self.tuning.ground_y() && body.vy == 0.0 {
            body.vy = self.tuning.jump_velocity;
            Some(RunEvent::Sound(Sound::Jump))
        } else {
            None
        }
    }

    /// One full frame of `dt`.
    pub fn tick(&mut self, dt: Duration) -> Vec<RunEvent> {
        let mut events = Vec::new();
        self.clock += dt;

        if self.fade.advance(dt) {
            events.push(RunEvent::PaletteSwapped {
                dark: self.fade.is_dark(),
            });
        }

        if self.phase == Phase::GameOver {
            return events;
        }

        self.run_timers(&mut events);

        let secs = dt.as_secs_f32();
        self.distance -= self.tuning.obstacle_velocity * secs;
        self.player.body.integrate(secs);
        for obstacle in &mut self.obstacles {
            obstacle.body.integrate(secs);
        }

        if self.collides() {
            self.game_over(&mut events);
            return events;
        }

        self.frame_update(&mut events);
        events
    }

    /// The per-frame bookkeeping: ground snap, sweeps, scoring and the
    /// threshold effects. Does nothing once the run is over.
    pub fn update(&mut self) -> Vec<RunEvent> {
        let mut events = Vec::new();
        self.frame_update(&mut events);
        events
    }

    // ── Internals ───────────────────────────────────────────────────────────

    fn frame_update(&mut self, events: &mut Vec<RunEvent>) {
        if self.phase == Phase::GameOver {
            return;
        }

        let body = &mut self.player.body;
        (body.y, body.vy) = ground_correction(body.y, body.vy, self.tuning.ground_y());

        let despawn_x = self.tuning.obstacle_despawn_x;
        self.obstacles.retain(|o| o.body.x >= despawn_x);

        self.score += 1;
        let display = self.display_score();
        if display > self.high_score {
            self.high_score = display;
        }

        if display > 0
            && display % self.tuning.point_sound_every == 0
            && display != self.last_point_sound_score
        {
            self.last_point_sound_score = display;
            events.push(RunEvent::Sound(Sound::Point));
        }

        if display > 0
            && display % self.tuning.palette_swap_every == 0
            && display != self.last_mode_switch_score
        {
            self.last_mode_switch_score = display;
            self.dark_mode = !self.dark_mode;
            self.fade.start(self.dark_mode);
            info!("Score {display}: switching to {} mode", mode_name(self.dark_mode));
            events.push(RunEvent::PaletteFlipped {
                dark: self.dark_mode,
            });
        }

        for cloud in &mut self.clouds {
            cloud.x -= cloud.speed;
        }
        self.clouds.retain(|c| c.x + CLOUD_SIZE.0 >= 0.0);
    }

    fn run_timers(&mut self, events: &mut Vec<RunEvent>) {
        while self.timers.animation.fired(self.clock) {
            self.player.frame = 1 - self.player.frame;
        }
        if self.timers.obstacle.fired(self.clock) {
            let kind = self.spawn_obstacle();
            events.push(RunEvent::ObstacleSpawned(kind));
        }
        if self.timers.cloud.fired(self.clock) {
            self.spawn_cloud();
            events.push(RunEvent::CloudSpawned);
        }
    }

    fn spawn_obstacle(&mut self) -> ObstacleKind {
        let kind = if self.rng.gen_bool(0.5) {
            ObstacleKind::Single
        } else {
            ObstacleKind::Multi
        };
        self.obstacles.push(Obstacle {
            kind,
            body: Body {
                x: self.tuning.obstacle_spawn_x,
                y: self.tuning.ground_y(),
                vx: self.tuning.obstacle_velocity,
                ..Body::default()
            },
        });
        debug!("Spawned {kind:?} obstacle ({} live)", self.obstacles.len());
        self.schedule_obstacle();
        kind
    }

    fn schedule_obstacle(&mut self) {
        let (lo, hi) = self.tuning.obstacle_delay_ms;
        let delay = Duration::from_millis(self.rng.gen_range(lo..=hi));
        self.timers.obstacle.once(self.clock, delay);
        debug!("Next obstacle in {}ms", delay.as_millis());
    }

    fn spawn_cloud(&mut self) {
        let (lo, hi) = self.tuning.cloud_speed;
        let cloud = Cloud {
            x: self.tuning.viewport_width,
            y: self
                .rng
                .gen_range(self.tuning.cloud_min_y..=self.tuning.viewport_height / 2.0),
            speed: self.rng.gen_range(lo..=hi),
        };
        debug!("Spawned cloud at y={:.0} speed={:.2}", cloud.y, cloud.speed);
        self.clouds.push(cloud);
        self.schedule_cloud();
    }

    fn schedule_cloud(&mut self) {
        let (lo, hi) = self.tuning.cloud_delay_ms;
        let delay = Duration::from_millis(self.rng.gen_range(lo..=hi));
        self.timers.cloud.once(self.clock, delay);
    }

    fn hitbox(&self) -> Rect {
        self.player
            .sprite()
            .inset(self.tuning.hitbox_offset, self.tuning.hitbox_size)
    }

    fn collides(&self) -> bool {
        let hitbox = self.hitbox();
        self.obstacles.iter().any(|o| hitbox.overlaps(&o.rect()))
    }

    fn game_over(&mut self, events: &mut Vec<RunEvent>) {
        self.phase = Phase::GameOver;
        self.player.tinted = true;
        self.timers.animation.cancel();
        self.timers.obstacle.cancel();
        self.timers.cloud.cancel();
        info!(
            "Game over at score {} (high score {})",
            self.display_score(),
            self.high_score
        );
        events.push(RunEvent::Sound(Sound::Defeat));
        events.push(RunEvent::GameOver {
            display_score: self.display_score(),
            high_score: self.high_score,
        });
    }
}

fn mode_name(dark: bool) -> &'static str {
    if dark { "night" } else { "day" }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_micros(16_667);

    fn run() -> Run {
        Run::new(Tuning::default(), StdRng::seed_from_u64(7))
    }

    fn sounds(events: &[RunEvent], sound: Sound) -> usize {
        events
            .iter()
            .filter(|e| **e == RunEvent::Sound(sound))
            .count()
    }

    /// An obstacle sitting on the player.
    fn place_obstacle_on_player(run: &mut Run) {
        let body = Body {
            x: run.tuning.player_x,
            y: run.tuning.ground_y(),
            vx: run.tuning.obstacle_velocity,
            ..Body::default()
        };
        run.obstacles.push(Obstacle {
            kind: ObstacleKind::Single,
            body,
        });
    }

    #[test]
    fn starts_running_with_timers_armed() {
        let run = run();
        assert_eq!(run.phase(), Phase::Running);
        assert_eq!(run.score(), 0);
        assert!(run.timers().obstacle.is_pending());
        assert!(run.timers().cloud.is_pending());
        assert!(run.timers().animation.is_pending());
        assert_eq!(run.player().body.y, 1070.0);
    }

    #[test]
    fn five_hundred_frames_without_obstacles() {
        let mut run = run();
        let mut events = Vec::new();
        for _ in 0..500 {
            events.extend(run.update());
        }
        assert_eq!(run.score(), 500);
        assert_eq!(run.display_score(), 50);
        assert_eq!(sounds(&events, Sound::Point), 1);
        assert_eq!(run.phase(), Phase::Running);
        assert_eq!(run.high_score(), 50);
    }

    #[test]
    fn display_score_is_monotone_and_bounded_by_high_score() {
        let mut run = run();
        let mut last = run.display_score();
        for _ in 0..3000 {
            run.update();
            assert!(run.display_score() >= last);
            assert!(run.high_score() >= run.display_score());
            last = run.display_score();
        }
    }

    #[test]
    fn point_sound_once_per_fifty() {
        let mut run = run();
        let mut fired_at = Vec::new();
        for _ in 0..2600 {
            let events = run.update();
            if sounds(&events, Sound::Point) > 0 {
                fired_at.push(run.display_score());
            }
        }
        assert_eq!(fired_at, vec![50, 100, 150, 200, 250]);
    }

    #[test]
    fn palette_flips_once_per_hundred() {
        let mut run = run();
        let mut flips = Vec::new();
        for _ in 0..2000 {
            for event in run.update() {
                if let RunEvent::PaletteFlipped { dark } = event {
                    flips.push((run.display_score(), dark));
                }
            }
        }
        assert_eq!(flips, vec![(100, true), (200, false)]);
        assert!(!run.is_dark_mode());
    }

    #[test]
    fn palette_swap_follows_fade_out() {
        let mut run = run();
        run.score = 999;
        run.update();
        assert!(run.is_dark_mode());
        assert!(!run.fade().is_dark());

        // 500ms fade-out at 100ms a frame.
        let mut swapped = Vec::new();
        for frame in 1..=6 {
            for event in run.tick(Duration::from_millis(100)) {
                if let RunEvent::PaletteSwapped { dark } = event {
                    swapped.push((frame, dark));
                }
            }
            run.obstacles.clear();
        }
        assert_eq!(swapped, vec![(5, true)]);
        assert!(run.fade().is_dark());
    }

    #[test]
    fn jump_from_rest() {
        let mut run = run();
        assert_eq!(run.jump(), Some(RunEvent::Sound(Sound::Jump)));
        assert_eq!(run.player().body.vy, -900.0);

        run.tick(FRAME);
        let before = run.player().body;
        assert!(before.vy != 0.0);
        assert_eq!(run.jump(), None);
        assert_eq!(run.player().body, before);
    }

    #[test]
    fn jump_ignored_while_falling_below_ground() {
        let mut run = run();
        run.player.body.y = 1075.0;
        run.player.body.vy = 30.0;
        assert_eq!(run.jump(), None);
        assert_eq!(run.player().body.vy, 30.0);
    }

    #[test]
    fn standing_player_can_jump_after_ticks() {
        let mut run = run();
        for _ in 0..10 {
            run.tick(FRAME);
        }
        assert_eq!(run.player().body.y, 1070.0);
        assert_eq!(run.player().body.vy, 0.0);
        assert!(run.jump().is_some());
    }

    #[test]
    fn jump_lands_back_on_ground() {
        let mut run = run();
        run.jump();
        let mut peak = run.player().body.y;
        for _ in 0..120 {
            run.tick(FRAME);
            run.obstacles.clear();
            peak = peak.min(run.player().body.y);
        }
        // v² / 2g = 202.5
        assert!((1070.0 - peak - 202.5).abs() < 10.0, "peak {peak}");
        assert_eq!(run.player().body.y, 1070.0);
        assert_eq!(run.player().body.vy, 0.0);
    }

    #[test]
    fn collision_at_one_twenty() {
        let mut run = run();
        run.score = 1200;
        run.update();
        run.score = 1200;
        place_obstacle_on_player(&mut run);

        let events = run.tick(FRAME);
        assert_eq!(run.phase(), Phase::GameOver);
        assert_eq!(sounds(&events, Sound::Defeat), 1);
        assert!(events.contains(&RunEvent::GameOver {
            display_score: 120,
            high_score: 120,
        }));
        assert!(run.prompt_visible());
        assert!(run.player().tinted);

        run.restart();
        assert_eq!(run.high_score(), 120);
        assert_eq!(run.score(), 0);
        for _ in 0..10 {
            run.update();
        }
        assert_eq!(run.high_score(), 120);
    }

    #[test]
    fn game_over_freezes_everything() {
        let mut run = run();
        place_obstacle_on_player(&mut run);
        run.tick(FRAME);
        assert!(run.is_game_over());
        assert!(!run.timers().obstacle.is_pending());
        assert!(!run.timers().cloud.is_pending());
        assert!(!run.timers().animation.is_pending());

        let score = run.score();
        let obstacles = run.obstacles().to_vec();
        let player = run.player().clone();
        for _ in 0..600 {
            let events = run.tick(FRAME);
            assert!(events.is_empty());
        }
        assert!(run.update().is_empty());
        assert_eq!(run.score(), score);
        assert_eq!(run.obstacles(), obstacles.as_slice());
        assert_eq!(run.player(), &player);
        assert_eq!(run.jump(), None);
    }

    #[test]
    fn restart_resets_the_run() {
        let mut run = run();
        for _ in 0..200 {
            run.tick(FRAME);
            if run.clouds().len() > 1 {
                break;
            }
        }
        place_obstacle_on_player(&mut run);
        run.tick(FRAME);
        assert!(run.is_game_over());

        run.restart();
        assert_eq!(run.phase(), Phase::Running);
        assert_eq!(run.score(), 0);
        assert!(run.obstacles().is_empty());
        assert!(run.clouds().is_empty());
        assert!(run.timers().obstacle.is_pending());
        assert!(run.timers().animation.is_pending());
        assert!(!run.player().tinted);
        assert!(!run.is_dark_mode());
    }

    #[test]
    fn obstacle_spawn_reschedules_within_bounds() {
        let mut run = run();
        let mut spawns = 0;
        let mut last_due = run.timers().obstacle.due();
        for _ in 0..2000 {
            let events = run.tick(FRAME);
            // Keep the player alive.
            run.obstacles.retain(|o| o.body.x > 600.0);
            if events.iter().any(|e| matches!(e, RunEvent::ObstacleSpawned(_))) {
                spawns += 1;
                let due = run.timers().obstacle.due().unwrap();
                let delay = due - run.clock();
                assert!(delay >= Duration::from_millis(700));
                assert!(delay <= Duration::from_millis(1800));
                assert_ne!(Some(due), last_due);
                last_due = Some(due);
            }
        }
        assert!(spawns > 10);
    }

    #[test]
    fn obstacles_move_left_and_despawn() {
        let mut run = run();
        run.obstacles.push(Obstacle {
            kind: ObstacleKind::Multi,
            body: Body {
                x: -30.0,
                y: 1070.0,
                vx: -500.0,
                ..Body::default()
            },
        });
        let x0 = run.obstacles()[0].body.x;
        run.tick(FRAME);
        assert!(run.obstacles()[0].body.x < x0);
        for _ in 0..5 {
            run.tick(FRAME);
        }
        assert!(run.obstacles().is_empty());
    }

    #[test]
    fn clouds_drift_and_despawn() {
        let mut run = run();
        run.clouds.push(Cloud {
            x: 10.0,
            y: 100.0,
            speed: 3.0,
        });
        run.clouds.push(Cloud {
            x: -CLOUD_SIZE.0 + 1.0,
            y: 100.0,
            speed: 2.0,
        });
        run.update();
        assert_eq!(run.clouds().len(), 1);
        assert_eq!(run.clouds()[0].x, 7.0);
    }

    #[test]
    fn spawned_clouds_stay_in_band() {
        let mut run = run();
        for _ in 0..60 {
            run.spawn_cloud();
        }
        for cloud in run.clouds() {
            assert!((50.0..=540.0).contains(&cloud.y));
            assert!((1.0..=3.0).contains(&cloud.speed));
        }
    }

    #[test]
    fn animation_alternates_frames() {
        let mut run = run();
        assert_eq!(run.player().frame, 0);
        run.tick(Duration::from_millis(120));
        assert_eq!(run.player().frame, 1);
        run.tick(Duration::from_millis(120));
        assert_eq!(run.player().frame, 0);
    }

    #[test]
    fn forgiving_hitbox() {
        let mut run = run();
        // Overlaps the sprite's left 20% but not the hitbox.
        run.obstacles.push(Obstacle {
            kind: ObstacleKind::Single,
            body: Body {
                x: run.player().sprite().x - 20.0,
                y: 1070.0,
                ..Body::default()
            },
        });
        assert!(run.player().sprite().overlaps(&run.obstacles()[0].rect()));
        assert!(!run.collides());
    }

    #[test]
    fn clouds_never_collide() {
        let mut run = run();
        let hitbox = run.hitbox();
        run.clouds.push(Cloud {
            x: hitbox.x,
            y: hitbox.y,
            speed: 0.0,
        });
        assert!(hitbox.overlaps(&run.clouds()[0].rect()));

        for _ in 0..30 {
            run.obstacles.clear();
            let events = run.tick(FRAME);
            assert!(!events.iter().any(|e| matches!(e, RunEvent::GameOver { .. })));
        }
        assert_eq!(run.phase(), Phase::Running);
        assert!(run.clouds().iter().any(|c| c.speed == 0.0));
    }
}
