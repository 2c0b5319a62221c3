//! Game - the per-tick orchestrator
//!
//! Owns the session, the piece registry, the lifecycle controller, the task
//! queue and the physics world, and runs them in a fixed order each tick:
//!
//! 1. advance the clock and run due deferred tasks
//! 2. steer the active piece
//! 3. step the physics world
//! 4. settle check (a settle triggers clear evaluation)
//! 5. pile monitor (the pile coming to rest triggers clear evaluation)
//!
//! Nothing runs unless the phase is `Playing`.

use crate::catalog::local_offsets;
use crate::cluster::{plan_clears, ClearPlan};
use crate::config::EngineConfig;
use crate::highscore::{HighScoreStore, MemoryHighScore};
use crate::lifecycle::{LifecycleController, SettleReason, SpawnOutcome};
use crate::physics::{CompoundDesc, PhysicsWorld};
use crate::piece::{Piece, PieceId, PieceRegistry, PieceState};
use crate::pile::{self, PileScan};
use crate::progression::{award, min_cluster_for_level};
use crate::scheduler::{TaskKind, TaskQueue};
use crate::session::GameSession;
use crate::snapshot::{GameSnapshot, PieceSnapshot, PileSnapshot};
use crate::types::{GameEvent, Intent, PieceKind, Vec2};

pub struct Game<W: PhysicsWorld, H: HighScoreStore = MemoryHighScore> {
    config: EngineConfig,
    world: W,
    store: H,
    session: GameSession,
    registry: PieceRegistry,
    lifecycle: LifecycleController,
    tasks: TaskQueue,
    events: Vec<GameEvent>,
    pile: PileScan,
    seed: u32,
}

impl<W: PhysicsWorld, H: HighScoreStore> Game<W, H> {
    pub fn new(config: EngineConfig, world: W, store: H, seed: u32) -> Self {
        let min_cluster = min_cluster_for_level(&config.progression, 1);
        let session = GameSession::new(store.load(), min_cluster);
        Self {
            config,
            world,
            store,
            session,
            registry: PieceRegistry::new(),
            lifecycle: LifecycleController::new(seed),
            tasks: TaskQueue::new(),
            events: Vec::new(),
            pile: PileScan::default(),
            seed,
        }
    }

    /// Begin play and spawn the first piece. No-op once started.
    pub fn start(&mut self) -> bool {
        if !self.session.start() {
            return false;
        }
        log::info!("Game started (seed {}, high score {})", self.seed, self.session.high_score());
        self.spawn_piece();
        true
    }

    /// Feed one input edge. Movement intents are held until released.
    pub fn apply_intent(&mut self, intent: Intent, pressed: bool) {
        match intent {
            Intent::PauseToggle => {
                if pressed && self.session.toggle_pause() {
                    log::debug!("Pause toggled, now {:?}", self.session.phase());
                }
            }
            Intent::Restart => {
                if pressed {
                    self.restart();
                    self.start();
                }
            }
            _ => {
                // Releases always land; presses only while playing.
                if !pressed || self.session.is_running() {
                    self.lifecycle.set_intent(intent, pressed);
                }
            }
        }
    }

    /// Advance the game by `elapsed_ms`. Returns false if nothing ran.
    pub fn tick(&mut self, elapsed_ms: u32) -> bool {
        if !self.session.is_running() {
            return false;
        }
        self.session.now_ms += elapsed_ms as u64;
        self.run_due_tasks();
        if !self.session.is_running() {
            return true;
        }

        self.lifecycle
            .apply_input(&mut self.world, &self.registry, &self.config);
        self.world.step(elapsed_ms as f32 / 1000.0);

        let now = self.session.now_ms;
        if let Some((id, reason)) =
            self.lifecycle
                .settle_check(&self.world, &mut self.registry, now, &self.config)
        {
            self.on_settled(id, reason);
            if !self.session.is_running() {
                return true;
            }
        }

        self.pile = pile::scan(&self.registry, &self.world, &self.config);
        let decision = pile::monitor(
            &mut self.session,
            &self.pile,
            self.lifecycle.active().is_some(),
            &self.config,
        );
        if decision.came_to_rest {
            self.evaluate_clears();
        }
        if decision.force_spawn && self.session.is_running() {
            log::warn!(
                "No activity for {}ms, forcing a spawn",
                now.saturating_sub(self.session.last_action_ms())
            );
            self.spawn_piece();
        }
        true
    }

    fn run_due_tasks(&mut self) {
        let due = self
            .tasks
            .take_due(self.session.now_ms, self.session.epoch());
        for task in due {
            match task.kind {
                TaskKind::SpawnPiece => {
                    if self.session.is_running() {
                        self.spawn_piece();
                    }
                }
                TaskKind::EndShake => self.session.shaking = false,
            }
        }
    }

    /// Spawn the next piece, or end the game if the spawn zone is occupied.
    pub fn spawn_piece(&mut self) -> Option<PieceId> {
        if self.session.is_game_over() {
            return None;
        }
        let now = self.session.now_ms;
        match self
            .lifecycle
            .spawn(&mut self.world, &mut self.registry, now, &self.config)
        {
            SpawnOutcome::Spawned(id, kind) => {
                self.events.push(GameEvent::PieceSpawned { piece: id.0, kind });
                Some(id)
            }
            SpawnOutcome::Blocked => {
                self.game_over();
                None
            }
            SpawnOutcome::Skipped => None,
        }
    }

    fn on_settled(&mut self, id: PieceId, reason: SettleReason) {
        let Some(kind) = self.registry.get(id).map(|p| p.kind) else {
            return;
        };
        log::debug!("Piece {} joined the pile ({reason:?})", id.0);
        self.events.push(GameEvent::PieceSettled { piece: id.0, kind });
        award(
            &mut self.session,
            &self.config.progression,
            self.config.clear.placement_points,
            &mut self.events,
        );
        self.session.touch();
        self.evaluate_clears();
        let due = self.session.now_ms + self.config.timing.spawn_delay_ms;
        self.tasks
            .schedule(TaskKind::SpawnPiece, due, self.session.epoch());
    }

    /// Find and remove every qualifying cluster in one atomic pass.
    pub fn evaluate_clears(&mut self) -> ClearPlan {
        if self.session.is_game_over() {
            return ClearPlan::default();
        }
        let plan = plan_clears(
            &self.registry,
            &self.world,
            self.session.min_cluster(),
            self.config.proximity_threshold(),
            &self.config.clear,
        );
        if plan.is_empty() {
            return plan;
        }

        for group in &plan.groups {
            for (&piece, &body) in group.pieces.iter().zip(&group.bodies) {
                self.world.remove(body);
                self.registry.remove(piece);
            }
            self.events.push(GameEvent::ClusterCleared {
                kind: group.kind,
                pieces: group.pieces.len() as u32,
                points: group.points,
            });
        }

        let mut points = plan.points();
        if self.registry.settled_count() == 0 {
            let bonus = self.config.clear.perfect_clear_bonus;
            points = points.saturating_add(bonus);
            log::info!("Perfect clear, +{bonus}");
            self.events.push(GameEvent::PerfectClear { bonus });
        }
        log::info!(
            "Cleared {} pieces in {} groups for {points}",
            plan.piece_count(),
            plan.groups.len()
        );
        award(
            &mut self.session,
            &self.config.progression,
            points,
            &mut self.events,
        );

        for body in self.world.bodies() {
            self.world.wake(body);
        }
        let shake = self.config.timing.shake_ms;
        self.session.shaking = true;
        self.events.push(GameEvent::Shake {
            duration_ms: shake as u32,
        });
        self.tasks.schedule(
            TaskKind::EndShake,
            self.session.now_ms + shake,
            self.session.epoch(),
        );
        self.session.touch();
        plan
    }

    /// Place a settled piece directly (scripted setups and tests).
    pub fn insert_settled(&mut self, kind: PieceKind, position: Vec2) -> PieceId {
        let offsets = local_offsets(kind, self.config.field.block_size);
        let handle = self.world.spawn_compound(&CompoundDesc {
            position,
            blocks: &offsets,
            block_size: self.config.field.block_size,
            material: self.config.material,
        });
        let id = self.registry.next_id();
        let now = self.session.now_ms;
        self.registry.insert(Piece {
            id,
            kind,
            state: PieceState::Settled,
            body: handle.body,
            blocks: handle.blocks,
            last_stable_position: position,
            last_stable_ms: now,
            spawned_ms: now,
        });
        id
    }

    pub fn dismiss_level_up(&mut self) -> bool {
        self.session.dismiss_level_up()
    }

    fn game_over(&mut self) {
        if !self.session.enter_game_over() {
            return;
        }
        let final_score = self.session.score();
        log::info!("Game over at level {} with {final_score}", self.session.level());
        self.events.push(GameEvent::GameOver { final_score });
        self.persist_high_score();
    }

    /// Write the session high score to the store if it beats the stored one.
    pub fn persist_high_score(&mut self) {
        let high = self.session.high_score();
        if high <= self.store.load() {
            return;
        }
        if let Err(e) = self.store.save(high) {
            log::warn!("Failed to persist high score: {e:#}");
        }
    }

    /// Tear everything down into a fresh, not-yet-started session.
    pub fn restart(&mut self) {
        self.persist_high_score();
        for body in self.world.bodies() {
            self.world.remove(body);
        }
        self.registry.clear();
        self.tasks.clear();
        self.lifecycle.reset();
        self.events.clear();
        self.pile = PileScan::default();

        let min_cluster = min_cluster_for_level(&self.config.progression, 1);
        self.session = self.session.restarted(self.store.load(), min_cluster);
        log::info!("Restarted (epoch {})", self.session.epoch());
    }

    /// Drain events produced since the last call.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        out.clear();
        let s = &self.session;
        out.phase = s.phase();
        out.paused = s.is_paused();
        out.game_over = s.is_game_over();
        out.shaking = s.shaking;
        out.score = s.score();
        out.high_score = s.high_score();
        out.final_score = s.final_score();
        out.level = s.level();
        out.min_cluster = s.min_cluster();
        out.now_ms = s.now_ms();
        out.epoch = s.epoch();
        out.seed = self.seed;

        for piece in self.registry.iter() {
            let Some(position) = self.world.position(piece.body) else {
                continue;
            };
            let snap = PieceSnapshot::new(
                piece.id,
                piece.kind,
                piece.state,
                position,
                self.world.velocity(piece.body).unwrap_or(Vec2::ZERO),
                self.world.block_positions(piece.body),
            );
            match piece.state {
                PieceState::Active => out.active = Some(snap),
                PieceState::Settled => out.pile.push(snap),
            }
        }

        out.pile_stats = PileSnapshot {
            settled: self.pile.settled,
            moving: self.pile.moving,
            height: self.pile.height,
            fill_percent: self.pile.fill_percent,
            danger: self.pile.is_danger(&self.config),
        };
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn registry(&self) -> &PieceRegistry {
        &self.registry
    }

    pub fn active(&self) -> Option<&Piece> {
        self.lifecycle.active().and_then(|id| self.registry.get(id))
    }

    pub fn pile(&self) -> &PileScan {
        &self.pile
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn store(&self) -> &H {
        &self.store
    }

    pub fn pending_tasks(&self) -> &TaskQueue {
        &self.tasks
    }

    pub fn score(&self) -> u32 {
        self.session.score()
    }

    pub fn level(&self) -> u32 {
        self.session.level()
    }
}
