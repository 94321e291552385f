//! The scene: entity ownership, the deletion queue, lighting, play state and
//! the per-frame sequence.
//!
//! # Invariants
//! - Entities leave the live set only inside [`Scene::flush_deletions`],
//!   which never runs while a component pass is iterating the arena.
//! - The pending set is empty after every flush.
//! - Component callbacks cannot reach the scene; they queue [`Command`]s
//!   that are applied at flush points.
//! - `Ended` is terminal.

use cellops_common::{AssetId, Guid, Light, Transform};
use cellops_ecs::components::{
    Camera, EnemyBehaviour, EnemySpawnerBehaviour, RenderComponent, TargetBehaviour,
    TargetController, WaveComposition,
};
use cellops_ecs::{
    Command, Component, ComponentContext, ComponentSet, DebugUi, Entity, EntityArena,
    EntityBlueprint, EntityHandle, HierarchyError, SceneRng,
};
use cellops_input::{FrameInput, Signal};
use cellops_physics::{PhysicsBridge, PhysicsEngine, SimplePhysics, TriggerEnter};
use glam::{Mat4, Quat};
use serde::{Deserialize, Serialize};

use crate::config::{GameConfig, RoundThreshold};
use crate::event::SceneEvent;
use crate::lighting::{LightList, LightingBuffer};
use crate::state::{Outcome, PlayState};

/// Skybox asset references. The runtime only carries them for the renderer
/// and for persistence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Skybox {
    pub mesh: Option<AssetId>,
    pub shader: Option<AssetId>,
    pub texture: Option<AssetId>,
    pub orientation: Quat,
}

/// One draw the rendering collaborator should make this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderItem {
    pub entity: EntityHandle,
    pub mesh: AssetId,
    pub material: AssetId,
    pub world: Mat4,
}

#[derive(Debug)]
pub struct Scene {
    arena: EntityArena,
    pending: Vec<EntityHandle>,
    commands: Vec<Command>,
    lights: LightList,
    skybox: Skybox,
    default_material: Option<AssetId>,
    main_camera: Option<EntityHandle>,
    state: PlayState,
    game_started: bool,
    round: u32,
    kills: u32,
    cheat_activated: bool,
    config: GameConfig,
    physics: PhysicsBridge,
    rng: SceneRng,
    events: Vec<SceneEvent>,
    is_awake: bool,
    window_size: (u32, u32),
}

impl Scene {
    /// A scene with a "Main Camera" entity, as the editor creates it.
    pub fn new(config: GameConfig) -> Self {
        let mut scene = Self::empty(config);
        let camera = scene.create_entity("Main Camera");
        if let Some(entity) = scene.arena.get_mut(camera) {
            if let Err(e) = entity.add_component(Camera::default()) {
                tracing::warn!("main camera setup failed: {e}");
            }
        }
        scene.main_camera = Some(camera);
        scene
    }

    /// A scene with no entities, backed by [`SimplePhysics`].
    pub fn empty(config: GameConfig) -> Self {
        let engine = SimplePhysics::new(config.physics.fixed_time_step);
        Self::with_engine(config, Box::new(engine))
    }

    pub fn with_engine(config: GameConfig, engine: Box<dyn PhysicsEngine>) -> Self {
        let physics = PhysicsBridge::new(
            engine,
            config.physics.gravity,
            config.physics.max_sub_steps,
        );
        Self {
            arena: EntityArena::new(),
            pending: Vec::new(),
            commands: Vec::new(),
            lights: LightList::new(config.lighting.ambient),
            skybox: Skybox::default(),
            default_material: None,
            main_camera: None,
            state: PlayState::Editing,
            game_started: false,
            round: 0,
            kills: 0,
            cheat_activated: false,
            rng: SceneRng::with_seed(config.seed),
            physics,
            config,
            events: Vec::new(),
            is_awake: false,
            window_size: (1280, 720),
        }
    }

    // --- Accessors ---

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn kills(&self) -> u32 {
        self.kills
    }

    pub fn is_game_started(&self) -> bool {
        self.game_started
    }

    pub fn is_awake(&self) -> bool {
        self.is_awake
    }

    pub fn is_cheat_activated(&self) -> bool {
        self.cheat_activated
    }

    pub fn arena(&self) -> &EntityArena {
        &self.arena
    }

    pub fn entity_count(&self) -> usize {
        self.arena.len()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.arena.iter()
    }

    pub fn entity(&self, handle: EntityHandle) -> Option<&Entity> {
        self.arena.get(handle)
    }

    pub fn entity_mut(&mut self, handle: EntityHandle) -> Option<&mut Entity> {
        self.arena.get_mut(handle)
    }

    pub fn physics(&self) -> &PhysicsBridge {
        &self.physics
    }

    pub fn rng(&self) -> &SceneRng {
        &self.rng
    }

    pub fn lights(&self) -> &LightList {
        &self.lights
    }

    /// Light edits refresh the mirror buffer immediately.
    pub fn lights_mut(&mut self) -> &mut LightList {
        &mut self.lights
    }

    pub fn lighting_buffer(&self) -> &LightingBuffer {
        self.lights.buffer()
    }

    pub fn skybox(&self) -> &Skybox {
        &self.skybox
    }

    pub fn set_skybox(&mut self, skybox: Skybox) {
        self.skybox = skybox;
    }

    pub fn default_material(&self) -> Option<AssetId> {
        self.default_material
    }

    pub fn set_default_material(&mut self, material: Option<AssetId>) {
        self.default_material = material;
    }

    pub fn main_camera(&self) -> Option<EntityHandle> {
        self.main_camera
    }

    pub fn set_main_camera(&mut self, camera: Option<EntityHandle>) {
        self.main_camera = camera;
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Entities ---

    pub fn create_entity(&mut self, name: impl Into<String>) -> EntityHandle {
        self.create_entity_with(name, Guid::new(), Transform::default())
    }

    /// Create an entity with a known identity, e.g. when loading.
    pub fn create_entity_with(
        &mut self,
        name: impl Into<String>,
        guid: Guid,
        transform: Transform,
    ) -> EntityHandle {
        let name = name.into();
        tracing::debug!(%guid, name = %name, "entity created");
        self.events.push(SceneEvent::EntityCreated {
            guid,
            name: name.clone(),
        });
        self.arena.insert(name, guid, transform)
    }

    pub fn add_child(&mut self, parent: EntityHandle, child: EntityHandle) -> Result<(), HierarchyError> {
        self.arena.add_child(parent, child)
    }

    pub fn remove_child(&mut self, parent: EntityHandle, child: EntityHandle) -> Result<(), HierarchyError> {
        self.arena.remove_child(parent, child)
    }

    pub fn find_by_name(&self, name: &str) -> Option<EntityHandle> {
        self.arena.find_by_name(name)
    }

    pub fn find_by_guid(&self, guid: Guid) -> Option<EntityHandle> {
        self.arena.find_by_guid(guid)
    }

    /// Live and not queued for deletion.
    pub fn is_live(&self, handle: EntityHandle) -> bool {
        self.arena.contains(handle) && !self.pending.contains(&handle)
    }

    pub fn is_pending(&self, handle: EntityHandle) -> bool {
        self.pending.contains(&handle)
    }

    /// Queue an entity for removal at the next flush. Returns false for stale
    /// handles and entities already queued.
    pub fn request_destroy(&mut self, handle: EntityHandle) -> bool {
        if !self.is_live(handle) {
            return false;
        }
        self.pending.push(handle);
        true
    }

    /// Apply queued commands, then remove every pending entity. Returns the
    /// number of entities removed.
    pub fn flush_deletions(&mut self) -> usize {
        self.apply_commands();

        let mut removed = 0;
        for handle in std::mem::take(&mut self.pending) {
            let Some(entity) = self.arena.remove(handle) else {
                continue;
            };
            if self.main_camera == Some(handle) {
                self.main_camera = None;
            }
            tracing::debug!(guid = %entity.guid(), name = %entity.name(), "entity destroyed");
            self.events.push(SceneEvent::EntityDestroyed {
                guid: entity.guid(),
                name: entity.name().to_owned(),
            });
            removed += 1;
        }
        if removed > 0 {
            self.physics.sync(&self.arena);
        }
        removed
    }

    /// Create an entity from a blueprint. Spawned entities are awoken right
    /// away once the scene itself is awake.
    pub fn spawn(&mut self, blueprint: EntityBlueprint) -> EntityHandle {
        let EntityBlueprint {
            name,
            transform,
            parent,
            components,
        } = blueprint;
        let handle = self.create_entity_with(name, Guid::new(), transform);
        if let Some(entity) = self.arena.get_mut(handle) {
            for component in components {
                if let Err(e) = entity.components_mut().insert_boxed(component) {
                    tracing::warn!(name = %entity.name(), "spawn skipped a component: {e}");
                }
            }
        }
        if let Some(parent) = parent {
            if let Err(e) = self.arena.add_child(parent, handle) {
                tracing::warn!("spawned entity left unparented: {e}");
            }
        }
        if self.is_awake {
            self.awake_entity(handle);
        }
        handle
    }

    fn apply_commands(&mut self) {
        while !self.commands.is_empty() {
            for command in std::mem::take(&mut self.commands) {
                match command {
                    Command::Destroy(handle) => {
                        self.request_destroy(handle);
                    }
                    Command::Spawn(blueprint) => {
                        self.spawn(blueprint);
                    }
                    Command::EnemyKilled(handle) => {
                        if self.is_live(handle) {
                            self.record_kill(handle);
                        }
                    }
                    Command::TargetDestroyed(handle) => {
                        if let Some(guid) = self.arena.get(handle).map(Entity::guid) {
                            if self.request_destroy(handle) {
                                tracing::info!(%guid, "target destroyed");
                                self.events.push(SceneEvent::TargetDestroyed { guid });
                            }
                        }
                    }
                    Command::TargetsExhausted => self.end(Outcome::Lost),
                }
            }
        }
    }

    /// Run `f` against one entity's components with a context borrowing the
    /// rest of the scene. The entity's transform edits are written back.
    fn with_components(
        &mut self,
        handle: EntityHandle,
        f: impl FnOnce(&mut ComponentSet, &mut ComponentContext<'_>),
    ) {
        let Some(mut transform) = self.arena.get(handle).map(|e| *e.transform()) else {
            return;
        };
        let Some(mut components) = self.arena.take_components(handle) else {
            return;
        };
        {
            let mut ctx = ComponentContext::new(
                handle,
                &mut transform,
                &self.arena,
                &self.pending,
                &mut self.rng,
                &mut self.commands,
            );
            f(&mut components, &mut ctx);
        }
        if let Some(entity) = self.arena.get_mut(handle) {
            entity.set_transform(transform);
        }
        self.arena.restore_components(handle, components);
    }

    fn awake_entity(&mut self, handle: EntityHandle) {
        self.with_components(handle, |components, ctx| components.awake(ctx));
    }

    /// Awake every entity in insertion order, then register physics objects.
    pub fn awake(&mut self) {
        let (width, height) = self.window_size;
        self.resize_main_camera(width, height);
        for handle in self.arena.handles() {
            self.awake_entity(handle);
        }
        self.is_awake = true;
        self.physics.sync(&self.arena);
        self.apply_commands();
        tracing::info!(entities = self.arena.len(), "scene awake");
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
        self.resize_main_camera(width, height);
    }

    fn resize_main_camera(&mut self, width: u32, height: u32) {
        let camera = self
            .main_camera
            .and_then(|h| self.arena.get_mut(h))
            .and_then(|e| e.get_component_mut::<Camera>());
        if let Some(camera) = camera {
            camera.resize_window(width, height);
        }
    }

    // --- Queries ---

    fn owner_of<C: Component>(&self) -> Option<EntityHandle> {
        self.arena
            .iter()
            .find(|e| e.get_component::<C>().is_some() && !self.pending.contains(&e.handle()))
            .map(Entity::handle)
    }

    fn live_with<C: Component>(&self) -> Vec<EntityHandle> {
        self.arena
            .iter()
            .filter(|e| e.get_component::<C>().is_some())
            .map(Entity::handle)
            .filter(|h| !self.pending.contains(h))
            .collect()
    }

    pub fn targets(&self) -> Vec<EntityHandle> {
        self.live_with::<TargetBehaviour>()
    }

    pub fn enemies(&self) -> Vec<EntityHandle> {
        self.live_with::<EnemyBehaviour>()
    }

    /// A random live target. With none left this is the loss condition: the
    /// game ends and the result is empty.
    pub fn find_random_target(&mut self) -> Option<EntityHandle> {
        let targets = self.targets();
        if targets.is_empty() {
            self.end(Outcome::Lost);
            return None;
        }
        Some(targets[self.rng.index(targets.len())])
    }

    // --- Play state ---

    fn set_state(&mut self, to: PlayState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        tracing::info!(%from, %to, "play state changed");
        self.events.push(SceneEvent::PlayStateChanged { from, to });
    }

    fn end(&mut self, outcome: Outcome) {
        if self.state.is_ended() {
            return;
        }
        self.set_state(PlayState::Ended(outcome));
        if outcome == Outcome::Lost {
            if let Some(player) = self.find_by_name(&self.config.player_name) {
                self.request_destroy(player);
            }
        }
    }

    /// Leave editing and start the game. Only the first call has an effect.
    pub fn start(&mut self) -> bool {
        if self.game_started || self.state != PlayState::Editing {
            return false;
        }
        self.set_state(PlayState::Playing);
        self.start_game();
        true
    }

    fn start_game(&mut self) {
        if !self.is_awake {
            self.awake();
        }
        self.game_started = true;
        self.round = 1;
        self.kills = 0;

        let targets = self.spawn_targets();
        self.lights.clear();
        let lighting = self.config.lighting;
        for target in &targets {
            let Some(position) = self.arena.world_position(*target) else {
                continue;
            };
            let light = Light {
                position,
                color: lighting.target_light_color,
                range: lighting.target_light_range,
            };
            if let Err(e) = self.lights.add(light) {
                tracing::warn!("not every target gets a light: {e}");
                break;
            }
        }
        self.events.push(SceneEvent::LightsRebuilt {
            count: self.lights.len(),
        });

        self.request_wave(self.config.rounds.initial_wave);
        self.events.push(SceneEvent::GameStarted {
            targets: targets.len(),
        });
        tracing::info!(targets = targets.len(), "game started");
    }

    fn spawn_targets(&mut self) -> Vec<EntityHandle> {
        let controller = self
            .owner_of::<TargetController>()
            .and_then(|h| self.arena.get(h))
            .and_then(|e| e.get_component::<TargetController>())
            .cloned();
        let Some(controller) = controller else {
            tracing::warn!("no target controller in scene; starting without targets");
            return Vec::new();
        };
        let holder = match self.find_by_name(&controller.holder_name) {
            Some(holder) => holder,
            None => self.create_entity(controller.holder_name.clone()),
        };
        controller
            .spawn_targets(&mut self.rng, Some(holder))
            .into_iter()
            .map(|bp| self.spawn(bp))
            .collect()
    }

    /// Queue a wave from the scene's enemy spawner. Returns the number of
    /// enemies queued.
    pub fn request_wave(&mut self, wave: WaveComposition) -> usize {
        let Some(spawner) = self.owner_of::<EnemySpawnerBehaviour>() else {
            tracing::warn!(?wave, "no enemy spawner in scene; wave dropped");
            return 0;
        };
        let blueprints = match self
            .arena
            .get(spawner)
            .and_then(|e| e.get_component::<EnemySpawnerBehaviour>())
        {
            Some(spawner) => spawner.spawn_wave(wave, &mut self.rng),
            None => return 0,
        };
        let count = blueprints.len();
        self.commands
            .extend(blueprints.into_iter().map(Command::Spawn));
        tracing::info!(round = self.round, ?wave, "wave requested");
        self.events.push(SceneEvent::WaveRequested {
            round: self.round,
            wave,
        });
        count
    }

    fn increase_enemy_speed(&mut self) {
        let spawner = self
            .owner_of::<EnemySpawnerBehaviour>()
            .and_then(|h| self.arena.get_mut(h))
            .and_then(|e| e.get_component_mut::<EnemySpawnerBehaviour>());
        if let Some(spawner) = spawner {
            spawner.increase_enemy_speed();
        }
    }

    fn heal_targets(&mut self) -> usize {
        let mut count = 0;
        for handle in self.targets() {
            if let Some(target) = self
                .arena
                .get_mut(handle)
                .and_then(|e| e.get_component_mut::<TargetBehaviour>())
            {
                target.heal();
                count += 1;
            }
        }
        self.events.push(SceneEvent::TargetsHealed { count });
        count
    }

    fn record_kill(&mut self, enemy: EntityHandle) {
        self.kills += 1;
        if let Some(guid) = self.arena.get(enemy).map(Entity::guid) {
            tracing::info!(%guid, kills = self.kills, "enemy killed");
            self.events.push(SceneEvent::EnemyKilled {
                guid,
                kills: self.kills,
            });
        }
        self.request_destroy(enemy);
    }

    /// Damage an enemy on behalf of the player or an ability. Returns true
    /// when this hit killed it.
    pub fn apply_damage(&mut self, enemy: EntityHandle, amount: f32) -> bool {
        if !self.is_live(enemy) {
            return false;
        }
        let killed = self
            .arena
            .get_mut(enemy)
            .and_then(|e| e.get_component_mut::<EnemyBehaviour>())
            .is_some_and(|b| b.take_damage(amount));
        if killed {
            self.record_kill(enemy);
        }
        killed
    }

    /// Table-driven round progression; runs while playing, after updates.
    fn check_progression(&mut self) {
        if self.kills > self.config.win_kills {
            self.end(Outcome::Won);
            return;
        }
        if self.kills == 0 || !self.enemies().is_empty() {
            return;
        }
        if self.kills == self.config.win_kills {
            self.end(Outcome::Won);
        } else if let Some(threshold) = self.config.rounds.threshold(self.kills).cloned() {
            self.advance_round(&threshold);
        }
        self.cheat_activated = false;
    }

    fn advance_round(&mut self, threshold: &RoundThreshold) {
        self.heal_targets();
        self.round += 1;
        tracing::info!(round = self.round, "round advanced");
        self.events.push(SceneEvent::RoundAdvanced { round: self.round });
        self.increase_enemy_speed();
        match threshold.wave_for(self.round) {
            Some(wave) => {
                self.request_wave(wave);
            }
            None => tracing::warn!(round = self.round, kills = threshold.kills, "no wave rule matches"),
        }
        self.kills = 0;
    }

    fn handle_signals(&mut self, input: &FrameInput) {
        for &signal in input.signals() {
            match signal {
                Signal::Cheat => {
                    if self.state == PlayState::Paused && !self.cheat_activated {
                        self.kills = self.config.cheat_kills;
                        self.cheat_activated = true;
                        tracing::info!(kills = self.kills, "cheat activated");
                        self.events.push(SceneEvent::CheatActivated { kills: self.kills });
                    }
                }
                Signal::TogglePause => match self.state {
                    PlayState::Playing => self.set_state(PlayState::Paused),
                    PlayState::Paused => self.set_state(PlayState::Playing),
                    _ => {}
                },
                Signal::Start => {
                    self.start();
                }
            }
        }
    }

    // --- Frame ---

    /// Per-entity update pass. Destruction requested during the pass only
    /// takes effect at the next flush.
    pub fn update(&mut self, dt: f32) {
        for handle in self.arena.handles() {
            if self.pending.contains(&handle) {
                continue;
            }
            self.with_components(handle, |components, ctx| components.update(ctx, dt));
        }
    }

    fn dispatch_triggers(&mut self, enters: Vec<TriggerEnter>) {
        for enter in enters {
            if !self.is_live(enter.volume_owner) || !self.is_live(enter.other) {
                continue;
            }
            self.with_components(enter.volume_owner, |components, ctx| {
                components.on_trigger_entered(ctx, enter.other)
            });
        }
    }

    /// One frame: signals, flush, update and progression (when playing),
    /// physics sync and step, trigger callbacks, flush.
    pub fn frame(&mut self, input: &FrameInput) {
        let dt = input.delta_time;
        let _span = tracing::info_span!("scene_frame", state = %self.state).entered();

        if !self.is_awake {
            self.awake();
        }
        if !self.state.is_ended() {
            self.handle_signals(input);
        }

        self.flush_deletions();

        if self.state.is_playing() {
            self.update(dt);
            if self.game_started {
                self.check_progression();
            }
        }

        self.physics.sync(&self.arena);
        self.physics.pre_step(&self.arena);
        self.physics.step_if_playing(dt, self.state.is_playing());
        let enters = self.physics.post_step(&mut self.arena);
        self.dispatch_triggers(enters);

        self.flush_deletions();
    }

    // --- Render prep ---

    /// Renderable entities with their resolved material. A missing material
    /// falls back to the scene default; without one the draw is skipped.
    pub fn renderables(&self) -> Vec<RenderItem> {
        let mut items = Vec::new();
        for entity in self.arena.iter() {
            if self.pending.contains(&entity.handle()) {
                continue;
            }
            let Some(render) = entity.get_component::<RenderComponent>() else {
                continue;
            };
            let Some(mesh) = render.mesh else {
                continue;
            };
            let Some(material) = render.material.or(self.default_material) else {
                tracing::warn!(name = %entity.name(), "renderable has no material and no scene default; skipped");
                continue;
            };
            let world = self
                .arena
                .world_matrix(entity.handle())
                .unwrap_or(Mat4::IDENTITY);
            items.push(RenderItem {
                entity: entity.handle(),
                mesh,
                material,
                world,
            });
        }
        items
    }

    /// Draw debug panels for root entities; children are drawn through their
    /// parent. Active in every play state.
    pub fn render_debug_ui(&mut self, ui: &mut DebugUi) {
        let roots: Vec<EntityHandle> = self
            .arena
            .iter()
            .filter(|e| e.parent().is_none())
            .map(Entity::handle)
            .collect();
        for root in roots {
            self.draw_entity_ui(root, ui);
        }
    }

    fn draw_entity_ui(&mut self, handle: EntityHandle, ui: &mut DebugUi) {
        let Some(entity) = self.arena.get_mut(handle) else {
            return;
        };
        ui.section(entity.name());
        ui.vec3("Position", entity.position());
        entity.components_mut().render_debug_ui(ui);
        let children = entity.children().to_vec();
        for child in children {
            self.draw_entity_ui(child, ui);
        }
    }
}
