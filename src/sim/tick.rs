//! Per-tick simulation
//!
//! Advances a [`GameState`] by one variable timestep. The update order is
//! fixed; later steps see the results of earlier ones within the same tick.

use super::enemy::{ActionKind, EnemyAction, EnemyKind};
use super::geometry::{Direction, Point, Rectangle};
use super::movement::{displacement, resolve_movement};
use super::player::InputSnapshot;
use super::projectile::{Bullet, Explosive, Flight, Owner};
use super::state::{GameEvent, GameState};
use crate::catalog::{Catalog, Item, WeaponCategory};
use crate::error::{CatalogError, SimError};

/// An enemy that died this tick, for scoring
#[derive(Debug, Clone, Copy)]
struct Kill {
    kind: EnemyKind,
    killer: Option<usize>,
}

/// What a player's selected item puts into the world
#[derive(Debug, Clone, Copy)]
enum Launch {
    Bullet { speed: f64, range: f64, explosive: bool },
    Explosive { speed: f64, range: f64, on_contact: bool },
}

/// Advance the mission by `elapsed_ms`. Does nothing once the mission is
/// won or lost.
pub fn tick(state: &mut GameState, inputs: &[InputSnapshot], elapsed_ms: f64) -> Result<(), SimError> {
    if state.is_over() {
        return Ok(());
    }
    let elapsed = elapsed_ms.max(0.0);
    state.time_ms += elapsed;

    update_players(state, inputs, elapsed);
    move_players(state, elapsed);
    update_enemies(state, elapsed);
    update_bullets(state, elapsed);
    update_explosions(state, elapsed);
    update_explosives(state, elapsed);
    resolve_weapon_actions(state)?;
    resolve_player_hits(state);
    let kills = resolve_enemy_hits(state);
    award_kills(state, &kills);
    check_goal(state);
    scroll(state, elapsed);
    check_lost(state);

    Ok(())
}

fn update_players(state: &mut GameState, inputs: &[InputSnapshot], elapsed: f64) {
    let mut finished = Vec::new();
    for (index, player) in state.players.iter_mut().enumerate() {
        if !player.alive {
            continue;
        }
        if player.behavior.dying {
            if player.behavior.advance_death(elapsed) {
                finished.push(index);
            }
            continue;
        }
        let input = inputs.get(index).copied().unwrap_or_default();
        player.behavior.update(&input, elapsed);
        player.behavior.advance_invincibility(elapsed);
    }

    for index in finished {
        finish_player_death(state, index);
    }
}

fn finish_player_death(state: &mut GameState, index: usize) {
    let unlimited = state.settings.unlimited_lives;
    let invincibility = state.tuning().invincibility_ms;
    let bounds = state.level.play_field().inset(state.tuning().border_margin);
    let player = &mut state.players[index];

    if !unlimited {
        let lives = player.profile.lives().saturating_sub(1);
        player.profile.set_lives(lives);
    }

    if unlimited || player.profile.lives() > 0 {
        player.rect = player.rect.clamped_into(&bounds);
        player.behavior.start_invincibility(invincibility);
        state.events.push(GameEvent::PlayerRespawned { player: index });
    } else {
        player.alive = false;
        log::info!("Player {} eliminated", index);
        state.events.push(GameEvent::PlayerEliminated { player: index });
    }
}

fn move_players(state: &mut GameState, elapsed: f64) {
    let tuning = &state.settings.tuning;
    let bounds = state.level.play_field().inset(tuning.border_margin);

    // Static obstacles plus wrecks that block while burning out
    let mut blockers: Vec<Rectangle> = state.level.visible_obstacles().map(|o| o.rect).collect();
    blockers.extend(
        state
            .enemies
            .iter()
            .filter(|e| e.dying && e.capabilities().is_obstacle_when_dying)
            .map(|e| e.rect),
    );

    for player in state.players.iter_mut() {
        if !player.is_active() || !player.behavior.moving {
            continue;
        }
        let direction = player.behavior.direction;
        let delta = displacement(elapsed, direction, tuning.player_speed, None);
        player.rect = resolve_movement(&player.rect, direction, delta, &blockers).clamped_into(&bounds);
    }
}

fn update_enemies(state: &mut GameState, elapsed: f64) {
    let mut actions = Vec::new();
    for enemy in state.enemies.iter_mut() {
        if enemy.dying {
            continue;
        }
        enemy.advance_movement(elapsed);
        if let Some(action) = enemy.advance_actions(elapsed) {
            actions.push((enemy.center(), enemy.viewing_direction, action));
        }
    }

    state.enemies.retain_mut(|enemy| {
        if enemy.advance_death(elapsed) {
            log::debug!("Enemy {} removed", enemy.id);
            return false;
        }
        !enemy.is_depleted()
    });

    for (origin, direction, action) in actions {
        match action {
            EnemyAction::Fire(ActionKind::Bullet) => {
                let tuning = state.tuning();
                let launch = Launch::Bullet {
                    speed: tuning.enemy_bullet_speed,
                    range: tuning.enemy_bullet_range,
                    explosive: false,
                };
                launch_projectile(state, origin, direction, launch, Owner::Enemy);
            }
            EnemyAction::Fire(ActionKind::Grenade) => {
                let tuning = state.tuning();
                let launch = Launch::Explosive {
                    speed: tuning.enemy_grenade_speed,
                    range: tuning.enemy_grenade_range,
                    on_contact: false,
                };
                launch_projectile(state, origin, direction, launch, Owner::Enemy);
            }
            EnemyAction::Spawn(spawn) => {
                state.add_enemy(spawn);
            }
        }
    }
}

fn update_bullets(state: &mut GameState, elapsed: f64) {
    let stoppers: Vec<Rectangle> = state
        .level
        .visible_obstacles()
        .filter(|o| o.stops_bullets)
        .map(|o| o.rect)
        .collect();

    let mut impacts = Vec::new();
    state.bullets.retain_mut(|bullet| {
        let reached = bullet.advance(elapsed) || bullet.flight.is_spent();
        let hit = stoppers.iter().any(|r| r.intersects(bullet.rect()));
        if !(reached || hit) {
            return true;
        }
        if bullet.explodes_on_impact {
            impacts.push((*bullet.rect(), bullet.owner));
        }
        false
    });

    for (rect, owner) in impacts {
        state.spawn_explosion(&rect, owner);
    }
}

fn update_explosions(state: &mut GameState, elapsed: f64) {
    let field = *state.level.play_field();
    for explosion in state.explosions.iter_mut() {
        explosion.tick(elapsed);
        if explosion.creates_mark() {
            state.burn_marks.push(explosion.create_mark(&field));
        }
    }
    state.explosions.retain(|e| !e.is_expired());
}

fn update_explosives(state: &mut GameState, elapsed: f64) {
    let stoppers: Vec<Rectangle> = state
        .level
        .visible_obstacles()
        .filter(|o| o.stops_explosives)
        .map(|o| o.rect)
        .collect();
    let targets: Vec<Rectangle> = state
        .enemies
        .iter()
        .filter(|e| e.is_combatant())
        .map(|e| e.rect)
        .collect();

    let mut detonated = Vec::new();
    state.explosives.retain_mut(|explosive| {
        let reached = explosive.advance(elapsed) || explosive.flight.is_spent();
        let hit = stoppers.iter().any(|r| r.intersects(explosive.rect()));
        let contact = explosive.explodes_on_contact
            && explosive.fired_by_player()
            && targets.iter().any(|r| r.intersects(explosive.rect()));
        if reached || hit || contact {
            detonated.push((*explosive.rect(), explosive.owner));
            false
        } else {
            true
        }
    });

    for (rect, owner) in detonated {
        state.spawn_explosion(&rect, owner);
    }
}

fn launch_for(catalog: &Catalog, item: &Item<'_>) -> Result<Launch, CatalogError> {
    Ok(match item {
        Item::Weapon(weapon) => {
            let ammo = catalog.ammunition(&weapon.ammunition)?;
            match weapon.category {
                WeaponCategory::Rpg => Launch::Explosive {
                    speed: ammo.speed,
                    range: ammo.range,
                    on_contact: true,
                },
                WeaponCategory::Pistol | WeaponCategory::Automatic => Launch::Bullet {
                    speed: ammo.speed,
                    range: ammo.range,
                    explosive: ammo.explosive,
                },
            }
        }
        Item::Grenade(grenade) => Launch::Explosive {
            speed: grenade.movement_speed,
            range: grenade.movement_distance,
            on_contact: false,
        },
    })
}

/// Put a projectile into the world, centered on `origin`
fn launch_projectile(state: &mut GameState, origin: Point, direction: Direction, launch: Launch, owner: Owner) {
    let id = state.next_entity_id();
    let tuning = state.tuning();
    match launch {
        Launch::Bullet { speed, range, explosive } => {
            let rect = Rectangle::centered_at(origin, tuning.bullet_size, tuning.bullet_size);
            let bullet = Bullet::new(id, Flight::new(rect, direction, speed, range), owner, explosive);
            state.bullets.push(bullet);
        }
        Launch::Explosive { speed, range, on_contact } => {
            let rect = Rectangle::centered_at(origin, tuning.explosive_size, tuning.explosive_size);
            let explosive = Explosive::new(id, Flight::new(rect, direction, speed, range), owner, on_contact);
            state.explosives.push(explosive);
        }
    }
}

fn cycle_items(state: &mut GameState, index: usize) {
    let player = &mut state.players[index];
    let forward = match (player.behavior.cycle_next_pressed, player.behavior.cycle_prev_pressed) {
        (true, false) => true,
        (false, true) => false,
        _ => return,
    };
    if let Some(item) = player.profile.cycle_item(forward) {
        let item = item.to_string();
        if player.auto_fire_looping {
            player.auto_fire_looping = false;
            state.events.push(GameEvent::AutomaticFireStopped { player: index });
        }
        state.events.push(GameEvent::ItemSelected { player: index, item });
    }
}

fn resolve_weapon_actions(state: &mut GameState) -> Result<(), SimError> {
    for index in 0..state.players.len() {
        if !state.players[index].is_active() {
            continue;
        }
        cycle_items(state, index);

        let selected = state.players[index].profile.selected_item().to_string();
        if selected.is_empty() {
            continue;
        }
        let item = state.catalog.item(&selected)?;
        let automatic = item.is_automatic();
        let interval = match item {
            Item::Weapon(weapon) => weapon.fire_interval_ms,
            Item::Grenade(_) => 0.0,
        };
        let sound = item.sound().to_string();
        let ammo_name = item.ammo_name().to_string();
        let launch = launch_for(&state.catalog, &item)?;

        let player = &mut state.players[index];
        let pressed = player.behavior.trigger_pressed;
        let held = player.behavior.firing;

        if player.auto_fire_looping && !held {
            player.auto_fire_looping = false;
            state.events.push(GameEvent::AutomaticFireStopped { player: index });
        }

        let repeat = automatic && held && !pressed && player.behavior.time_since_last_shot >= interval;
        if !(pressed || repeat) {
            continue;
        }

        if !player.profile.consume_ammo(&ammo_name) {
            if pressed {
                state.events.push(GameEvent::OutOfAmmo { player: index });
            }
            if player.auto_fire_looping {
                player.auto_fire_looping = false;
                state.events.push(GameEvent::AutomaticFireStopped { player: index });
            }
            continue;
        }

        player.behavior.shot_fired();
        if !automatic {
            state.events.push(GameEvent::WeaponFired { player: index, sound });
        } else if !player.auto_fire_looping {
            player.auto_fire_looping = true;
            state.events.push(GameEvent::AutomaticFireStarted { player: index, sound });
        }

        let origin = player.rect.center();
        let direction = player.behavior.direction;
        launch_projectile(state, origin, direction, launch, Owner::Player(index));
    }
    Ok(())
}

fn kill_player(state: &mut GameState, index: usize) {
    let duration = state.tuning().player_death_ms;
    let sound_variant = state.death_sound_variant();
    let player = &mut state.players[index];

    player.behavior.die(duration);
    if player.auto_fire_looping {
        player.auto_fire_looping = false;
        state.events.push(GameEvent::AutomaticFireStopped { player: index });
    }
    log::debug!("Player {} died", index);
    state.events.push(GameEvent::PlayerDied {
        player: index,
        sound_variant,
    });
}

fn resolve_player_hits(state: &mut GameState) {
    let death_ms = state.tuning().enemy_death_ms;

    for index in 0..state.players.len() {
        let player = &state.players[index];
        if !player.is_active() || !player.behavior.is_vulnerable() {
            continue;
        }
        let rect = player.rect;

        // Deadly contact; mines blow up as they kill
        let mut killed = false;
        let mut blast = None;
        if let Some(enemy) = state
            .enemies
            .iter_mut()
            .find(|e| e.is_combatant() && e.capabilities().is_collision_deadly && e.rect.intersects(&rect))
        {
            killed = true;
            if enemy.capabilities().is_collision_explosive {
                blast = Some(enemy.rect);
                let (id, kind) = (enemy.id, enemy.kind);
                let hook = enemy.die(death_ms);
                state.events.extend(hook);
                state.events.push(GameEvent::EnemyKilled {
                    enemy: id,
                    kind,
                    killer: None,
                });
            }
        }
        if let Some(source) = blast {
            state.spawn_explosion(&source, Owner::Enemy);
        }

        if !killed {
            killed = state.explosions.iter().any(|e| e.rect.intersects(&rect));
        }
        if !killed {
            if let Some(pos) = state
                .bullets
                .iter()
                .position(|b| !b.fired_by_player() && b.rect().intersects(&rect))
            {
                state.bullets.remove(pos);
                killed = true;
            }
        }

        if killed {
            kill_player(state, index);
        }
    }
}

/// Check every live enemy against explosions, bullets and contact
/// explosives, in that order. Returns the kills to score.
fn resolve_enemy_hits(state: &mut GameState) -> Vec<Kill> {
    let death_ms = state.tuning().enemy_death_ms;
    let mut kills = Vec::new();
    let mut secondary = Vec::new();

    for i in 0..state.enemies.len() {
        let enemy = &state.enemies[i];
        if !enemy.is_combatant() {
            continue;
        }
        let caps = enemy.capabilities();
        let (id, kind, rect) = (enemy.id, enemy.kind, enemy.rect);
        let mut killer: Option<Option<usize>> = None;

        if caps.can_die_by_explosion {
            if let Some(explosion) = state.explosions.iter().find(|e| e.rect.intersects(&rect)) {
                killer = Some(explosion.owner.player());
                if caps.is_collision_explosive {
                    secondary.push((rect, explosion.owner));
                }
            }
        }

        // Armor stops a player bullet whether or not the enemy dies
        if caps.stops_bullets {
            if let Some(pos) = state
                .bullets
                .iter()
                .position(|b| b.fired_by_player() && b.rect().intersects(&rect))
            {
                let bullet = state.bullets.remove(pos);
                state.events.push(GameEvent::Ricochet { enemy: id });
                if bullet.explodes_on_impact {
                    state.spawn_explosion(bullet.rect(), bullet.owner);
                }
            }
        }

        if killer.is_none() && caps.can_die_by_bullet {
            if let Some(pos) = state
                .bullets
                .iter()
                .position(|b| b.fired_by_player() && b.rect().intersects(&rect))
            {
                let bullet = state.bullets.remove(pos);
                killer = Some(bullet.owner.player());
                if bullet.explodes_on_impact {
                    state.spawn_explosion(bullet.rect(), bullet.owner);
                }
            }
        }

        if killer.is_none() && caps.can_die_by_explosive {
            if let Some(pos) = state
                .explosives
                .iter()
                .position(|e| e.explodes_on_contact && e.fired_by_player() && e.rect().intersects(&rect))
            {
                let explosive = state.explosives.remove(pos);
                killer = Some(explosive.owner.player());
                state.spawn_explosion(explosive.rect(), explosive.owner);
            }
        }

        if let Some(killer) = killer {
            let hook = state.enemies[i].die(death_ms);
            state.events.extend(hook);
            state.events.push(GameEvent::EnemyKilled {
                enemy: id,
                kind,
                killer,
            });
            log::debug!("Enemy {} ({:?}) killed by {:?}", id, kind, killer);
            kills.push(Kill { kind, killer });
        }
    }

    for (rect, owner) in secondary {
        state.spawn_explosion(&rect, owner);
    }
    kills
}

fn award_kills(state: &mut GameState, kills: &[Kill]) {
    for kill in kills {
        let Some(index) = kill.killer else {
            continue;
        };
        let Some(player) = state.players.get_mut(index) else {
            log::warn!("Kill credited to unknown player {}", index);
            continue;
        };
        let points = kill.kind.capabilities().points_for_kill;
        player.kills += 1;
        player.profile.add_score(points);
        player.profile.add_cash(points);
    }
}

fn check_goal(state: &mut GameState) {
    let Some(goal) = state.level.goal().copied() else {
        return;
    };
    if state
        .players
        .iter()
        .any(|p| p.is_active() && p.rect.intersects(&goal))
    {
        state.won = true;
        log::info!("Mission won after {:.0} ms", state.time_ms);
        state.emit(GameEvent::MissionWon);
    }
}

fn scroll(state: &mut GameState, elapsed: f64) {
    let segment = state.level.scroll_state().segment_index;
    let players = state.living_player_rects();
    let offset = state.level.scroll(elapsed, &players);

    if offset != Point::ZERO {
        for player in state.players.iter_mut() {
            player.rect = player.rect.offset(offset);
        }
        for bullet in state.bullets.iter_mut() {
            bullet.flight.rect = bullet.flight.rect.offset(offset);
        }
        for explosive in state.explosives.iter_mut() {
            explosive.flight.rect = explosive.flight.rect.offset(offset);
        }
        for explosion in state.explosions.iter_mut() {
            explosion.rect = explosion.rect.offset(offset);
        }
        for mark in state.burn_marks.iter_mut() {
            mark.rect = mark.rect.offset(offset);
        }
        for enemy in state.enemies.iter_mut() {
            enemy.rect = enemy.rect.offset(offset);
        }
    }

    let field = *state.level.play_field();
    state.bullets.retain(|b| b.rect().intersects(&field));
    state.explosives.retain(|e| e.rect().intersects(&field));
    state.explosions.retain(|e| e.rect.intersects(&field));
    state.burn_marks.retain(|m| m.rect.intersects(&field));

    let level = &state.level;
    let events = &mut state.events;
    state.enemies.retain(|enemy| {
        if level.retains_enemy(&enemy.rect) {
            return true;
        }
        if !enemy.dying {
            events.extend(enemy.kind.on_deactivation(enemy.id));
        }
        false
    });

    let now = state.level.scroll_state().segment_index;
    if now != segment {
        log::info!("Entered segment {}", now);
        state.emit(GameEvent::SegmentAdvanced { index: now });
    }
    state.activate_pending();
}

fn check_lost(state: &mut GameState) {
    if !state.players.iter().any(|p| p.alive) {
        state.lost = true;
        log::info!("Mission lost after {:.0} ms", state.time_ms);
        state.emit(GameEvent::MissionLost);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::PlayerProfile;
    use crate::settings::Settings;
    use crate::sim::enemy::{EnemySpawn, MovementSegment, ScheduledAction};
    use crate::sim::level::{BackgroundStrip, LevelData, LevelSegment, Obstacle};

    const DT: f64 = 16.0;

    fn catalog() -> Catalog {
        Catalog::from_json_str(
            r#"[
                { "type": "weapon", "name": "pistol", "category": "pistol", "ammunition": "9mm", "sound": "pistol" },
                { "type": "weapon", "name": "uzi", "category": "automatic", "ammunition": "9mm", "fire_interval_ms": 100, "sound": "uzi" },
                { "type": "weapon", "name": "rpg", "category": "rpg", "ammunition": "rocket", "sound": "rpg" },
                { "type": "ammunition", "name": "9mm", "range": 800, "speed": 1.0 },
                { "type": "ammunition", "name": "rocket", "range": 800, "speed": 0.5, "explosive": true },
                { "type": "grenade", "name": "frag", "movement_distance": 200, "movement_speed": 0.4 }
            ]"#,
        )
        .unwrap()
    }

    fn settings() -> Settings {
        Settings {
            seed: 7,
            ..Settings::default()
        }
    }

    fn level(enemies: Vec<EnemySpawn>, goal: Option<Rectangle>) -> LevelData {
        LevelData {
            name: "test".into(),
            player_starts: vec![Point::new(730.0, 1200.0)],
            segments: vec![LevelSegment {
                direction: Direction::Up,
                backgrounds: (0..3)
                    .map(|i| BackgroundStrip {
                        image: format!("tile{i}"),
                        length: 1500.0,
                    })
                    .collect(),
                obstacles: Vec::new(),
                enemies,
                goal,
            }],
        }
    }

    fn profile(item: &str, lives: u32) -> PlayerProfile {
        let mut profile = PlayerProfile::new("p1", lives, item);
        for other in ["pistol", "uzi", "rpg", "frag"] {
            profile.grant_item(other);
        }
        profile.set_ammo("9mm", 100);
        profile.set_ammo("rocket", 5);
        profile.set_ammo("frag", 5);
        profile
    }

    fn state_with(enemies: Vec<EnemySpawn>, item: &str) -> GameState {
        GameState::new(settings(), catalog(), level(enemies, None), vec![profile(item, 3)]).unwrap()
    }

    fn fire() -> InputSnapshot {
        InputSnapshot {
            primary_action: true,
            ..Default::default()
        }
    }

    fn idle() -> InputSnapshot {
        InputSnapshot::default()
    }

    fn up() -> InputSnapshot {
        InputSnapshot::moving(Direction::Up)
    }

    /// Fire once, then stand still for `ticks`
    fn shoot_and_wait(state: &mut GameState, ticks: usize) {
        tick(state, &[fire()], DT).unwrap();
        for _ in 0..ticks {
            tick(state, &[idle()], DT).unwrap();
        }
    }

    fn ahead(kind: EnemyKind) -> EnemySpawn {
        EnemySpawn::new(kind, Rectangle::new(735.0, 900.0, 30.0, 30.0))
    }

    #[test]
    fn test_up_scroll_end_to_end() {
        let mut state = state_with(Vec::new(), "pistol");
        let mut last = state.level.backgrounds()[0].rect.y;
        let mut scrolling = false;

        for _ in 0..300 {
            tick(&mut state, &[up()], DT).unwrap();
            let y = state.level.backgrounds()[0].rect.y;
            if scrolling {
                assert!(y > last, "tile stopped moving at {y}");
            }
            assert!(y - last <= state.tuning().max_scroll_speed * DT + 1e-9);
            scrolling |= y > last;
            last = y;
        }
        assert!(scrolling);

        // Every tile moved by the same amount
        let tiles = state.level.backgrounds();
        assert!((tiles[1].rect.y - (tiles[0].rect.y - 1500.0)).abs() < 1e-6);
        assert!(!state.is_over());
    }

    #[test]
    fn test_landmine_survives_bullets() {
        let mut state = state_with(vec![ahead(EnemyKind::Landmine)], "pistol");
        shoot_and_wait(&mut state, 60);
        assert!(!state.enemies[0].dying);
        assert_eq!(state.kills(0).unwrap(), 0);
    }

    #[test]
    fn test_person_dies_from_one_bullet() {
        let mut state = state_with(vec![ahead(EnemyKind::Person)], "pistol");
        state.drain_events();
        shoot_and_wait(&mut state, 30);

        assert!(state.enemies[0].dying);
        assert!(state.bullets.is_empty());
        assert_eq!(state.kills(0).unwrap(), 1);
        let profile = state.profile(0).unwrap();
        assert_eq!(profile.score(), 100);
        assert_eq!(profile.cash(), 100);
        assert_eq!(profile.ammo("9mm"), 99);

        let events = state.drain_events();
        assert!(events.contains(&GameEvent::WeaponFired {
            player: 0,
            sound: "pistol".into()
        }));
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::EnemyKilled { kind: EnemyKind::Person, killer: Some(0), .. }
        )));
        assert!(events.iter().any(|e| matches!(e, GameEvent::Scream { .. })));

        // The body is removed after the death countdown
        for _ in 0..70 {
            tick(&mut state, &[idle()], DT).unwrap();
        }
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_turret_ricochet() {
        let mut state = state_with(vec![ahead(EnemyKind::GunTurret)], "pistol");
        shoot_and_wait(&mut state, 30);
        assert!(!state.enemies[0].dying);
        assert!(state.bullets.is_empty());
        assert!(state
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::Ricochet { .. })));
    }

    #[test]
    fn test_rocket_kills_tank() {
        let tank = EnemySpawn::new(EnemyKind::Tank, Rectangle::new(710.0, 800.0, 80.0, 80.0));
        let mut state = state_with(vec![tank], "rpg");
        shoot_and_wait(&mut state, 60);

        assert!(state.enemies[0].dying);
        assert_eq!(state.profile(0).unwrap().score(), 500);
        assert_eq!(state.profile(0).unwrap().ammo("rocket"), 4);
        let events = state.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::LoopStopped { .. })));
        assert!(events.iter().any(|e| matches!(e, GameEvent::Explosion { .. })));
    }

    #[test]
    fn test_out_of_ammo() {
        let mut state = state_with(Vec::new(), "pistol");
        state.profile_mut(0).unwrap().set_ammo("9mm", 0);
        tick(&mut state, &[fire()], DT).unwrap();
        assert!(state.bullets.is_empty());
        assert!(state.drain_events().contains(&GameEvent::OutOfAmmo { player: 0 }));

        // Holding the trigger does not repeat the complaint
        tick(&mut state, &[fire()], DT).unwrap();
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_pistol_needs_fresh_press() {
        let mut state = state_with(Vec::new(), "pistol");
        for _ in 0..20 {
            tick(&mut state, &[fire()], DT).unwrap();
        }
        assert_eq!(state.profile(0).unwrap().ammo("9mm"), 99);
    }

    #[test]
    fn test_automatic_repeats_at_interval() {
        let mut state = state_with(Vec::new(), "uzi");
        state.drain_events();
        for _ in 0..20 {
            tick(&mut state, &[fire()], DT).unwrap();
        }
        // Shots on ticks 1, 8 and 15
        assert_eq!(state.profile(0).unwrap().ammo("9mm"), 97);

        tick(&mut state, &[idle()], DT).unwrap();
        let events = state.drain_events();
        let started = events
            .iter()
            .filter(|e| matches!(e, GameEvent::AutomaticFireStarted { .. }))
            .count();
        assert_eq!(started, 1);
        assert_eq!(events.last(), Some(&GameEvent::AutomaticFireStopped { player: 0 }));
    }

    #[test]
    fn test_grenade_explodes_at_range() {
        let mut state = state_with(Vec::new(), "frag");
        // 200px at 0.4px/ms is 500ms
        shoot_and_wait(&mut state, 40);
        assert!(state.explosives.is_empty());
        assert_eq!(state.profile(0).unwrap().ammo("frag"), 4);
        assert!(!state.burn_marks.is_empty() || !state.explosions.is_empty());
    }

    #[test]
    fn test_cycle_item() {
        let mut state = state_with(Vec::new(), "pistol");
        state.drain_events();
        let next = InputSnapshot {
            cycle_next: true,
            ..Default::default()
        };
        for _ in 0..5 {
            tick(&mut state, &[next], DT).unwrap();
        }
        assert_eq!(state.profile(0).unwrap().selected_item(), "uzi");
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::ItemSelected {
                player: 0,
                item: "uzi".into()
            }]
        );
    }

    #[test]
    fn test_landmine_contact_kills_player() {
        let mine = EnemySpawn::new(EnemyKind::Landmine, Rectangle::new(740.0, 1210.0, 20.0, 20.0));
        let mut state = state_with(vec![mine], "pistol");
        tick(&mut state, &[idle()], DT).unwrap();

        assert!(state.players[0].behavior.dying);
        assert!(state.enemies[0].dying);
        assert_eq!(state.explosions.len(), 1);
        assert!(state
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::PlayerDied { player: 0, .. })));

        // Respawn with one life fewer, invincible
        for _ in 0..100 {
            tick(&mut state, &[idle()], DT).unwrap();
        }
        let player = state.player(0).unwrap();
        assert!(player.alive && !player.behavior.dying && player.behavior.invincible);
        assert_eq!(player.profile.lives(), 2);
    }

    #[test]
    fn test_invincible_player_ignores_lethal_contact() {
        let mine = EnemySpawn::new(EnemyKind::Landmine, Rectangle::new(740.0, 1210.0, 20.0, 20.0));
        let mut state = state_with(vec![mine], "pistol");
        state.players[0].behavior.start_invincibility(10_000.0);
        for _ in 0..10 {
            tick(&mut state, &[idle()], DT).unwrap();
        }
        assert!(!state.players[0].behavior.dying);
        assert!(!state.enemies[0].dying);
    }

    #[test]
    fn test_enemy_bullet_kills_player() {
        let mut gunner = EnemySpawn::new(EnemyKind::Person, Rectangle::new(735.0, 900.0, 30.0, 30.0));
        gunner.actions = vec![ScheduledAction {
            delay: 10.0,
            kind: ActionKind::Bullet,
        }];
        let mut state = state_with(vec![gunner], "pistol");
        for _ in 0..60 {
            tick(&mut state, &[idle()], DT).unwrap();
        }
        assert!(state.players[0].behavior.dying);
    }

    #[test]
    fn test_last_life_loses_mission() {
        let mine = EnemySpawn::new(EnemyKind::Landmine, Rectangle::new(740.0, 1210.0, 20.0, 20.0));
        let mut state =
            GameState::new(settings(), catalog(), level(vec![mine], None), vec![profile("pistol", 1)]).unwrap();
        for _ in 0..120 {
            tick(&mut state, &[idle()], DT).unwrap();
        }
        assert!(state.is_lost());
        assert!(!state.players[0].alive);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::PlayerEliminated { player: 0 }));
        assert_eq!(events.last(), Some(&GameEvent::MissionLost));

        // Further ticks are no-ops
        let time = state.time_ms;
        tick(&mut state, &[idle()], DT).unwrap();
        assert_eq!(state.time_ms, time);
    }

    #[test]
    fn test_unlimited_lives() {
        let mine = EnemySpawn::new(EnemyKind::Landmine, Rectangle::new(740.0, 1210.0, 20.0, 20.0));
        let settings = Settings {
            unlimited_lives: true,
            ..settings()
        };
        let mut state =
            GameState::new(settings, catalog(), level(vec![mine], None), vec![profile("pistol", 1)]).unwrap();
        for _ in 0..120 {
            tick(&mut state, &[idle()], DT).unwrap();
        }
        assert!(!state.is_lost());
        assert_eq!(state.profile(0).unwrap().lives(), 1);
    }

    #[test]
    fn test_dying_teammate_is_not_scrolled_off_screen() {
        let mut state = GameState::new(
            settings(),
            catalog(),
            level(Vec::new(), None),
            vec![profile("pistol", 3), profile("pistol", 3)],
        )
        .unwrap();
        state.players[0].rect.y = 300.0;
        state.players[1].rect.y = 300.0;
        tick(&mut state, &[idle(), idle()], DT).unwrap();
        assert!(state.level.scroll_state().distance_owed > 0.0);

        // Second player falls back to the trailing edge and dies there
        let bounds = state.level.play_field().inset(state.tuning().border_margin);
        let rect = state.players[1].rect;
        state.players[1].rect = Rectangle::new(100.0, bounds.bottom() - rect.height, rect.width, rect.height);
        let death_ms = state.tuning().player_death_ms;
        state.players[1].behavior.die(death_ms);

        for _ in 0..150 {
            tick(&mut state, &[idle(), idle()], DT).unwrap();
            assert!(bounds.contains_rect(&state.players[1].rect), "{:?}", state.players[1].rect);
        }
        assert!(state.players[1].is_active());
        assert!(state.drain_events().contains(&GameEvent::PlayerRespawned { player: 1 }));

        // Owed scroll drains again once the respawned player steps forward
        let before = state.level.scroll_state();
        for _ in 0..20 {
            tick(&mut state, &[idle(), up()], DT).unwrap();
        }
        let after = state.level.scroll_state();
        assert!(after.distance_scrolled > before.distance_scrolled);
        assert!(after.distance_owed < before.distance_owed);
    }

    #[test]
    fn test_goal_wins() {
        let goal = Rectangle::new(0.0, 1100.0, 1500.0, 150.0);
        let mut state =
            GameState::new(settings(), catalog(), level(Vec::new(), Some(goal)), vec![profile("pistol", 3)])
                .unwrap();
        tick(&mut state, &[idle()], DT).unwrap();
        assert!(state.is_won());
        assert!(state.drain_events().contains(&GameEvent::MissionWon));
    }

    #[test]
    fn test_obstacle_blocks_player_and_bullets() {
        let mut data = level(Vec::new(), None);
        data.segments[0].obstacles = vec![Obstacle {
            rect: Rectangle::new(700.0, 1100.0, 100.0, 50.0),
            stops_bullets: true,
            stops_explosives: true,
        }];
        let mut state = GameState::new(settings(), catalog(), data, vec![profile("pistol", 3)]).unwrap();

        for _ in 0..40 {
            tick(&mut state, &[up()], DT).unwrap();
        }
        assert!((state.players[0].rect.top() - 1150.0).abs() < 1e-9);

        shoot_and_wait(&mut state, 5);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_spawn_area_produces_enemies() {
        let mut area = EnemySpawn::new(EnemyKind::SpawnArea, Rectangle::new(100.0, 100.0, 100.0, 100.0));
        area.actions = vec![ScheduledAction {
            delay: 50.0,
            kind: ActionKind::Bullet,
        }];
        area.spawn_capacity = Some(2);
        let mut template = EnemySpawn::new(EnemyKind::Person, Rectangle::new(0.0, 0.0, 20.0, 40.0));
        template.movement = vec![MovementSegment::new(10_000.0, 0.01, 0.0)];
        area.spawn_template = Some(Box::new(template));

        let mut state = state_with(vec![area], "pistol");
        for _ in 0..50 {
            tick(&mut state, &[idle()], DT).unwrap();
        }
        let people = state
            .enemies
            .iter()
            .filter(|e| e.kind == EnemyKind::Person)
            .count();
        assert_eq!(people, 2);
        // The depleted area is gone
        assert!(state.enemies.iter().all(|e| e.kind != EnemyKind::SpawnArea));
    }

    #[test]
    fn test_determinism() {
        let enemies = || {
            let mut gunner = ahead(EnemyKind::Person);
            gunner.actions = vec![ScheduledAction {
                delay: 300.0,
                kind: ActionKind::Grenade,
            }];
            gunner.movement = vec![MovementSegment::new(2000.0, 0.05, 0.0)];
            vec![gunner, ahead(EnemyKind::Tank)]
        };
        let mut a = state_with(enemies(), "uzi");
        let mut b = state_with(enemies(), "uzi");

        for i in 0..400 {
            let input = InputSnapshot {
                move_up: i % 50 < 30,
                move_left: i % 70 < 20,
                primary_action: i % 40 < 25,
                ..Default::default()
            };
            tick(&mut a, &[input], DT).unwrap();
            tick(&mut b, &[input], DT).unwrap();
            assert_eq!(a.drain_events(), b.drain_events());
        }

        assert_eq!(a.players[0].rect, b.players[0].rect);
        assert_eq!(a.bullets, b.bullets);
        assert_eq!(a.enemies, b.enemies);
        assert_eq!(a.level.scroll_state(), b.level.scroll_state());
    }
}
