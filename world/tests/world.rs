use std::time::Duration;

use glam::Vec2;
use tank_defence_core::{
    Command, EnemyId, Event, NullEffects, Rejection, SessionConfig, TowerId, TowerKind,
    VisualEffect,
};
use tank_defence_world::{self as world, query, World};

const FRAME: Duration = Duration::from_millis(16);

fn new_world(config: SessionConfig) -> World {
    World::new(config, 0x5eed)
}

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events, &mut NullEffects);
    events
}

fn place(world: &mut World, kind: TowerKind, x: f32, y: f32) -> Result<TowerId, Rejection> {
    let events = run(
        world,
        Command::PlaceTower {
            kind,
            position: Vec2::new(x, y),
        },
    );
    match events.as_slice() {
        [Event::TowerPlaced { tower, .. }] => Ok(*tower),
        [Event::CommandRejected { reason }] => Err(*reason),
        other => panic!("unexpected placement events: {other:?}"),
    }
}

fn spawn(world: &mut World, x: f32, y: f32, speed: f32, health: f32) -> EnemyId {
    let events = run(
        world,
        Command::SpawnEnemy {
            position: Vec2::new(x, y),
            speed,
            health,
            size: 20.0,
        },
    );
    match events.as_slice() {
        [Event::EnemySpawned { enemy, .. }] => *enemy,
        other => panic!("unexpected spawn events: {other:?}"),
    }
}

fn tick_until(world: &mut World, limit: usize, done: impl Fn(&Event) -> bool) -> Vec<Event> {
    let mut log = Vec::new();
    for _ in 0..limit {
        let events = run(world, Command::Tick { dt: FRAME });
        let finished = events.iter().any(&done);
        log.extend(events);
        if finished {
            return log;
        }
    }
    panic!("condition not reached within {limit} ticks");
}

fn unlock(world: &mut World, wave: u32, reward: u32) -> Vec<Event> {
    run(
        world,
        Command::CompleteWave {
            wave,
            reward,
            final_wave: false,
        },
    )
}

#[test]
fn placement_rejections_leave_cash_untouched() {
    let mut world = new_world(SessionConfig::default());

    assert_eq!(
        place(&mut world, TowerKind::Ice, 400.0, 300.0),
        Err(Rejection::LockedType {
            kind: TowerKind::Ice
        })
    );
    assert_eq!(
        place(&mut world, TowerKind::Basic, 400.0, 49.0),
        Err(Rejection::InvalidPosition)
    );
    assert_eq!(
        place(&mut world, TowerKind::Basic, 400.0, 551.0),
        Err(Rejection::InvalidPosition)
    );
    assert_eq!(query::cash(&world), 100);

    assert!(place(&mut world, TowerKind::Basic, 400.0, 300.0).is_ok());
    assert_eq!(
        place(&mut world, TowerKind::Basic, 439.0, 300.0),
        Err(Rejection::InvalidPosition)
    );
    assert!(place(&mut world, TowerKind::Basic, 440.0, 300.0).is_ok());
    assert_eq!(query::cash(&world), 80);
}

#[test]
fn unaffordable_tower_is_rejected_whole() {
    let config = SessionConfig {
        starting_cash: 49,
        ..SessionConfig::default()
    };
    let mut world = new_world(config);
    assert_eq!(
        place(&mut world, TowerKind::Heavy, 400.0, 300.0),
        Err(Rejection::InsufficientCash {
            required: 50,
            available: 49
        })
    );
    assert_eq!(query::cash(&world), 49);
    assert!(query::tower_view(&world).is_empty());
}

#[test]
fn upgrade_and_sell_settle_cash() {
    let mut world = new_world(SessionConfig::default());
    let tower = place(&mut world, TowerKind::Basic, 400.0, 300.0).expect("placed");
    assert_eq!(query::cash(&world), 90);

    let mut effects: Vec<VisualEffect> = Vec::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::UpgradeTower { tower },
        &mut events,
        &mut effects,
    );
    assert_eq!(
        events,
        vec![Event::TowerUpgraded {
            tower,
            level: 1,
            cost: 15
        }]
    );
    assert_eq!(effects.len(), 1, "upgrade shakes the screen");
    assert_eq!(query::cash(&world), 75);

    let events = run(&mut world, Command::SellTower { tower });
    assert_eq!(events, vec![Event::TowerSold { tower, refund: 14 }]);
    assert_eq!(query::cash(&world), 89);
    assert!(query::tower(&world, tower).is_none());

    let events = run(&mut world, Command::SellTower { tower });
    assert_eq!(
        events,
        vec![Event::CommandRejected {
            reason: Rejection::UnknownTower { tower }
        }]
    );
}

#[test]
fn upgrades_stop_at_max_level_or_empty_wallet() {
    let config = SessionConfig {
        starting_cash: 110,
        ..SessionConfig::default()
    };
    let mut world = new_world(config);
    let tower = place(&mut world, TowerKind::Basic, 400.0, 300.0).expect("placed");
    for _ in 0..3 {
        let events = run(&mut world, Command::UpgradeTower { tower });
        assert!(matches!(events[..], [Event::TowerUpgraded { .. }]));
    }
    assert_eq!(query::cash(&world), 100 - 15 - 30 - 45);
    let events = run(&mut world, Command::UpgradeTower { tower });
    assert_eq!(
        events,
        vec![Event::CommandRejected {
            reason: Rejection::MaxLevel
        }]
    );

    let second = place(&mut world, TowerKind::Basic, 200.0, 300.0).expect("placed");
    assert_eq!(query::cash(&world), 0);
    let events = run(&mut world, Command::UpgradeTower { tower: second });
    assert_eq!(
        events,
        vec![Event::CommandRejected {
            reason: Rejection::InsufficientCash {
                required: 15,
                available: 0
            }
        }]
    );
    assert_eq!(query::tower(&world, second).map(|t| t.level), Some(0));
}

#[test]
fn tower_kills_nearest_enemy_and_earns_credit() {
    let mut world = new_world(SessionConfig::default());
    let tower = place(&mut world, TowerKind::Basic, 400.0, 300.0).expect("placed");
    let enemy = spawn(&mut world, 400.0, 380.0, 0.0, 1.0);

    let log = tick_until(&mut world, 200, |event| {
        matches!(event, Event::EnemyKilled { .. })
    });

    assert!(log.contains(&Event::EnemyKilled { enemy, reward: 5 }));
    assert!(log.iter().any(|event| matches!(
        event,
        Event::ProjectileHit { enemy: hit, lethal: true, .. } if *hit == enemy
    )));
    assert_eq!(query::enemy_count(&world), 0);
    assert_eq!(query::cash(&world), 95);
    assert_eq!(query::tower(&world, tower).map(|t| t.kill_count), Some(1));
}

#[test]
fn overlapping_enemies_take_a_single_hit() {
    let mut world = new_world(SessionConfig::default());
    let _ = place(&mut world, TowerKind::Basic, 400.0, 300.0).expect("placed");
    let front = spawn(&mut world, 400.0, 380.0, 0.0, 100.0);
    let behind = spawn(&mut world, 400.0, 380.0, 0.0, 100.0);

    let log = tick_until(&mut world, 120, |event| {
        matches!(event, Event::ProjectileHit { .. })
    });

    let fired = log
        .iter()
        .filter(|event| matches!(event, Event::ProjectileFired { .. }))
        .count();
    let hits: Vec<_> = log
        .iter()
        .filter_map(|event| match event {
            Event::ProjectileHit { enemy, .. } => Some(*enemy),
            _ => None,
        })
        .collect();
    assert_eq!(fired, 1);
    assert_eq!(hits, vec![front]);
    assert!(query::projectile_view(&world).is_empty());

    let health: Vec<_> = query::enemy_view(&world)
        .iter()
        .map(|enemy| (enemy.id, enemy.health_ratio))
        .collect();
    assert_eq!(health.len(), 2);
    assert!((health[0].1 - 0.99).abs() < 1e-5);
    assert_eq!(health[1], (behind, 1.0));
}

#[test]
fn stray_projectile_is_dropped_once_it_leaves_the_field() {
    let mut world = new_world(SessionConfig::default());
    let _ = place(&mut world, TowerKind::Basic, 400.0, 520.0).expect("placed");
    for _ in 0..63 {
        let _ = run(&mut world, Command::Tick { dt: FRAME });
    }
    // Fast enough to breach before the shot closes in.
    let enemy = spawn(&mut world, 400.0, 590.0, 3.0, 5.0);

    let mut log = run(&mut world, Command::Tick { dt: FRAME });
    assert!(log
        .iter()
        .any(|event| matches!(event, Event::ProjectileFired { .. })));
    assert_eq!(query::projectile_view(&world).len(), 1);

    let mut in_flight = Vec::new();
    for _ in 0..30 {
        log.extend(run(&mut world, Command::Tick { dt: FRAME }));
        in_flight.push(query::projectile_view(&world).len());
    }

    assert!(log.contains(&Event::EnemyBreached {
        enemy,
        lives_remaining: 9
    }));
    assert!(!log
        .iter()
        .any(|event| matches!(event, Event::ProjectileHit { .. })));
    let gone = in_flight
        .iter()
        .position(|&count| count == 0)
        .expect("projectile left the field");
    assert!(gone > 0, "still inside right after the breach");
    assert!(in_flight[gone..].iter().all(|&count| count == 0));
}

#[test]
fn breach_costs_a_life_and_pays_nothing() {
    let mut world = new_world(SessionConfig::default());
    let enemy = spawn(&mut world, 400.0, 599.0, 2.0, 5.0);

    let events = run(&mut world, Command::Tick { dt: FRAME });

    assert!(events.contains(&Event::EnemyBreached {
        enemy,
        lives_remaining: 9
    }));
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::EnemyKilled { .. })));
    assert_eq!(query::lives(&world), 9);
    assert_eq!(query::cash(&world), 100);
}

#[test]
fn game_over_is_announced_once() {
    let config = SessionConfig {
        starting_lives: 1,
        ..SessionConfig::default()
    };
    let mut world = new_world(config);
    let _ = spawn(&mut world, 300.0, 599.0, 2.0, 5.0);
    let _ = spawn(&mut world, 500.0, 599.0, 2.0, 5.0);

    let events = run(&mut world, Command::Tick { dt: FRAME });

    let game_overs = events
        .iter()
        .filter(|event| matches!(event, Event::GameOver))
        .count();
    assert_eq!(game_overs, 1);
    assert_eq!(query::lives(&world), 0);
}

#[test]
fn ice_tower_freezes_its_target() {
    let mut world = new_world(SessionConfig::default());
    let events = unlock(&mut world, 5, 50);
    assert!(events.contains(&Event::TowerUnlocked {
        kind: TowerKind::Ice
    }));
    assert!(query::is_unlocked(&world, TowerKind::Ice));
    let _ = place(&mut world, TowerKind::Ice, 400.0, 300.0).expect("placed");
    let _ = spawn(&mut world, 400.0, 380.0, 0.0, 100.0);

    let _ = tick_until(&mut world, 200, |event| {
        matches!(event, Event::ProjectileHit { .. })
    });

    let enemies = query::enemy_view(&world);
    assert_eq!(enemies.len(), 1);
    assert!(enemies[0].frozen);
    assert!(!enemies[0].burning);
}

#[test]
fn bomb_splash_kills_are_credited_and_blast_lingers() {
    let mut world = new_world(SessionConfig::default());
    let _ = unlock(&mut world, 15, 200);
    let tower = place(&mut world, TowerKind::Bomber, 400.0, 300.0).expect("placed");
    let _ = spawn(&mut world, 400.0, 400.0, 0.0, 2.5);
    let _ = spawn(&mut world, 430.0, 400.0, 0.0, 1.0);

    let log = tick_until(&mut world, 400, |event| {
        matches!(event, Event::BombExploded { .. })
    });

    assert!(log
        .iter()
        .any(|event| matches!(event, Event::BombExploded { affected: 2, .. })));
    assert_eq!(query::enemy_count(&world), 0);
    assert_eq!(query::tower(&world, tower).map(|t| t.kill_count), Some(2));
    assert_eq!(query::cash(&world), 300 - 150 + 10);

    let projectiles = query::projectile_view(&world);
    assert_eq!(projectiles.len(), 1);
    assert!(projectiles[0].exploded);

    for _ in 0..40 {
        let _ = run(&mut world, Command::Tick { dt: FRAME });
    }
    assert!(query::projectile_view(&world).is_empty());
}

#[test]
fn unlock_gates_open_once_and_final_wave_declares_victory() {
    let mut world = new_world(SessionConfig::default());
    let first = unlock(&mut world, 10, 100);
    let again = unlock(&mut world, 10, 0);
    assert!(first.contains(&Event::TowerUnlocked {
        kind: TowerKind::Flamer
    }));
    assert!(!again
        .iter()
        .any(|event| matches!(event, Event::TowerUnlocked { .. })));

    let events = run(
        &mut world,
        Command::CompleteWave {
            wave: 20,
            reward: 0,
            final_wave: true,
        },
    );
    assert_eq!(
        events,
        vec![
            Event::WaveCompleted {
                wave: 20,
                reward: 0
            },
            Event::Victory
        ]
    );
}

#[test]
fn selection_radius_covers_tower_footprint() {
    let mut world = new_world(SessionConfig::default());
    let tower = place(&mut world, TowerKind::Basic, 400.0, 300.0).expect("placed");
    assert_eq!(query::tower_at(&world, Vec2::new(425.0, 300.0)), Some(tower));
    assert_eq!(query::tower_at(&world, Vec2::new(426.0, 300.0)), None);
}
