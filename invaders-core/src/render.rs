//! Backend-agnostic render pass.
//!
//! `build_frame` turns a [`WorldSnapshot`] into an ordered draw list. A canvas
//! backend replays the list front to back; later commands paint over earlier
//! ones. Commands serialize as `{"op": ...}` objects for a browser canvas
//! bridge.

use serde::Serialize;

use crate::constants::{
    COLOR_BACKGROUND, COLOR_BOSS, COLOR_BOSS_PROJECTILE, COLOR_ENEMY, COLOR_HEALTH_FILL,
    COLOR_HEALTH_TRACK, COLOR_HUD, COLOR_PLAYER, COLOR_PROJECTILE,
};
use crate::sim::{GameMode, WorldSnapshot};

const PLAYER_SHAPE: [(f64, f64); 3] = [(25.0, 0.0), (50.0, 50.0), (0.0, 50.0)];
const ENEMY_SHAPE: [(f64, f64); 3] = [(0.0, 0.0), (40.0, 0.0), (20.0, 20.0)];
const BOSS_SHAPE: [(f64, f64); 3] = [(0.0, 0.0), (80.0, 0.0), (40.0, 40.0)];

const HEALTH_BAR_X: f64 = 10.0;
const HEALTH_BAR_Y: f64 = 10.0;
const HEALTH_BAR_WIDTH: f64 = 200.0;
const HEALTH_BAR_HEIGHT: f64 = 10.0;

const HUD_MARGIN: f64 = 10.0;
const HUD_LINE_HEIGHT: f64 = 16.0;
const HUD_FONT_SIZE: f64 = 14.0;
const OVERLAY_FONT_SIZE: f64 = 28.0;
const OVERLAY_SHADE: &str = "#000000";
const OVERLAY_SHADE_ALPHA: f64 = 0.7;
const COLOR_BOSS_WARNING: &str = "#ef4444";
const COLOR_LEVEL_BANNER: &str = "#60a5fa";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear {
        color: &'static str,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: &'static str,
        alpha: f64,
    },
    Circle {
        x: f64,
        y: f64,
        radius: f64,
        color: &'static str,
        alpha: f64,
    },
    Triangle {
        points: [(f64, f64); 3],
        color: &'static str,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        size: f64,
        align: TextAlign,
        color: &'static str,
    },
}

pub fn build_frame(world: &WorldSnapshot) -> Vec<DrawCommand> {
    let mut commands = Vec::with_capacity(
        8 + world.particles.len()
            + world.projectiles.len()
            + world.enemies.len()
            + world.boss_projectiles.len(),
    );

    commands.push(DrawCommand::Clear {
        color: COLOR_BACKGROUND,
    });

    for particle in &world.particles {
        commands.push(DrawCommand::Circle {
            x: particle.x,
            y: particle.y,
            radius: particle.radius,
            color: particle.color,
            alpha: particle.alpha,
        });
    }

    commands.push(DrawCommand::Triangle {
        points: translate(PLAYER_SHAPE, world.player.x, world.player.y),
        color: COLOR_PLAYER,
    });

    for projectile in &world.projectiles {
        commands.push(DrawCommand::Circle {
            x: projectile.x,
            y: projectile.y,
            radius: projectile.radius,
            color: COLOR_PROJECTILE,
            alpha: 1.0,
        });
    }

    for enemy in &world.enemies {
        commands.push(DrawCommand::Triangle {
            points: translate(ENEMY_SHAPE, enemy.x, enemy.y),
            color: COLOR_ENEMY,
        });
    }

    if let Some(boss) = &world.boss {
        commands.push(DrawCommand::Triangle {
            points: translate(BOSS_SHAPE, boss.x, boss.y),
            color: COLOR_BOSS,
        });

        let fill = (f64::from(boss.health) / f64::from(boss.max_health)).clamp(0.0, 1.0);
        commands.push(DrawCommand::Rect {
            x: HEALTH_BAR_X,
            y: HEALTH_BAR_Y,
            width: HEALTH_BAR_WIDTH,
            height: HEALTH_BAR_HEIGHT,
            color: COLOR_HEALTH_TRACK,
            alpha: 1.0,
        });
        commands.push(DrawCommand::Rect {
            x: HEALTH_BAR_X,
            y: HEALTH_BAR_Y,
            width: HEALTH_BAR_WIDTH * fill,
            height: HEALTH_BAR_HEIGHT,
            color: COLOR_HEALTH_FILL,
            alpha: 1.0,
        });
    }

    for projectile in &world.boss_projectiles {
        commands.push(DrawCommand::Circle {
            x: projectile.x,
            y: projectile.y,
            radius: projectile.radius,
            color: COLOR_BOSS_PROJECTILE,
            alpha: 1.0,
        });
    }

    push_hud(&mut commands, world);
    push_overlay(&mut commands, world);

    commands
}

fn push_hud(commands: &mut Vec<DrawCommand>, world: &WorldSnapshot) {
    let right = world.arena.width - HUD_MARGIN;
    let progress_label = if world.is_boss_level() {
        "Boss Damage"
    } else {
        "Level Progress"
    };
    let lines = [
        format!("Score: {}", world.score),
        format!("High Score: {}", world.high_score),
        format!("Level {}", world.level),
        format!("{progress_label}: {}%", world.progress.floor() as u32),
    ];

    for (index, text) in lines.into_iter().enumerate() {
        commands.push(DrawCommand::Text {
            x: right,
            y: HUD_MARGIN + HUD_LINE_HEIGHT * (index as f64 + 1.0),
            text,
            size: HUD_FONT_SIZE,
            align: TextAlign::Right,
            color: COLOR_HUD,
        });
    }
}

fn push_overlay(commands: &mut Vec<DrawCommand>, world: &WorldSnapshot) {
    let (text, color) = match world.mode {
        GameMode::Paused => ("Game Paused".to_string(), COLOR_HUD),
        GameMode::Over => (format!("Game Over - Score {}", world.score), COLOR_HUD),
        GameMode::Playing if world.level_up_active && world.is_boss_level() => {
            ("BOSS LEVEL!".to_string(), COLOR_BOSS_WARNING)
        }
        GameMode::Playing if world.level_up_active => (
            format!("Level {} Complete!", world.level.saturating_sub(1)),
            COLOR_LEVEL_BANNER,
        ),
        GameMode::Playing => return,
    };

    commands.push(DrawCommand::Rect {
        x: 0.0,
        y: 0.0,
        width: world.arena.width,
        height: world.arena.height,
        color: OVERLAY_SHADE,
        alpha: OVERLAY_SHADE_ALPHA,
    });
    commands.push(DrawCommand::Text {
        x: world.arena.width / 2.0,
        y: world.arena.height / 2.0,
        text,
        size: OVERLAY_FONT_SIZE,
        align: TextAlign::Center,
        color,
    });
}

#[inline]
fn translate(shape: [(f64, f64); 3], dx: f64, dy: f64) -> [(f64, f64); 3] {
    shape.map(|(x, y)| (x + dx, y + dy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::LiveGame;

    fn texts(commands: &[DrawCommand]) -> Vec<String> {
        commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn frame_starts_with_background_clear() {
        let game = LiveGame::new(1);
        let commands = build_frame(&game.snapshot());
        assert_eq!(
            commands.first(),
            Some(&DrawCommand::Clear {
                color: COLOR_BACKGROUND
            })
        );
    }

    #[test]
    fn draw_list_serializes_as_tagged_ops() {
        let game = LiveGame::new(1);
        let commands = build_frame(&game.snapshot());
        let json = serde_json::to_value(&commands).unwrap();

        assert_eq!(json[0]["op"], "clear");
        assert_eq!(json[0]["color"], COLOR_BACKGROUND);
        let ops: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|command| command["op"].as_str())
            .collect();
        assert!(ops.contains(&"triangle"));
        assert!(ops.contains(&"text"));
        let text = json
            .as_array()
            .unwrap()
            .iter()
            .find(|command| command["op"] == "text")
            .unwrap();
        assert!(matches!(text["align"].as_str(), Some("left" | "center" | "right")));
    }

    #[test]
    fn draws_player_and_every_enemy() {
        let game = LiveGame::new(1);
        let world = game.snapshot();
        let commands = build_frame(&world);

        let enemy_triangles = commands
            .iter()
            .filter(|command| {
                matches!(command, DrawCommand::Triangle { color, .. } if *color == COLOR_ENEMY)
            })
            .count();
        assert_eq!(enemy_triangles, world.enemies.len());

        let player = commands.iter().find_map(|command| match command {
            DrawCommand::Triangle { points, color } if *color == COLOR_PLAYER => Some(*points),
            _ => None,
        });
        let p = world.player;
        assert_eq!(
            player,
            Some([(p.x + 25.0, p.y), (p.x + 50.0, p.y + 50.0), (p.x, p.y + 50.0)])
        );
    }

    #[test]
    fn boss_health_bar_scales_with_max_health() {
        let game = LiveGame::new(1);
        let mut world = game.snapshot();
        world.level = 10;
        world.enemies.clear();
        world.boss = Some(crate::sim::Boss {
            x: 100.0,
            y: 50.0,
            width: 80.0,
            height: 80.0,
            health: 75,
            max_health: 150,
            pattern: 0,
            last_shot_ms: 0.0,
            phase: 0.0,
        });

        let commands = build_frame(&world);
        let fill = commands.iter().find_map(|command| match command {
            DrawCommand::Rect { width, color, .. } if *color == COLOR_HEALTH_FILL => Some(*width),
            _ => None,
        });
        assert_eq!(fill, Some(100.0));
        assert!(texts(&commands)
            .iter()
            .any(|text| text.starts_with("Boss Damage")));
    }

    #[test]
    fn hud_shows_score_high_score_and_level() {
        let mut game = LiveGame::new(1);
        game.set_high_score(4_200);
        let lines = texts(&build_frame(&game.snapshot()));
        assert!(lines.contains(&"Score: 0".to_string()));
        assert!(lines.contains(&"High Score: 4200".to_string()));
        assert!(lines.contains(&"Level 1".to_string()));
        assert!(lines.contains(&"Level Progress: 0%".to_string()));
    }

    #[test]
    fn overlays_follow_session_mode() {
        let mut game = LiveGame::new(1);
        assert!(!texts(&build_frame(&game.snapshot()))
            .iter()
            .any(|text| text == "Game Paused"));

        game.toggle_pause();
        assert!(texts(&build_frame(&game.snapshot()))
            .iter()
            .any(|text| text == "Game Paused"));

        let mut world = game.snapshot();
        world.mode = GameMode::Playing;
        world.level = 5;
        world.level_up_active = true;
        assert!(texts(&build_frame(&world))
            .iter()
            .any(|text| text == "BOSS LEVEL!"));

        world.level = 3;
        assert!(texts(&build_frame(&world))
            .iter()
            .any(|text| text == "Level 2 Complete!"));

        world.level_up_active = false;
        world.mode = GameMode::Over;
        world.score = 800;
        assert!(texts(&build_frame(&world))
            .iter()
            .any(|text| text == "Game Over - Score 800"));
    }
}
