//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use glam::Vec3;

use super::overlap::{CutOutcome, cut};
use super::state::{DEMO_RESTART_TICKS, GameEvent, GamePhase, GameState};
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Drop the moving layer (click/tap/space)
    pub place: bool,
    /// Pause toggle
    pub pause: bool,
    /// Let the autopilot play (always on in the menu)
    pub autopilot: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.set_phase(GamePhase::Paused);
                return;
            }
            GamePhase::Paused => state.set_phase(GamePhase::Playing),
            _ => {}
        }
    }

    if state.phase == GamePhase::Paused {
        return;
    }

    state.time_ticks += 1;
    state.phase_ticks = state.phase_ticks.saturating_add(1);

    match state.phase {
        GamePhase::Menu => {
            if let Some(ticks) = state.demo_restart_ticks {
                if ticks == 0 {
                    let seed = state.next_seed();
                    state.reset(seed, GamePhase::Menu);
                } else {
                    state.demo_restart_ticks = Some(ticks - 1);
                }
            } else {
                advance_layer(state, dt);
                if autopilot_ready(state) {
                    place_layer(state);
                }
            }
        }
        GamePhase::Playing => {
            advance_layer(state, dt);
            let place = if input.autopilot {
                autopilot_ready(state)
            } else {
                input.place
            };
            if place && state.phase == GamePhase::Playing {
                place_layer(state);
            }
        }
        // Nothing moves but falling pieces and the camera
        GamePhase::GameOver | GamePhase::Won | GamePhase::Paused => {}
    }

    state.world.step(dt);
    state.sync_visuals();
    let layer_count = state.stack.len();
    let phase = state.phase;
    state.camera.update(layer_count, phase, dt);
}

/// Slide the active layer; replace it if it has gone past the tower
fn advance_layer(state: &mut GameState, dt: f32) {
    state.move_top_layer(state.tuning.speed * dt);

    let Some((top, _)) = state.top_pair() else {
        return;
    };
    if top.offset() > state.tuning.miss_distance {
        auto_miss(state);
    }
}

/// Drop the unreachable layer and spawn a same-size one on the same level
fn auto_miss(state: &mut GameState) {
    let Some(missed) = state.stack.pop() else {
        return;
    };
    let (axis, width, depth) = (missed.axis, missed.width, missed.depth);
    let drift = missed.offset();
    let restart = missed.mesh.position;
    state.drop_layer(missed, drift);

    let (x, z) = match axis {
        super::Axis::X => (-START_OFFSET, restart.z),
        super::Axis::Z => (restart.x, -START_OFFSET),
    };
    state.add_layer(x, z, width, depth, axis);

    if state.phase == GamePhase::Playing {
        state.events.push(GameEvent::AutoMiss);
        log::debug!("Layer slid past the tower, respawned at level {}", state.stack.len() - 1);
    }
}

/// True once the active layer has reached the autopilot's chosen offset
fn autopilot_ready(state: &GameState) -> bool {
    let Some((top, prev)) = state.top_pair() else {
        return false;
    };
    let delta = top.offset() - top.axis.get(prev.mesh.position);
    delta >= state.autopilot_target
}

/// Stop the active layer over the tower: cut it, or end the run on a miss
pub fn place_layer(state: &mut GameState) {
    let Some((top, prev)) = state.top_pair() else {
        return;
    };
    let axis = top.axis;
    let size = top.size_along(axis);
    let outcome = cut(axis.get(prev.mesh.position), top.offset(), size);

    match outcome {
        CutOutcome::Miss { overlap } => {
            log::debug!("Missed the tower (overlap {:.3})", overlap);
            if let Some(missed) = state.stack.pop() {
                let drift = missed.offset() - axis.get(prev_position(state));
                state.drop_layer(missed, drift);
            }
            end_run(state);
        }
        CutOutcome::Cut {
            kept,
            overhang,
            delta,
        } => {
            state.cut_top_layer(axis, kept.center, kept.size);

            let Some(top) = state.stack.last() else {
                return;
            };
            let (width, depth) = (top.width, top.depth);
            let position = top.mesh.position;
            let level = top.mesh.color_index;

            if let Some(piece) = overhang {
                let mut at = position;
                axis.set(&mut at, piece.center);
                let (w, d) = match axis {
                    super::Axis::X => (piece.size, depth),
                    super::Axis::Z => (width, piece.size),
                };
                state.add_overhang(at, w, d, axis, level, delta);
            }

            state.score += 1;
            if state.phase == GamePhase::Playing {
                state.events.push(GameEvent::Placed {
                    perfect: overhang.is_none(),
                    score: state.score,
                });

                if let Some(win) = state.tuning.win_height {
                    if state.score >= win {
                        state.set_phase(GamePhase::Won);
                        state.events.push(GameEvent::Won { score: state.score });
                        log::info!("Tower complete at {} layers", state.score);
                        return;
                    }
                }
            }

            // Next layer slides along the other axis
            let next_axis = axis.other();
            let mut next = Vec3::new(position.x, 0.0, position.z);
            next_axis.set(&mut next, -START_OFFSET);
            state.add_layer(next.x, next.z, width, depth, next_axis);
        }
    }
}

/// Position of the current top of the stack (after the active layer was removed)
fn prev_position(state: &GameState) -> Vec3 {
    state
        .stack
        .last()
        .map(|layer| layer.mesh.position)
        .unwrap_or(Vec3::ZERO)
}

fn end_run(state: &mut GameState) {
    match state.phase {
        GamePhase::Menu => {
            state.demo_restart_ticks = Some(DEMO_RESTART_TICKS);
        }
        _ => {
            state.set_phase(GamePhase::GameOver);
            state.events.push(GameEvent::GameOver { score: state.score });
            log::info!("Game over with score {}", state.score);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Axis, GamePhase};
    use crate::tuning::Tuning;

    fn playing(tuning: Tuning) -> GameState {
        let mut state = GameState::new(12345, tuning);
        state.reset(12345, GamePhase::Playing);
        state.drain_events();
        state
    }

    /// Put the active layer at `offset` along its axis
    fn park_top_layer(state: &mut GameState, offset: f32) {
        let current = state.stack.last().unwrap().offset();
        state.move_top_layer(offset - current);
    }

    /// Put the active layer `delta` away from the layer below it
    fn park_relative(state: &mut GameState, delta: f32) {
        let (top, prev) = state.top_pair().unwrap();
        let target = top.axis.get(prev.mesh.position) + delta;
        park_top_layer(state, target);
    }

    fn place() -> TickInput {
        TickInput {
            place: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_tick_moves_active_layer() {
        let mut state = playing(Tuning::classic());
        let before = state.stack.last().unwrap().offset();
        tick(&mut state, &TickInput::default(), SIM_DT);
        let after = state.stack.last().unwrap().offset();
        assert!((after - before - Tuning::classic().speed * SIM_DT).abs() < 1e-5);
    }

    #[test]
    fn test_perfect_placement() {
        let mut state = playing(Tuning::classic());
        park_top_layer(&mut state, 0.0);
        place_layer(&mut state);

        assert_eq!(state.score, 1);
        assert!(state.overhangs.is_empty());
        assert_eq!(state.stack.len(), 3);
        assert_eq!(state.stack[1].width, 3.0);
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::Placed {
                perfect: true,
                score: 1
            }]
        );

        // Next layer moves along Z, starting off the tower
        let next = state.stack.last().unwrap();
        assert_eq!(next.axis, Axis::Z);
        assert_eq!(next.offset(), -START_OFFSET);
        assert_eq!(next.mesh.position.y, 2.0 * BOX_HEIGHT);
    }

    #[test]
    fn test_partial_placement_cuts_and_spawns_overhang() {
        // Box size 2, previous at x=0, current at x=0.5
        let mut state = playing(Tuning::summit());
        park_top_layer(&mut state, 0.5);
        place_layer(&mut state);

        let placed = &state.stack[1];
        assert!((placed.width - 1.5).abs() < 1e-5);
        assert_eq!(placed.depth, 2.0);
        assert!((placed.mesh.position.x - 0.25).abs() < 1e-5);

        assert_eq!(state.overhangs.len(), 1);
        let overhang = &state.overhangs[0];
        assert!((overhang.width - 0.5).abs() < 1e-5);
        assert!((overhang.mesh.position.x - 1.25).abs() < 1e-5);
        assert!(!state.world.body(overhang.body).unwrap().is_static());

        // Next layer inherits the trimmed footprint and the cut position
        let next = state.stack.last().unwrap();
        assert!((next.width - 1.5).abs() < 1e-5);
        assert!((next.mesh.position.x - 0.25).abs() < 1e-5);
        assert_eq!(state.score, 1);
    }

    #[test]
    fn test_full_miss_ends_game() {
        let mut state = playing(Tuning::summit());
        park_top_layer(&mut state, 2.5);
        place_layer(&mut state);

        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.score, 0);
        assert_eq!(state.stack.len(), 1);
        assert_eq!(state.overhangs.len(), 1);
        assert_eq!(state.drain_events(), vec![GameEvent::GameOver { score: 0 }]);

        // Missed layer falls, nothing else moves
        let y = state.overhangs[0].mesh.position.y;
        for _ in 0..30 {
            tick(&mut state, &place(), SIM_DT);
        }
        assert!(state.overhangs[0].mesh.position.y < y);
        assert_eq!(state.score, 0);
        assert_eq!(state.stack.len(), 1);
    }

    #[test]
    fn test_cut_piece_comes_to_rest_on_ground() {
        let mut state = playing(Tuning::summit());
        park_top_layer(&mut state, 0.5);
        place_layer(&mut state);
        assert_eq!(state.overhangs.len(), 1);

        for _ in 0..(5.0 / SIM_DT) as usize {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }

        // Resting at the foundation's base, not dropped to the kill plane
        let piece = state.world.body(state.overhangs[0].body).unwrap();
        assert!(piece.position.y.abs() < 0.05, "y = {}", piece.position.y);
        assert!(!piece.sleeping);
    }

    #[test]
    fn test_place_input_through_tick() {
        let mut state = playing(Tuning::classic());
        park_top_layer(&mut state, -Tuning::classic().speed * SIM_DT);
        tick(&mut state, &place(), SIM_DT);
        assert_eq!(state.score, 1);
        assert!(state.overhangs.is_empty());
    }

    #[test]
    fn test_auto_miss_respawns_without_scoring() {
        let mut state = playing(Tuning::classic());
        park_top_layer(&mut state, Tuning::classic().miss_distance);
        tick(&mut state, &TickInput::default(), SIM_DT);

        assert_eq!(state.score, 0);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.stack.len(), 2);
        assert_eq!(state.overhangs.len(), 1);
        assert_eq!(state.drain_events(), vec![GameEvent::AutoMiss]);

        let replacement = state.stack.last().unwrap();
        assert_eq!(replacement.offset(), -START_OFFSET);
        assert_eq!(replacement.width, 3.0);
        assert_eq!(replacement.mesh.position.y, BOX_HEIGHT);
    }

    #[test]
    fn test_score_counts_each_placement() {
        let mut state = playing(Tuning::classic());
        for expected in 1..=5 {
            park_relative(&mut state, 0.1);
            place_layer(&mut state);
            assert_eq!(state.score, expected);
        }
        assert_eq!(state.stack.len(), 7);
        assert_eq!(state.overhangs.len(), 5);
        // Layers alternate axis
        assert_eq!(state.stack[1].axis, Axis::X);
        assert_eq!(state.stack[2].axis, Axis::Z);
        assert_eq!(state.stack[3].axis, Axis::X);
    }

    #[test]
    fn test_overhangs_only_grow_until_reset() {
        let mut state = playing(Tuning::classic());
        let mut seen = 0;
        for _ in 0..4 {
            park_relative(&mut state, 0.2);
            place_layer(&mut state);
            for _ in 0..10 {
                tick(&mut state, &TickInput::default(), SIM_DT);
            }
            assert!(state.overhangs.len() > seen);
            seen = state.overhangs.len();
        }
        state.reset(1, GamePhase::Playing);
        assert!(state.overhangs.is_empty());
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_pause_freezes_layer() {
        let mut state = playing(Tuning::classic());
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause, SIM_DT);
        assert_eq!(state.phase, GamePhase::Paused);

        let before = state.stack.last().unwrap().offset();
        for _ in 0..10 {
            tick(&mut state, &place(), SIM_DT);
        }
        assert_eq!(state.stack.last().unwrap().offset(), before);
        assert_eq!(state.score, 0);

        tick(&mut state, &pause, SIM_DT);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_win_at_target_height() {
        let tuning = Tuning {
            win_height: Some(3),
            ..Tuning::summit()
        };
        let mut state = playing(tuning);
        for _ in 0..3 {
            park_top_layer(&mut state, 0.0);
            place_layer(&mut state);
        }
        assert_eq!(state.phase, GamePhase::Won);
        let events = state.drain_events();
        assert_eq!(events.last(), Some(&GameEvent::Won { score: 3 }));
        // No new moving layer after the win
        assert_eq!(state.stack.len(), 4);

        let camera = state.camera;
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.camera.orbit > camera.orbit);
    }

    #[test]
    fn test_autopilot_builds_in_menu_without_events() {
        let mut state = GameState::new(2024, Tuning::classic());
        // Long enough for a few layers, too short for the demo to miss
        for _ in 0..(4.0 / SIM_DT) as usize {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.phase, GamePhase::Menu);
        assert!(state.stack.len() > 2);
        assert!(state.score > 0);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_autopilot_plays_when_asked() {
        let mut state = playing(Tuning::classic());
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        for _ in 0..(5.0 / SIM_DT) as usize {
            tick(&mut state, &input, SIM_DT);
        }
        assert!(state.score > 0);
    }

    #[test]
    fn test_menu_demo_rebuilds_after_miss() {
        let mut state = GameState::new(5, Tuning::classic());
        park_top_layer(&mut state, 5.0);
        place_layer(&mut state);
        assert_eq!(state.demo_restart_ticks, Some(DEMO_RESTART_TICKS));
        assert_eq!(state.phase, GamePhase::Menu);

        for _ in 0..=DEMO_RESTART_TICKS {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.demo_restart_ticks, None);
        assert_eq!(state.stack.len(), 2);
        assert!(state.overhangs.is_empty());
    }
}
