//! Audio system
//!
//! Sound cues come from the page's `<audio>` elements when they exist; any
//! cue without one falls back to a short procedural Web Audio tone.

use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AudioContext, GainNode, HtmlAudioElement, OscillatorNode, OscillatorType};

use crate::settings::Settings;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Run started from the menu
    Start,
    /// Layer placed within tolerance
    Perfect,
    /// Layer placed with an overhang trimmed off
    Cut,
    /// Layer slid past the tower and was replaced
    AutoMiss,
    /// Complete miss
    GameOver,
    /// Win height reached
    Win,
}

impl SoundEffect {
    /// Id of the `<audio>` element carrying this cue, if the page has one
    pub fn element_id(self) -> Option<&'static str> {
        match self {
            SoundEffect::Perfect => Some("place-sound"),
            SoundEffect::Cut | SoundEffect::AutoMiss => Some("cut-sound"),
            SoundEffect::GameOver => Some("gameover-sound"),
            SoundEffect::Win => Some("win-sound"),
            SoundEffect::Start => None,
        }
    }
}

const MUSIC_ID: &str = "bg-music";

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    sfx_volume: f32,
    music_volume: f32,
    music_wanted: bool,
}

/// Look up an `<audio>` element by id
fn audio_element(id: &str) -> Option<HtmlAudioElement> {
    web_sys::window()?
        .document()?
        .get_element_by_id(id)?
        .dyn_into::<HtmlAudioElement>()
        .ok()
}

/// Start playback, logging rejections (autoplay policy, missing source)
fn play_element(el: &HtmlAudioElement, label: &'static str) {
    match el.play() {
        Ok(promise) => {
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = JsFuture::from(promise).await {
                    log::warn!("Audio '{}' playback rejected: {:?}", label, e);
                }
            });
        }
        Err(e) => log::warn!("Audio '{}' playback failed: {:?}", label, e),
    }
}

impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        // Try to create audio context (may fail if not in secure context)
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - procedural sounds disabled");
        }
        let mut audio = Self {
            ctx,
            sfx_volume: 0.0,
            music_volume: 0.0,
            music_wanted: false,
        };
        audio.apply_settings(settings);
        audio
    }

    /// Pick up volume and mute changes
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.sfx_volume = settings.effective_sfx_volume();
        self.music_volume = settings.effective_music_volume();

        if let Some(music) = audio_element(MUSIC_ID) {
            music.set_volume(self.music_volume as f64);
            if self.music_volume <= 0.0 {
                let _ = music.pause();
            } else if self.music_wanted && music.paused() {
                play_element(&music, MUSIC_ID);
            }
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }
        }
    }

    /// Start the looping background track
    pub fn start_music(&mut self) {
        self.music_wanted = true;
        let Some(music) = audio_element(MUSIC_ID) else {
            return;
        };
        music.set_loop(true);
        music.set_volume(self.music_volume as f64);
        if self.music_volume > 0.0 && music.paused() {
            play_element(&music, MUSIC_ID);
        }
    }

    /// Pause the background track without forgetting that it should play
    pub fn suspend_music(&self) {
        if let Some(music) = audio_element(MUSIC_ID) {
            let _ = music.pause();
        }
    }

    /// Undo `suspend_music` if the track was started
    pub fn resume_music(&self) {
        if !self.music_wanted || self.music_volume <= 0.0 {
            return;
        }
        if let Some(music) = audio_element(MUSIC_ID) {
            if music.paused() {
                play_element(&music, MUSIC_ID);
            }
        }
    }

    /// Play a sound effect
    pub fn play(&self, effect: SoundEffect) {
        let vol = self.sfx_volume;
        if vol <= 0.0 {
            return;
        }

        if let Some(el) = effect.element_id().and_then(audio_element) {
            el.set_volume(vol as f64);
            el.set_current_time(0.0);
            play_element(&el, effect.element_id().unwrap_or("sfx"));
            return;
        }

        let Some(ctx) = &self.ctx else { return };
        self.resume();

        match effect {
            SoundEffect::Start => self.play_start(ctx, vol),
            SoundEffect::Perfect => self.play_perfect(ctx, vol),
            SoundEffect::Cut => self.play_cut(ctx, vol),
            SoundEffect::AutoMiss => self.play_auto_miss(ctx, vol),
            SoundEffect::GameOver => self.play_game_over(ctx, vol),
            SoundEffect::Win => self.play_win(ctx, vol),
        }
    }

    // === Procedural fallbacks ===

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Single decaying tone starting `delay` seconds from now
    fn blip(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
        peak: f32,
        delay: f64,
        length: f64,
    ) {
        let Some((osc, gain)) = self.create_osc(ctx, freq, osc_type) else {
            return;
        };
        let t = ctx.current_time() + delay;
        gain.gain().set_value_at_time(peak, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + length)
            .ok();
        osc.start_with_when(t).ok();
        osc.stop_with_when(t + length + 0.05).ok();
    }

    /// Start - whoosh up
    fn play_start(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 200.0, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.3, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.2)
            .ok();
        osc.frequency().set_value_at_time(200.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(600.0, t + 0.15)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.25).ok();
    }

    /// Perfect - bright two-note chime
    fn play_perfect(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [880.0, 1320.0].iter().enumerate() {
            self.blip(ctx, *freq, OscillatorType::Sine, vol * 0.25, i as f64 * 0.06, 0.2);
        }
    }

    /// Cut - solid thump
    fn play_cut(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 150.0, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.6, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.1)
            .ok();
        osc.frequency().set_value_at_time(150.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(60.0, t + 0.1)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.15).ok();
    }

    /// Auto-miss - short descending slide
    fn play_auto_miss(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 300.0, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.3, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.4)
            .ok();
        osc.frequency().set_value_at_time(300.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(80.0, t + 0.4)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.5).ok();
    }

    /// Game over - sad descending
    fn play_game_over(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [400.0, 350.0, 300.0, 200.0].iter().enumerate() {
            self.blip(ctx, *freq, OscillatorType::Sine, vol * 0.3, i as f64 * 0.2, 0.3);
        }
    }

    /// Win - celebratory
    fn play_win(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [500.0, 600.0, 700.0, 800.0, 1000.0].iter().enumerate() {
            self.blip(ctx, *freq, OscillatorType::Triangle, vol * 0.25, i as f64 * 0.08, 0.25);
        }
    }
}
