/// Visual collaborator seam for characters.
///
/// A character asks its visual to play clips; the visual reports when a
/// one-shot clip has finished via `advance`. The character consumes that
/// report as an explicit input signal (`Character::animation_complete`).

use super::assets::{Animation, CharacterAssets};

pub trait CharacterVisual {
    fn play(&mut self, anim: Animation);

    /// Advance playback by `delta_ms`. Returns the clip that just finished.
    /// Looping clips never finish.
    fn advance(&mut self, delta_ms: f64) -> Option<Animation>;

    fn destroy(&mut self);
}

/// Clock-driven visual: tracks clip timing from the asset map and nothing
/// else. The terminal renderer draws characters from their lifecycle state.
#[derive(Debug)]
pub struct TimedVisual {
    assets: CharacterAssets,
    current: Option<Animation>,
    elapsed_ms: f64,
    destroyed: bool,
}

impl TimedVisual {
    pub fn new(assets: CharacterAssets) -> Self {
        TimedVisual { assets, current: None, elapsed_ms: 0.0, destroyed: false }
    }

    #[cfg(test)]
    pub fn current(&self) -> Option<Animation> {
        self.current
    }

    #[cfg(test)]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl CharacterVisual for TimedVisual {
    fn play(&mut self, anim: Animation) {
        if self.destroyed {
            return;
        }
        log::trace!("play {}", anim.key(&self.assets.name));
        self.current = Some(anim);
        self.elapsed_ms = 0.0;
    }

    fn advance(&mut self, delta_ms: f64) -> Option<Animation> {
        let anim = self.current?;
        let clip = self.assets.clip(anim);
        self.elapsed_ms += delta_ms;
        if clip.looping {
            if clip.duration_ms > 0.0 {
                self.elapsed_ms %= clip.duration_ms;
            }
            None
        } else if self.elapsed_ms >= clip.duration_ms {
            self.current = None;
            Some(anim)
        } else {
            None
        }
    }

    fn destroy(&mut self) {
        self.current = None;
        self.destroyed = true;
    }
}
