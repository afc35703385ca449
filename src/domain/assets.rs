/// Per-character animation asset map.
///
/// The core never plays animations itself; it only needs to know which
/// clips a character has and how long the one-shot ones last so a visual
/// collaborator can report their completion.

use std::collections::HashMap;

use crate::config::CharacterAnimConfig;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Animation {
    Raise,
    Alive,
    Miss,
    Hit,
}

impl Animation {
    /// Clip key in the form `<character>-<animation>`.
    pub fn key(self, character: &str) -> String {
        let suffix = match self {
            Animation::Raise => "raise",
            Animation::Alive => "alive",
            Animation::Miss => "miss",
            Animation::Hit => "hit",
        };
        format!("{character}-{suffix}")
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct AnimationClip {
    pub duration_ms: f64,
    pub looping: bool,
}

impl AnimationClip {
    pub fn once(duration_ms: f64) -> Self {
        AnimationClip { duration_ms, looping: false }
    }

    pub fn looped(duration_ms: f64) -> Self {
        AnimationClip { duration_ms, looping: true }
    }
}

#[derive(Clone, Debug)]
pub struct CharacterAssets {
    pub name: String,
    pub raise: AnimationClip,
    pub alive: AnimationClip,
    pub miss: AnimationClip,
    pub hit: AnimationClip,
}

impl CharacterAssets {
    pub fn clip(&self, anim: Animation) -> AnimationClip {
        match anim {
            Animation::Raise => self.raise,
            Animation::Alive => self.alive,
            Animation::Miss => self.miss,
            Animation::Hit => self.hit,
        }
    }

    fn from_config(name: &str, cfg: &CharacterAnimConfig) -> Self {
        CharacterAssets {
            name: name.to_string(),
            raise: AnimationClip::once(cfg.raise_ms),
            alive: AnimationClip::looped(cfg.alive_ms),
            miss: AnimationClip::once(cfg.miss_ms),
            hit: AnimationClip::once(cfg.hit_ms),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AssetMap {
    characters: HashMap<String, CharacterAssets>,
}

impl AssetMap {
    pub fn from_config(characters: &HashMap<String, CharacterAnimConfig>) -> Self {
        let mut map = AssetMap::default();
        for (name, cfg) in characters {
            map.insert(CharacterAssets::from_config(name, cfg));
        }
        if map.get("mole").is_none() {
            map.insert(CharacterAssets::from_config("mole", &CharacterAnimConfig::default()));
        }
        map
    }

    pub fn insert(&mut self, assets: CharacterAssets) {
        self.characters.insert(assets.name.clone(), assets);
    }

    pub fn get(&self, name: &str) -> Option<&CharacterAssets> {
        self.characters.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mole_is_always_present() {
        let map = AssetMap::from_config(&HashMap::new());
        let mole = map.get("mole").expect("mole assets");
        assert!(mole.alive.looping);
        assert!(!mole.hit.looping);
        assert!(map.get("rabbit").is_none());
    }

    #[test]
    fn configured_durations_are_used() {
        let mut chars = HashMap::new();
        chars.insert(
            "mole".to_string(),
            CharacterAnimConfig { raise_ms: 100.0, alive_ms: 400.0, miss_ms: 200.0, hit_ms: 300.0 },
        );
        let map = AssetMap::from_config(&chars);
        let mole = map.get("mole").unwrap();
        assert_eq!(mole.clip(Animation::Raise).duration_ms, 100.0);
        assert_eq!(mole.clip(Animation::Hit).duration_ms, 300.0);
    }

    #[test]
    fn clip_keys_follow_character_name() {
        assert_eq!(Animation::Raise.key("mole"), "mole-raise");
        assert_eq!(Animation::Hit.key("mole"), "mole-hit");
    }
}
