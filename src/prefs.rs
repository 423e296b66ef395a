//! Player preferences kept next to the leaderboard in key-value storage

use std::sync::Arc;

use tracing::warn;

use crate::game;
use crate::store::KeyValueStore;

const SPEED_KEY: &str = "snake_speed";
const SKIN_KEY: &str = "snake_skin";

pub const MIN_SPEED_MS: u64 = game::MIN_SPEED_MS;
pub const MAX_SPEED_MS: u64 = 250;
pub const SPEED_STEP_MS: u64 = 10;

/// How the snake is drawn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Skin {
    #[default]
    Classic,
    Python,
}

impl Skin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Skin::Classic => "classic",
            Skin::Python => "python",
        }
    }

    pub fn parse(raw: &str) -> Option<Skin> {
        match raw.trim() {
            "classic" => Some(Skin::Classic),
            "python" => Some(Skin::Python),
            _ => None,
        }
    }

    pub fn next(&self) -> Skin {
        match self {
            Skin::Classic => Skin::Python,
            Skin::Python => Skin::Classic,
        }
    }
}

pub struct Preferences {
    kv: Arc<dyn KeyValueStore>,
    speed_ms: u64,
    skin: Skin,
}

impl Preferences {
    /// Read stored preferences, falling back to `default_speed_ms` and the
    /// classic skin for anything missing or unreadable
    pub fn load(kv: Arc<dyn KeyValueStore>, default_speed_ms: u64) -> Self {
        let speed_ms = read(&*kv, SPEED_KEY)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(default_speed_ms);
        let speed_ms = clamp_speed(speed_ms);
        let skin = read(&*kv, SKIN_KEY)
            .and_then(|raw| Skin::parse(&raw))
            .unwrap_or_default();

        Self { kv, speed_ms, skin }
    }

    pub fn speed_ms(&self) -> u64 {
        self.speed_ms
    }

    pub fn skin(&self) -> Skin {
        self.skin
    }

    /// Store a new base speed, clamped to the allowed range. Returns the value kept.
    pub fn set_speed_ms(&mut self, speed_ms: u64) -> u64 {
        self.speed_ms = clamp_speed(speed_ms);
        write(&*self.kv, SPEED_KEY, &self.speed_ms.to_string());
        self.speed_ms
    }

    /// Shorter tick interval
    pub fn faster(&mut self) -> u64 {
        self.set_speed_ms(self.speed_ms.saturating_sub(SPEED_STEP_MS))
    }

    /// Longer tick interval
    pub fn slower(&mut self) -> u64 {
        self.set_speed_ms(self.speed_ms + SPEED_STEP_MS)
    }

    pub fn set_skin(&mut self, skin: Skin) {
        self.skin = skin;
        write(&*self.kv, SKIN_KEY, skin.as_str());
    }

    pub fn cycle_skin(&mut self) -> Skin {
        self.set_skin(self.skin.next());
        self.skin
    }
}

fn clamp_speed(speed_ms: u64) -> u64 {
    speed_ms.clamp(MIN_SPEED_MS, MAX_SPEED_MS)
}

fn read(kv: &dyn KeyValueStore, key: &str) -> Option<String> {
    kv.get_string(key)
        .map_err(|e| warn!(error = %e, key, "failed to read preference"))
        .ok()
        .flatten()
}

fn write(kv: &dyn KeyValueStore, key: &str, value: &str) {
    if let Err(e) = kv.put_string(key, value) {
        warn!(error = %e, key, "failed to save preference");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_defaults_when_nothing_stored() {
        let prefs = Preferences::load(Arc::new(MemoryStore::new()), 120);
        assert_eq!(prefs.speed_ms(), 120);
        assert_eq!(prefs.skin(), Skin::Classic);
    }

    #[test]
    fn test_default_speed_is_clamped_too() {
        let prefs = Preferences::load(Arc::new(MemoryStore::new()), 10);
        assert_eq!(prefs.speed_ms(), MIN_SPEED_MS);

        let prefs = Preferences::load(Arc::new(MemoryStore::new()), 900);
        assert_eq!(prefs.speed_ms(), MAX_SPEED_MS);
    }

    #[test]
    fn test_changes_survive_reload() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

        let mut prefs = Preferences::load(Arc::clone(&kv), 120);
        assert_eq!(prefs.faster(), 110);
        assert_eq!(prefs.cycle_skin(), Skin::Python);

        let reloaded = Preferences::load(kv, 120);
        assert_eq!(reloaded.speed_ms(), 110);
        assert_eq!(reloaded.skin(), Skin::Python);
    }

    #[test]
    fn test_speed_is_clamped() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut prefs = Preferences::load(Arc::clone(&kv), 120);

        assert_eq!(prefs.set_speed_ms(5), MIN_SPEED_MS);
        assert_eq!(prefs.faster(), MIN_SPEED_MS);
        assert_eq!(prefs.set_speed_ms(10_000), MAX_SPEED_MS);
        assert_eq!(prefs.slower(), MAX_SPEED_MS);
    }

    #[test]
    fn test_garbage_values_fall_back() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        kv.put_string(SPEED_KEY, "fast").unwrap();
        kv.put_string(SKIN_KEY, "neon").unwrap();

        let prefs = Preferences::load(kv, 130);
        assert_eq!(prefs.speed_ms(), 130);
        assert_eq!(prefs.skin(), Skin::Classic);
    }
}
