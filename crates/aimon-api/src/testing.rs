//! In-memory collaborators for handler and cache tests

use aimon_db::{Creature, NewCreature, Power};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use gemini_client::GeminiError;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cache::{CacheBackend, CacheError, MokaBackend, ReadThroughCache};
use crate::gallery::GalleryCache;
use crate::generator::{CreatureGenerator, GeneratedCreature};
use crate::images::{DecodedImage, ImageError, ImageStore};
use crate::state::AppState;
use crate::store::CreatureStore;

pub const PNG_BYTES: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

pub fn make_creature(id: i64, name: &str) -> Creature {
    Creature {
        id,
        name: name.to_string(),
        creature_type: "Ink / Paper".to_string(),
        powers: vec![
            Power {
                name: "Ink Splash".to_string(),
                description: "Splatters ink across the page".to_string(),
            },
            Power {
                name: "Fold".to_string(),
                description: "Folds itself out of harm's way".to_string(),
            },
        ],
        characteristics: "Scribbly and shy".to_string(),
        image_url: format!("/images/creature-{id}.png"),
        doodle_source: "iVBORw0KGgo".to_string(),
        like_count: 0,
        action_images: BTreeMap::new(),
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
            + ChronoDuration::minutes(id),
    }
}

/// Store holding creatures newest first, counting `list` calls
pub struct MemoryStore {
    creatures: Mutex<Vec<Creature>>,
    next_id: AtomicI64,
    pub list_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn with(creatures: Vec<Creature>) -> Self {
        let next_id = creatures.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        Self {
            creatures: Mutex::new(creatures),
            next_id: AtomicI64::new(next_id),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn snapshot(&self) -> Vec<Creature> {
        self.creatures.lock().unwrap().clone()
    }

    /// Insert bypassing the trait, assigning a fresh id
    pub fn insert_creature(&self, mut creature: Creature) -> Creature {
        creature.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        creature.created_at = Utc::now();
        self.creatures.lock().unwrap().insert(0, creature.clone());
        creature
    }

    pub fn like_creature(&self, id: i64) -> Option<Creature> {
        self.update(id, |c| c.like_count += 1)
    }

    fn update(&self, id: i64, change: impl FnOnce(&mut Creature)) -> Option<Creature> {
        let mut creatures = self.creatures.lock().unwrap();
        let creature = creatures.iter_mut().find(|c| c.id == id)?;
        change(creature);
        Some(creature.clone())
    }
}

#[async_trait]
impl CreatureStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Creature>, sqlx::Error> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot())
    }

    async fn get(&self, id: i64) -> Result<Option<Creature>, sqlx::Error> {
        Ok(self.snapshot().into_iter().find(|c| c.id == id))
    }

    async fn insert(&self, creature: &NewCreature) -> Result<Creature, sqlx::Error> {
        let mut row = make_creature(0, &creature.name);
        row.creature_type = creature.creature_type.clone();
        row.powers = creature.powers.clone();
        row.characteristics = creature.characteristics.clone();
        row.image_url = creature.image_url.clone();
        row.doodle_source = creature.doodle_source.clone();
        Ok(self.insert_creature(row))
    }

    async fn like(&self, id: i64) -> Result<Option<Creature>, sqlx::Error> {
        Ok(self.like_creature(id))
    }

    async fn set_action_image(
        &self,
        id: i64,
        power: &str,
        image_url: &str,
    ) -> Result<Option<Creature>, sqlx::Error> {
        Ok(self.update(id, |c| {
            c.action_images
                .insert(power.to_string(), image_url.to_string());
        }))
    }
}

/// Generator returning canned results
#[derive(Default)]
pub struct FakeGenerator {
    pub creature_calls: AtomicUsize,
    pub action_calls: AtomicUsize,
    pub action_calls_with_reference: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl CreatureGenerator for FakeGenerator {
    async fn generate_creature(
        &self,
        _api_key: &str,
        _doodle: &DecodedImage,
    ) -> Result<GeneratedCreature, GeminiError> {
        self.creature_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(GeminiError::EmptyResponse("image".to_string()));
        }

        Ok(GeneratedCreature {
            name: "Sparkfin".to_string(),
            types: vec!["Water".to_string(), "Electric".to_string()],
            powers: vec![Power {
                name: "Tide Shock".to_string(),
                description: "Charges the surf".to_string(),
            }],
            characteristics: "Small and curious".to_string(),
            image: DecodedImage {
                mime_type: "image/png".to_string(),
                bytes: PNG_BYTES.to_vec(),
            },
        })
    }

    async fn generate_action_image(
        &self,
        _api_key: &str,
        _creature: &Creature,
        power: &Power,
        reference: Option<&DecodedImage>,
    ) -> Result<DecodedImage, GeminiError> {
        self.action_calls.fetch_add(1, Ordering::SeqCst);
        if reference.is_some() {
            self.action_calls_with_reference
                .fetch_add(1, Ordering::SeqCst);
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(GeminiError::EmptyResponse("image".to_string()));
        }

        Ok(DecodedImage {
            mime_type: "image/png".to_string(),
            bytes: power.name.as_bytes().to_vec(),
        })
    }
}

/// Image store keeping everything in a map
#[derive(Default)]
pub struct MemoryImageStore {
    images: Mutex<HashMap<String, DecodedImage>>,
}

impl MemoryImageStore {
    pub fn put(&self, reference: &str, image: DecodedImage) {
        self.images
            .lock()
            .unwrap()
            .insert(reference.to_string(), image);
    }

    pub fn len(&self) -> usize {
        self.images.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn save(&self, image: &DecodedImage) -> Result<String, ImageError> {
        let mut images = self.images.lock().unwrap();
        let reference = format!("/images/mem-{}.png", images.len() + 1);
        images.insert(reference.clone(), image.clone());
        Ok(reference)
    }

    async fn load(&self, reference: &str) -> Result<DecodedImage, ImageError> {
        self.images
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| ImageError::NotFound(reference.to_string()))
    }
}

/// Backend whose every call fails
pub struct FailingBackend;

#[async_trait]
impl CacheBackend for FailingBackend {
    async fn get(&self, _key: &str) -> Result<Option<Value>, CacheError> {
        Err(CacheError::Backend("backend unavailable".into()))
    }

    async fn set(&self, _key: &str, _value: Value, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Backend("backend unavailable".into()))
    }
}

/// Builds an [`AppState`] from fakes while keeping handles for assertions
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub generator: Arc<FakeGenerator>,
    pub images: Arc<MemoryImageStore>,
    pub backend: Arc<dyn CacheBackend>,
    pub default_api_key: Option<String>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::with(Vec::new())),
            generator: Arc::new(FakeGenerator::default()),
            images: Arc::new(MemoryImageStore::default()),
            backend: Arc::new(MokaBackend::default()),
            default_api_key: None,
        }
    }

    pub fn with_creatures(mut self, creatures: Vec<Creature>) -> Self {
        self.store = Arc::new(MemoryStore::with(creatures));
        self
    }

    pub fn with_backend(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_default_key(mut self, key: &str) -> Self {
        self.default_api_key = Some(key.to_string());
        self
    }

    pub fn state(&self) -> AppState {
        AppState {
            store: self.store.clone(),
            gallery: Arc::new(GalleryCache::new(
                ReadThroughCache::new(self.backend.clone()),
                300,
            )),
            images: self.images.clone(),
            generator: self.generator.clone(),
            default_api_key: self.default_api_key.clone(),
            started_at: Utc::now(),
        }
    }
}
