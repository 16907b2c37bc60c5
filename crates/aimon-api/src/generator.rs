//! Creature generation backed by Gemini

use aimon_db::{Creature, Power};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use gemini_client::{GeminiClient, GeminiError, InlineData, Part};
use serde::Deserialize;
use tracing::info;

use crate::images::DecodedImage;

const MAX_TYPES: usize = 2;
const MAX_POWERS: usize = 4;

const METADATA_PROMPT: &str = r#"You are designing a collectible creature from a child's doodle.
Look at the attached drawing and invent the creature it depicts.
Respond with JSON only, shaped exactly like:
{"name": string, "types": [string] (one or two elemental categories),
 "powers": [{"name": string, "description": string}] (two to four),
 "characteristics": string (two or three sentences about looks and temperament)}"#;

/// Metadata and artwork produced for a new creature
#[derive(Debug, Clone)]
pub struct GeneratedCreature {
    pub name: String,
    pub types: Vec<String>,
    pub powers: Vec<Power>,
    pub characteristics: String,
    pub image: DecodedImage,
}

impl GeneratedCreature {
    /// The stored `type` column: one or two categories joined with " / "
    pub fn type_label(&self) -> String {
        self.types.join(" / ")
    }
}

/// Source of creature metadata and artwork
#[async_trait]
pub trait CreatureGenerator: Send + Sync {
    async fn generate_creature(
        &self,
        api_key: &str,
        doodle: &DecodedImage,
    ) -> Result<GeneratedCreature, GeminiError>;

    /// Render `creature` using `power`, guided by its portrait when available
    async fn generate_action_image(
        &self,
        api_key: &str,
        creature: &Creature,
        power: &Power,
        reference: Option<&DecodedImage>,
    ) -> Result<DecodedImage, GeminiError>;
}

#[derive(Debug, Deserialize)]
struct CreatureMetadata {
    #[serde(default)]
    name: String,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    powers: Vec<Power>,
    #[serde(default)]
    characteristics: String,
}

impl CreatureMetadata {
    /// Trim fields and clamp list lengths; fill blanks with neutral defaults
    fn normalize(mut self) -> Self {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            self.name = "Nameless Aimon".to_string();
        }

        self.types = self
            .types
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .take(MAX_TYPES)
            .collect();
        if self.types.is_empty() {
            self.types.push("Normal".to_string());
        }

        self.powers.retain(|p| !p.name.trim().is_empty());
        self.powers.truncate(MAX_POWERS);
        self.characteristics = self.characteristics.trim().to_string();
        self
    }
}

pub struct GeminiGenerator {
    client: GeminiClient,
    text_model: String,
    image_model: String,
}

impl GeminiGenerator {
    pub fn new(client: GeminiClient, text_model: &str, image_model: &str) -> Self {
        Self {
            client,
            text_model: text_model.to_string(),
            image_model: image_model.to_string(),
        }
    }
}

#[async_trait]
impl CreatureGenerator for GeminiGenerator {
    async fn generate_creature(
        &self,
        api_key: &str,
        doodle: &DecodedImage,
    ) -> Result<GeneratedCreature, GeminiError> {
        let doodle_part = Part::inline(&doodle.mime_type, doodle.to_base64());

        let metadata: CreatureMetadata = self
            .client
            .generate_json(
                api_key,
                &self.text_model,
                vec![Part::text(METADATA_PROMPT), doodle_part.clone()],
            )
            .await?;
        let metadata = metadata.normalize();
        info!(name = %metadata.name, "Generated creature metadata");

        let image = self
            .client
            .generate_image(
                api_key,
                &self.image_model,
                vec![Part::text(portrait_prompt(&metadata)), doodle_part],
            )
            .await?;

        Ok(GeneratedCreature {
            name: metadata.name,
            types: metadata.types,
            powers: metadata.powers,
            characteristics: metadata.characteristics,
            image: decode_inline(image)?,
        })
    }

    async fn generate_action_image(
        &self,
        api_key: &str,
        creature: &Creature,
        power: &Power,
        reference: Option<&DecodedImage>,
    ) -> Result<DecodedImage, GeminiError> {
        let mut parts = vec![Part::text(action_prompt(creature, power))];
        if let Some(image) = reference {
            parts.push(Part::inline(&image.mime_type, image.to_base64()));
        }

        let image = self
            .client
            .generate_image(api_key, &self.image_model, parts)
            .await?;
        decode_inline(image)
    }
}

fn portrait_prompt(metadata: &CreatureMetadata) -> String {
    format!(
        "Turn the attached doodle into polished creature-collector game artwork. \
         The creature is {name}, a {types} type. {characteristics} \
         Keep the doodle's silhouette and colours, full body, plain light background.",
        name = metadata.name,
        types = metadata.types.join(" / "),
        characteristics = metadata.characteristics,
    )
}

fn action_prompt(creature: &Creature, power: &Power) -> String {
    format!(
        "Draw {name}, a {types} type creature, using its power \"{power}\": {description}. \
         Dynamic action pose, same art style and design as the reference image.",
        name = creature.name,
        types = creature.creature_type,
        power = power.name,
        description = power.description,
    )
}

fn decode_inline(image: InlineData) -> Result<DecodedImage, GeminiError> {
    let bytes = STANDARD
        .decode(image.data.as_bytes())
        .map_err(|e| GeminiError::InvalidImage(e.to_string()))?;
    if bytes.is_empty() {
        return Err(GeminiError::InvalidImage("empty payload".to_string()));
    }
    Ok(DecodedImage {
        mime_type: image.mime_type,
        bytes,
    })
}
