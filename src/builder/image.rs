use serde::{Deserialize, Serialize};

use super::{BuilderError, EntryId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, rename = "type")]
    pub content_type: String,
}

/// An uploaded image attached to a question, its explanation, or one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// empty until normalization assigns one
    #[serde(default)]
    pub id: EntryId,
    pub url: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub metadata: ImageMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageTarget {
    Question,
    Explanation,
    Entry(EntryId),
}

impl std::fmt::Display for ImageTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageTarget::Question => f.write_str("question"),
            ImageTarget::Explanation => f.write_str("explanation"),
            ImageTarget::Entry(id) => write!(f, "entry {}", id),
        }
    }
}

/// Image bookkeeping shared by the question forms.
pub trait ImageSlots {
    fn image_slot(&mut self, target: &ImageTarget) -> Result<&mut Vec<Image>, BuilderError>;

    fn fresh_image_id(&mut self) -> EntryId;

    /// Attaches `image` under a freshly assigned id and returns that id.
    fn attach_image(
        &mut self,
        target: &ImageTarget,
        mut image: Image,
    ) -> Result<EntryId, BuilderError> {
        self.image_slot(target)?;
        image.id = self.fresh_image_id();
        let id = image.id.clone();
        self.image_slot(target)?.push(image);
        Ok(id)
    }

    fn remove_image(&mut self, target: &ImageTarget, id: &EntryId) -> Result<Image, BuilderError> {
        let slot = self.image_slot(target)?;
        let index = slot
            .iter()
            .position(|image| &image.id == id)
            .ok_or_else(|| BuilderError::UnknownImage { id: id.clone() })?;
        Ok(slot.remove(index))
    }

    fn set_image_label(
        &mut self,
        target: &ImageTarget,
        id: &EntryId,
        label: &str,
        alt_text: &str,
    ) -> Result<(), BuilderError> {
        let image = self
            .image_slot(target)?
            .iter_mut()
            .find(|image| &image.id == id)
            .ok_or_else(|| BuilderError::UnknownImage { id: id.clone() })?;
        image.label = label.to_string();
        image.alt_text = alt_text.to_string();
        Ok(())
    }
}
