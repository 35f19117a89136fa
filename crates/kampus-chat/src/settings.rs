use serde::{Deserialize, Serialize};

const FILE_SLOT: &str = "{file}";
const ID_SLOT: &str = "{id}";

/// URL templates for images and detail links in payload items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadLinks {
    /// Profile photo; `{file}` is replaced by the photo file id.
    pub profile_photo: String,
    /// Image for users without a photo.
    pub no_photo: String,
    pub information_image: String,
    /// Assignment detail page; `{id}` is replaced by the assignment id.
    pub assignment: String,
}

impl Default for PayloadLinks {
    fn default() -> Self {
        Self {
            profile_photo: "/api/v1/file/profile/{file}.jpg".into(),
            no_photo: "/api/v1/file/default/nophoto.png".into(),
            information_image: "/api/v1/file/default/information.png".into(),
            assignment: "/api/v1/assignment/{id}".into(),
        }
    }
}

impl PayloadLinks {
    pub fn photo_url(&self, file_id: Option<&str>) -> String {
        match file_id.filter(|f| !f.is_empty()) {
            Some(file) => self.profile_photo.replace(FILE_SLOT, file),
            None => self.no_photo.clone(),
        }
    }

    pub fn assignment_url(&self, id: i64) -> String {
        self.assignment.replace(ID_SLOT, &id.to_string())
    }
}

/// Deployment-specific knobs of the chat engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Name used in named replies when the session has no display name.
    pub fallback_name: String,
    pub links: PayloadLinks,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            fallback_name: "kamu".into(),
            links: PayloadLinks::default(),
        }
    }
}
