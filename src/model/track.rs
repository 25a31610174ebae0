use serde::{Deserialize, Serialize};

/// Field names in the order they are reported and searched
pub const FIELD_ORDER: [&str; 7] = [
    "location",
    "title",
    "creator",
    "album",
    "annotation",
    "image",
    "duration",
];

/// A single playlist entry with its optional metadata
///
/// Every field is optional. Empty strings are kept as read but treated as
/// absent by the accessors, so `<location></location>` behaves like a
/// missing location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Absolute path, relative path or URL of the audio resource
    pub location: Option<String>,

    /// Track title
    pub title: Option<String>,

    /// Artist name
    pub creator: Option<String>,

    /// Album name
    pub album: Option<String>,

    /// Free-form comment
    pub annotation: Option<String>,

    /// Artwork URL
    pub image: Option<String>,

    /// Duration in milliseconds, kept as text
    pub duration: Option<String>,
}

impl Track {
    /// Create a track that only carries a location
    pub fn with_location(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::default()
        }
    }

    /// Non-empty value of the named field
    pub fn field(&self, key: &str) -> Option<&str> {
        let value = match key {
            "location" => &self.location,
            "title" => &self.title,
            "creator" => &self.creator,
            "album" => &self.album,
            "annotation" => &self.annotation,
            "image" => &self.image,
            "duration" => &self.duration,
            _ => return None,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }

    /// Set the named field. Unknown keys are ignored.
    pub fn set_field(&mut self, key: &str, value: String) {
        let slot = match key {
            "location" => &mut self.location,
            "title" => &mut self.title,
            "creator" => &mut self.creator,
            "album" => &mut self.album,
            "annotation" => &mut self.annotation,
            "image" => &mut self.image,
            "duration" => &mut self.duration,
            _ => return,
        };
        *slot = Some(value);
    }

    /// All non-empty fields as `(key, value)` pairs
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        FIELD_ORDER
            .into_iter()
            .filter_map(move |key| self.field(key).map(|value| (key, value)))
    }

    pub fn location(&self) -> Option<&str> {
        self.field("location")
    }

    pub fn title(&self) -> Option<&str> {
        self.field("title")
    }

    /// Fields used to narrow a title match to the right directory
    pub fn context_fields(&self) -> Vec<&str> {
        ["creator", "annotation"]
            .iter()
            .filter_map(|key| self.field(key))
            .collect()
    }

    /// Descriptive fields handed to a remote search, in field order
    ///
    /// Artwork URLs and durations are not search terms.
    pub fn search_terms(&self) -> Vec<&str> {
        self.fields()
            .filter(|(key, _)| !matches!(*key, "image" | "duration"))
            .map(|(_, value)| value)
            .collect()
    }

    /// Duration parsed as milliseconds, if present and numeric
    pub fn duration_ms(&self) -> Option<u64> {
        self.field("duration").and_then(|d| d.trim().parse().ok())
    }

    /// Diagnostic line for a track that could not be placed in the output
    pub fn describe(&self) -> String {
        self.fields()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect::<Vec<_>>()
            .join(" - ")
    }
}
