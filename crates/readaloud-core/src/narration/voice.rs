/// A voice offered by the speech capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceDescriptor {
    /// Identifier passed back to the capability
    pub id: String,
    /// Human readable name
    pub name: String,
    /// BCP 47 style language tag, e.g. "en-US"
    pub lang: String,
}

impl VoiceDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// Voices reported by the capability, in the capability's order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceCatalog {
    voices: Vec<VoiceDescriptor>,
}

impl VoiceCatalog {
    /// Build a catalog, keeping the first voice for each id
    pub fn from_voices(voices: Vec<VoiceDescriptor>) -> Self {
        let mut unique: Vec<VoiceDescriptor> = Vec::with_capacity(voices.len());
        for voice in voices {
            if !unique.iter().any(|v| v.id == voice.id) {
                unique.push(voice);
            }
        }
        Self { voices: unique }
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VoiceDescriptor> {
        self.voices.iter()
    }

    pub fn first(&self) -> Option<&VoiceDescriptor> {
        self.voices.first()
    }

    pub fn get(&self, id: &str) -> Option<&VoiceDescriptor> {
        self.voices.iter().find(|v| v.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&VoiceDescriptor> {
        self.voices.iter().find(|v| v.name == name)
    }

    /// Voice by id, falling back to its display name
    pub fn lookup(&self, key: &str) -> Option<&VoiceDescriptor> {
        self.get(key).or_else(|| self.find_by_name(key))
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.voices.iter().position(|v| v.id == id)
    }

    /// Voice next to `current` (wrapping), or the first voice when `current` is unknown
    pub fn neighbour(&self, current: Option<&str>, forward: bool) -> Option<&VoiceDescriptor> {
        let len = self.voices.len();
        if len == 0 {
            return None;
        }
        let index = match current.and_then(|id| self.position(id)) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        self.voices.get(index)
    }
}

/// How the active voice was chosen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VoiceSelection {
    /// Nothing available yet; the capability's own default is used
    #[default]
    None,
    /// Picked automatically from the catalog; replaced by later catalog events
    Default(String),
    /// Chosen by the user; never overridden by catalog events
    Explicit(String),
}

impl VoiceSelection {
    pub fn voice_id(&self) -> Option<&str> {
        match self {
            VoiceSelection::None => None,
            VoiceSelection::Default(id) | VoiceSelection::Explicit(id) => Some(id),
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, VoiceSelection::Explicit(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> VoiceCatalog {
        VoiceCatalog::from_voices(vec![
            VoiceDescriptor::new("en-us", "English (America)", "en-US"),
            VoiceDescriptor::new("fr", "French", "fr-FR"),
            VoiceDescriptor::new("en-us", "English duplicate", "en-US"),
            VoiceDescriptor::new("de", "German", "de-DE"),
        ])
    }

    #[test]
    fn test_duplicates_dropped() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("en-us").unwrap().name, "English (America)");
        assert_eq!(catalog.find_by_name("German").unwrap().id, "de");
    }

    #[test]
    fn test_lookup_prefers_id_then_name() {
        let catalog = catalog();
        assert_eq!(catalog.lookup("fr").unwrap().name, "French");
        assert_eq!(catalog.lookup("English (America)").unwrap().id, "en-us");
        assert!(catalog.lookup("Klingon").is_none());
    }

    #[test]
    fn test_neighbour_wraps() {
        let catalog = catalog();
        assert_eq!(catalog.neighbour(Some("de"), true).unwrap().id, "en-us");
        assert_eq!(catalog.neighbour(Some("en-us"), false).unwrap().id, "de");
        assert_eq!(catalog.neighbour(None, false).unwrap().id, "en-us");
        assert!(VoiceCatalog::default().neighbour(None, true).is_none());
    }
}
