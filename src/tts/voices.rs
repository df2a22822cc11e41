//! Kokoro voice catalog.
//!
//! Voice identifiers encode their language in the first character
//! (`e` Spanish, `a` American English, `b` British English) and the speaker
//! gender in the second (`f`/`m`).

/// Metadata for a voice.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceInfo {
    /// Voice identifier passed to the engine (e.g., "ef_dora")
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Language group shown in listings
    pub language: &'static str,
}

/// Language codes the engine has pipelines for.
pub const LANGUAGE_CODES: &[&str] = &["e", "a", "b"];

/// Catalog of known voices, grouped by language.
pub const VOICES: &[VoiceInfo] = &[
    VoiceInfo {
        id: "ef_dora",
        name: "Dora",
        language: "Español",
    },
    VoiceInfo {
        id: "em_alex",
        name: "Alex",
        language: "Español",
    },
    VoiceInfo {
        id: "em_santa",
        name: "Santa",
        language: "Español",
    },
    VoiceInfo {
        id: "af_heart",
        name: "Heart",
        language: "English (US)",
    },
    VoiceInfo {
        id: "af_bella",
        name: "Bella",
        language: "English (US)",
    },
    VoiceInfo {
        id: "af_nicole",
        name: "Nicole",
        language: "English (US)",
    },
    VoiceInfo {
        id: "af_sarah",
        name: "Sarah",
        language: "English (US)",
    },
    VoiceInfo {
        id: "af_sky",
        name: "Sky",
        language: "English (US)",
    },
    VoiceInfo {
        id: "am_michael",
        name: "Michael",
        language: "English (US)",
    },
    VoiceInfo {
        id: "am_adam",
        name: "Adam",
        language: "English (US)",
    },
    VoiceInfo {
        id: "bf_emma",
        name: "Emma",
        language: "English (UK)",
    },
    VoiceInfo {
        id: "bf_isabella",
        name: "Isabella",
        language: "English (UK)",
    },
    VoiceInfo {
        id: "bm_george",
        name: "George",
        language: "English (UK)",
    },
    VoiceInfo {
        id: "bm_lewis",
        name: "Lewis",
        language: "English (UK)",
    },
];

/// Look up a voice by identifier.
pub fn get_voice(id: &str) -> Option<&'static VoiceInfo> {
    VOICES.iter().find(|v| v.id == id)
}

/// Language code of a voice: its first character.
///
/// Returns `None` for an empty identifier.
pub fn language_code(voice: &str) -> Option<&str> {
    let first = voice.chars().next()?;
    Some(&voice[..first.len_utf8()])
}

/// Whether the engine has a pipeline for this voice's language.
///
/// Voices outside the catalog are allowed as long as the language is known;
/// engines ship more voices than are listed here.
pub fn is_supported(voice: &str) -> bool {
    language_code(voice).is_some_and(|code| LANGUAGE_CODES.contains(&code))
}

/// Format a voice for `voxcast voices` output.
pub fn format_voice_info(voice: &VoiceInfo) -> String {
    format!("{:<12} {:<10} {}", voice.id, voice.name, voice.language)
}
