//! Noms de fichiers locaux des pistes téléchargées

use regex::Regex;
use std::sync::LazyLock;

/// Caractères interdits sur les systèmes de fichiers courants
static ILLEGAL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("valid regex"));

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Extension des fichiers audio téléchargés
pub const AUDIO_EXTENSION: &str = "mp3";

/// Construit le nom de fichier `"{artiste} - {titre}.mp3"`
///
/// Les caractères `< > : " / \ | ? *` sont supprimés, puis chaque suite
/// d'espaces est réduite à un seul espace. Deux titres différents peuvent
/// produire le même nom : le dernier fichier écrit l'emporte.
pub fn track_file_name(artist: &str, title: &str) -> String {
    let raw = format!("{} - {}.{}", artist, title, AUDIO_EXTENSION);
    sanitize(&raw)
}

/// Retire les caractères interdits et compacte les espaces
pub fn sanitize(name: &str) -> String {
    let stripped = ILLEGAL_CHARS.replace_all(name, "");
    WHITESPACE_RUNS.replace_all(&stripped, " ").into_owned()
}
