use std::path::Path;

use ampsassist::{
    catalog::{YtDlpCatalog, parse_playlist},
    types::Track,
    utils::*,
};

#[test]
fn test_sanitize_playlist_name() {
    assert_eq!(sanitize_playlist_name("Chill Vibes"), "Chill Vibes");
    assert_eq!(sanitize_playlist_name("Rock/Metal: 2024!"), "RockMetal 2024");
    assert_eq!(sanitize_playlist_name("lo-fi_beats"), "lo-fi_beats");

    // Nothing usable left
    assert_eq!(sanitize_playlist_name("!!!"), "playlist");
    assert_eq!(sanitize_playlist_name("   "), "playlist");
}

#[test]
fn test_sanitize_path_component() {
    assert_eq!(sanitize_path_component("AC/DC", "x"), "AC_DC");
    assert_eq!(sanitize_path_component("What?", "x"), "What_");
    assert_eq!(sanitize_path_component("  Mr. Blue Sky.  ", "x"), "Mr. Blue Sky");
    assert_eq!(sanitize_path_component("", "Unknown Artist"), "Unknown Artist");
    assert_eq!(sanitize_path_component("///", "Unknown Album"), "Unknown Album");

    // Long values are capped on a char boundary
    let long = "é".repeat(200);
    let capped = sanitize_path_component(&long, "x");
    assert!(capped.len() <= 120);
    assert!(capped.chars().all(|c| c == 'é'));
}

#[test]
fn test_track_file_stem_and_id_roundtrip() {
    let stem = track_file_stem("Mr. Blue Sky", "aZ9_-x");
    assert_eq!(stem, "Mr. Blue Sky [aZ9_-x]");

    let file = format!("/lib/Artist/Album/{}.mp3", stem);
    assert_eq!(external_id_from_path(Path::new(&file)), Some("aZ9_-x"));
}

#[test]
fn test_external_id_from_path() {
    assert_eq!(
        external_id_from_path(Path::new("Song [abc123].mp3")),
        Some("abc123")
    );
    // The last bracket group wins
    assert_eq!(
        external_id_from_path(Path::new("Song [Live] [xyz].flac")),
        Some("xyz")
    );

    assert_eq!(external_id_from_path(Path::new("Song.mp3")), None);
    assert_eq!(external_id_from_path(Path::new("Song [].mp3")), None);
    assert_eq!(external_id_from_path(Path::new("Song [abc] live.mp3")), None);
    assert_eq!(external_id_from_path(Path::new("Song [..].mp3")), None);
}

#[test]
fn test_is_valid_external_id() {
    assert!(is_valid_external_id("dQw4w9WgXcQ"));
    assert!(!is_valid_external_id(""));
    assert!(!is_valid_external_id("has space"));
    assert!(!is_valid_external_id("a/b"));
    assert!(!is_valid_external_id("a]b"));

    // Ids double as staging directory names
    assert!(!is_valid_external_id("."));
    assert!(!is_valid_external_id(".."));
    assert!(is_valid_external_id("..a"));
    assert!(is_valid_external_id("a.b"));
}

#[test]
fn test_is_audio_file() {
    assert!(is_audio_file(Path::new("a.mp3")));
    assert!(is_audio_file(Path::new("a.FLAC")));
    assert!(is_audio_file(Path::new("a.opus")));
    assert!(!is_audio_file(Path::new("cover.jpg")));
    assert!(!is_audio_file(Path::new("a.m3u")));
    assert!(!is_audio_file(Path::new("noext")));
}

#[test]
fn test_is_manifest_file() {
    assert!(is_manifest_file(Path::new("Mix.m3u")));
    assert!(is_manifest_file(Path::new("Mix.M3U")));
    assert!(!is_manifest_file(Path::new("Mix.m3u8")));
}

#[test]
fn test_has_protection_marker() {
    assert!(has_protection_marker("Road trip [saved]", "[saved]"));
    assert!(has_protection_marker("[SAVED] forever", "[saved]"));
    assert!(!has_protection_marker("Road trip", "[saved]"));

    // An empty marker protects nothing
    assert!(!has_protection_marker("anything", ""));
}

#[test]
fn test_split_list() {
    assert_eq!(split_list("a, b,,c "), vec!["a", "b", "c"]);
    assert!(split_list(" , ").is_empty());
}

#[test]
fn test_track_artist_credit() {
    let mut track = Track {
        external_id: "id".to_string(),
        title: "t".to_string(),
        artists: vec!["Daft Punk".to_string(), "Pharrell".to_string()],
        album: "RAM".to_string(),
        playlist: "p".to_string(),
    };
    assert_eq!(track.primary_artist(), "Daft Punk");
    assert_eq!(track.artist_credit(), "Daft Punk, Pharrell");

    track.artists.clear();
    assert_eq!(track.primary_artist(), "Unknown Artist");
    assert_eq!(track.artist_credit(), "Unknown Artist");
}

#[test]
fn test_playlist_url() {
    assert_eq!(
        YtDlpCatalog::playlist_url("PL123"),
        "https://music.youtube.com/playlist?list=PL123"
    );
    assert_eq!(
        YtDlpCatalog::playlist_url("https://example.com/list"),
        "https://example.com/list"
    );
}

#[test]
fn test_parse_playlist() {
    let json = r#"{
        "id": "PL1",
        "title": "Morning Mix",
        "entries": [
            {"id": "aaa", "title": "First", "artists": ["Alpha", "Beta"], "album": "One"},
            null,
            {"id": "bbb", "title": "Second", "channel": "Gamma - Topic"},
            {"title": "No Id"},
            {"id": "bad id", "title": "Broken"},
            {"id": "ccc", "title": "Third", "artist": "Delta, Epsilon"}
        ]
    }"#;

    let playlist = parse_playlist("PL1", json, 100).unwrap();
    assert_eq!(playlist.title, "Morning Mix");

    let ids: Vec<&str> = playlist
        .tracks
        .iter()
        .map(|t| t.external_id.as_str())
        .collect();
    assert_eq!(ids, vec!["aaa", "bbb", "ccc"]);

    assert_eq!(playlist.tracks[0].artists, vec!["Alpha", "Beta"]);
    assert_eq!(playlist.tracks[0].album, "One");
    // Topic channels lose their suffix; the playlist title stands in for the album
    assert_eq!(playlist.tracks[1].artists, vec!["Gamma"]);
    assert_eq!(playlist.tracks[1].album, "Morning Mix");
    assert_eq!(playlist.tracks[2].artists, vec!["Delta", "Epsilon"]);

    assert_eq!(playlist.skipped.len(), 3);
}

#[test]
fn test_parse_playlist_respects_limit() {
    let json = r#"{"title": "Big", "entries": [
        {"id": "a", "title": "1"}, {"id": "b", "title": "2"}, {"id": "c", "title": "3"}
    ]}"#;

    let playlist = parse_playlist("PL2", json, 2).unwrap();
    assert_eq!(playlist.tracks.len(), 2);
    assert_eq!(playlist.tracks[1].external_id, "b");
}

#[test]
fn test_parse_playlist_falls_back_to_id_for_title() {
    let playlist = parse_playlist("PL3", r#"{"entries": []}"#, 10).unwrap();
    assert_eq!(playlist.title, "PL3");
    assert!(playlist.tracks.is_empty());

    assert!(parse_playlist("PL3", "not json", 10).is_err());
}
