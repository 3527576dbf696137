mod common;

use std::time::Duration;

use ampsassist::plex::{PlexClient, RemoteSync};
use common::{FakePlaylist, FakePlex, TOKEN, TestMount, spawn_fake_plex};

fn remote_sync(base_url: &str, token: &str) -> RemoteSync {
    let client = PlexClient::new(base_url, token).unwrap();
    RemoteSync::new(client, "Music", "[saved]", Duration::ZERO)
}

fn library_with_playlists() -> FakePlex {
    let mut plex = FakePlex::with_music_section();
    plex.playlists = vec![
        FakePlaylist::new(
            "10",
            "Favorites",
            "All time [SAVED]",
            vec![
                "/data/music/library/A/B/One [1].mp3".to_string(),
                "/data/music/library/A/B/Two [2].mp3".to_string(),
            ],
        ),
        FakePlaylist::new("11", "Old Mix", "", Vec::new()),
    ];
    plex
}

#[tokio::test]
async fn test_list_playlists_flags_protection() {
    let (url, _plex) = spawn_fake_plex(library_with_playlists()).await;
    let client = PlexClient::new(&url, TOKEN).unwrap();

    let playlists = client.list_playlists("[saved]").await.unwrap();
    assert_eq!(playlists.len(), 2);
    assert!(playlists[0].protected);
    assert!(!playlists[1].protected);
    assert!(playlists.iter().all(|pl| pl.files.is_empty()));

    assert_eq!(client.section_id("Music").await.unwrap().as_deref(), Some("1"));
    assert_eq!(client.section_id("Movies").await.unwrap(), None);
}

#[tokio::test]
async fn test_discover_protected_reads_member_files() {
    let (url, _plex) = spawn_fake_plex(library_with_playlists()).await;
    let remote = remote_sync(&url, TOKEN);

    let state = remote.discover_protected().await;

    assert!(state.errors.is_empty(), "{:?}", state.errors);
    assert!(!state.incomplete);
    assert_eq!(state.titles(), vec!["Favorites"]);
    assert_eq!(
        state.files(),
        vec![
            "/data/music/library/A/B/One [1].mp3",
            "/data/music/library/A/B/Two [2].mp3",
        ]
    );
}

#[tokio::test]
async fn test_discover_protected_survives_listing_failure() {
    let mut plex = library_with_playlists();
    plex.fail_playlist_list = true;
    let (url, _plex) = spawn_fake_plex(plex).await;

    let state = remote_sync(&url, TOKEN).discover_protected().await;

    // Proceed with no remote protection, but say why
    assert!(state.playlists.is_empty());
    assert!(!state.incomplete);
    assert_eq!(state.errors.len(), 1);
    assert!(state.errors[0].contains("500"));
}

#[tokio::test]
async fn test_discover_protected_marks_unreadable_items() {
    let mut plex = library_with_playlists();
    plex.fail_items_for = Some("10".to_string());
    let (url, _plex) = spawn_fake_plex(plex).await;

    let state = remote_sync(&url, TOKEN).discover_protected().await;

    assert!(state.incomplete);
    assert_eq!(state.titles(), vec!["Favorites"]);
    assert!(state.files().is_empty());
}

#[tokio::test]
async fn test_discover_protected_with_bad_token() {
    let (url, _plex) = spawn_fake_plex(library_with_playlists()).await;

    let state = remote_sync(&url, "wrong").discover_protected().await;

    assert!(state.playlists.is_empty());
    assert!(state.errors[0].contains("401"));
}

#[tokio::test]
async fn test_mirror_replaces_unprotected_playlists() {
    let mount = TestMount::new();
    mount.write_manifest("Favorites", &["/data/music/library/x.mp3".to_string()]);
    mount.write_manifest("Mix One", &["/data/music/library/y.mp3".to_string()]);

    let (url, plex) = spawn_fake_plex(library_with_playlists()).await;
    let report = remote_sync(&url, TOKEN).mirror(&mount.manifests()).await;

    assert_eq!(report.aborted, None);
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.deleted, vec!["Old Mix"]);
    assert_eq!(report.skipped_protected, vec!["Favorites"]);
    assert_eq!(report.uploaded, vec!["Mix One"]);

    let plex = plex.lock().await;
    assert_eq!(plex.refreshed, vec!["1"]);
    assert_eq!(plex.deleted, vec!["11"]);
    assert_eq!(
        plex.uploads,
        vec![(
            "1".to_string(),
            "/data/music/playlists/Mix One.m3u".to_string()
        )]
    );
    // The protected playlist is untouched
    assert!(plex.playlists.iter().any(|pl| pl.rating_key == "10"));
}

#[tokio::test]
async fn test_mirror_reports_upload_failures() {
    let mount = TestMount::new();
    mount.write_manifest("Mix One", &["/data/music/library/y.mp3".to_string()]);
    mount.write_manifest("Mix Two", &["/data/music/library/z.mp3".to_string()]);

    let mut plex = library_with_playlists();
    plex.upload_error = Some((400, "path not found in section".to_string()));
    let (url, _plex) = spawn_fake_plex(plex).await;

    let report = remote_sync(&url, TOKEN).mirror(&mount.manifests()).await;

    // One failure does not stop the others from being tried
    assert_eq!(report.aborted, None);
    assert!(report.uploaded.is_empty());
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors[0].contains("path not found in section"));
}

#[tokio::test]
async fn test_mirror_aborts_without_section() {
    let mount = TestMount::new();
    mount.write_manifest("Mix One", &["/data/music/library/y.mp3".to_string()]);

    let mut plex = library_with_playlists();
    plex.sections.clear();
    let (url, shared) = spawn_fake_plex(plex).await;

    let report = remote_sync(&url, TOKEN).mirror(&mount.manifests()).await;

    assert!(report.aborted.is_some());
    let plex = shared.lock().await;
    assert!(plex.deleted.is_empty());
    assert!(plex.uploads.is_empty());
}

#[tokio::test]
async fn test_mirror_aborts_when_listing_fails() {
    let mount = TestMount::new();
    let mut plex = library_with_playlists();
    plex.fail_playlist_list = true;
    let (url, shared) = spawn_fake_plex(plex).await;

    let report = remote_sync(&url, TOKEN).mirror(&mount.manifests()).await;

    assert!(report.aborted.is_some());
    assert!(shared.lock().await.deleted.is_empty());
}
