use crate::common::fixtures::{node, visited, DriveLayout};
use crate::common::tracing::init_tracing_from_env;
use fresh_explorer::config::Config;
use fresh_explorer::model::event::{ExplorerEvent, NavigationState};
use std::fs;

#[tokio::test]
async fn test_back_and_forward_walk_the_history() {
    init_tracing_from_env();
    let layout = DriveLayout::new().unwrap();
    let mut explorer = layout.started().await.unwrap();

    let users = node(&mut explorer, &layout.path("C/Users")).await;
    let alice = node(&mut explorer, &layout.path("C/Users/Alice")).await;
    explorer.navigator_mut().navigate(users).await.unwrap();
    explorer.navigator_mut().navigate(alice).await.unwrap();

    explorer.navigator_mut().back().await.unwrap();
    explorer.navigator_mut().back().await.unwrap();
    assert_eq!(
        explorer.navigator().current_path(),
        Some(layout.path("C").as_path())
    );
    assert_eq!(
        explorer.navigator().state(),
        NavigationState {
            can_go_back: false,
            can_go_forward: true,
            can_go_up: false,
        }
    );

    explorer.navigator_mut().forward().await.unwrap();
    explorer.navigator_mut().forward().await.unwrap();
    assert_eq!(explorer.navigator().current(), Some(alice));
    assert!(!explorer.navigator().state().can_go_forward);

    assert_eq!(
        visited(&explorer),
        vec![
            layout.path("C"),
            layout.path("C/Users"),
            layout.path("C/Users/Alice"),
            layout.path("C/Users"),
            layout.path("C"),
            layout.path("C/Users"),
            layout.path("C/Users/Alice"),
        ]
    );
}

#[tokio::test]
async fn test_going_up_selects_the_child_we_came_from() {
    let layout = DriveLayout::new().unwrap();
    let mut explorer = layout.started().await.unwrap();
    let music = node(&mut explorer, &layout.path("C/Users/Alice/Music")).await;
    explorer.navigator_mut().navigate(music).await.unwrap();
    explorer.events().clear();

    explorer.navigator_mut().up().await.unwrap();

    match explorer
        .events()
        .take_match("explorer:current_directory_changed")
    {
        Some(ExplorerEvent::CurrentDirectoryChanged { path, selected }) => {
            assert_eq!(path, layout.path("C/Users/Alice"));
            assert_eq!(selected.as_deref(), Some("Music"));
        }
        other => panic!("unexpected event {:?}", other),
    }
    let listing = explorer.navigator_mut().list_current().await.unwrap();
    assert_eq!(listing.selected_entry().map(|e| e.name.as_str()), Some("Music"));
}

#[tokio::test]
async fn test_listing_uses_natural_order() {
    let layout = DriveLayout::new().unwrap();
    let mut explorer = layout.started().await.unwrap();
    let alice = node(&mut explorer, &layout.path("C/Users/Alice")).await;
    explorer.navigator_mut().navigate(alice).await.unwrap();

    let listing = explorer.navigator_mut().list_current().await.unwrap();
    let names: Vec<_> = listing.entries.iter().map(|e| e.name.as_str()).collect();

    assert_eq!(names, vec!["Music", "notes.txt", "track2.mp3", "track10.mp3"]);
}

#[tokio::test]
async fn test_deleted_directory_falls_back_to_history() {
    let layout = DriveLayout::new().unwrap();
    let mut explorer = layout.started().await.unwrap();
    let windows = node(&mut explorer, &layout.path("C/Windows")).await;
    let music = node(&mut explorer, &layout.path("C/Users/Alice/Music")).await;
    explorer.navigator_mut().navigate(windows).await.unwrap();
    explorer.navigator_mut().navigate(music).await.unwrap();

    fs::remove_dir_all(layout.path("C/Users/Alice/Music")).unwrap();
    explorer.navigator_mut().force_update().await.unwrap();

    assert_eq!(
        explorer.navigator().current_path(),
        Some(layout.path("C/Windows").as_path())
    );
    assert!(explorer
        .navigator()
        .history()
        .entries()
        .iter()
        .all(|e| e.path != layout.path("C/Users/Alice/Music")));
}

#[tokio::test]
async fn test_start_path_is_opened_with_its_ancestors_loaded() {
    let layout = DriveLayout::new().unwrap();
    let mut config = Config::default();
    config.explorer.start_path = Some(layout.path("C/Users/Alice"));
    let mut explorer = layout.explorer(config);

    explorer.start().await.unwrap();

    let current = explorer.navigator().current().unwrap();
    let ancestors = explorer.tree().get_ancestors(current);
    assert_eq!(ancestors.len(), 3);
    assert!(ancestors
        .iter()
        .all(|id| explorer.tree().node(*id).unwrap().is_loaded()));
}
