use crate::common::fixtures::{node, DriveLayout};
use fresh_explorer::services::drives::{DriveEvent, DriveInfo};
use std::fs;

#[tokio::test]
async fn test_removing_the_current_drive_falls_back() {
    let layout = DriveLayout::new().unwrap();
    let mut explorer = layout.started().await.unwrap();
    let photos = node(&mut explorer, &layout.path("E/Photos")).await;
    explorer.navigator_mut().navigate(photos).await.unwrap();

    layout.drives.remove(&layout.path("E"));
    explorer
        .handle_drive_event(&DriveEvent::Removed(layout.path("E")))
        .await
        .unwrap();

    assert_eq!(
        explorer.navigator().current_path(),
        Some(layout.path("C").as_path())
    );
    assert_eq!(explorer.tree().roots().len(), 1);
    assert!(explorer
        .navigator()
        .history()
        .entries()
        .iter()
        .all(|e| !e.path.starts_with(layout.path("E"))));
    assert!(explorer.events().has_match("explorer:tree_changed"));
}

#[tokio::test]
async fn test_removing_another_drive_keeps_the_current_directory() {
    let layout = DriveLayout::new().unwrap();
    let mut explorer = layout.started().await.unwrap();
    let users = node(&mut explorer, &layout.path("C/Users")).await;
    explorer.navigator_mut().navigate(users).await.unwrap();

    layout.drives.remove(&layout.path("E"));
    explorer
        .handle_drive_event(&DriveEvent::Removed(layout.path("E")))
        .await
        .unwrap();

    assert_eq!(explorer.navigator().current(), Some(users));
}

#[tokio::test]
async fn test_new_drive_becomes_current() {
    let layout = DriveLayout::new().unwrap();
    let mut explorer = layout.started().await.unwrap();
    fs::create_dir_all(layout.path("F/Backup")).unwrap();

    layout.drives.insert(DriveInfo::new(layout.path("F")).with_label("Backup"));
    explorer
        .handle_drive_event(&DriveEvent::Arrived(layout.path("F")))
        .await
        .unwrap();

    let current = explorer.navigator().current().unwrap();
    assert!(explorer.tree().is_drive_root(current));
    assert_eq!(
        explorer.navigator().current_path(),
        Some(layout.path("F").as_path())
    );
    assert!(explorer.navigator().state().can_go_back);
}
