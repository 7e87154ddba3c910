use crate::common::fixtures::{node, DriveLayout};
use fresh_explorer::app::LaunchOutcome;
use fresh_explorer::services::file_ops::FileOpOutcome;

#[tokio::test]
async fn test_cut_and_paste_between_drives() {
    let layout = DriveLayout::new().unwrap();
    let mut explorer = layout.started().await.unwrap();
    let photos = node(&mut explorer, &layout.path("E/Photos")).await;

    explorer.cut(&[layout.path("C/Users/Alice/notes.txt")]);
    explorer.navigator_mut().navigate(photos).await.unwrap();
    let outcome = explorer.paste().await.unwrap();

    assert_eq!(outcome, FileOpOutcome::Completed);
    assert!(layout.path("E/Photos/notes.txt").is_file());
    assert!(!layout.path("C/Users/Alice/notes.txt").exists());
    assert!(explorer.clipboard().is_empty());
    let listing = explorer.navigator_mut().list_current().await.unwrap();
    assert!(listing.find("notes.txt").is_some());
}

#[tokio::test]
async fn test_copy_and_paste_into_the_same_directory_keeps_the_original() {
    let layout = DriveLayout::new().unwrap();
    std::fs::write(layout.path("C/Users/Alice/notes.txt"), "precious data").unwrap();
    let mut explorer = layout.started().await.unwrap();
    let alice = node(&mut explorer, &layout.path("C/Users/Alice")).await;

    explorer.copy(&[layout.path("C/Users/Alice/notes.txt")]);
    explorer.navigator_mut().navigate(alice).await.unwrap();
    let outcome = explorer.paste().await.unwrap();

    assert_eq!(outcome, FileOpOutcome::Completed);
    assert_eq!(
        std::fs::read_to_string(layout.path("C/Users/Alice/notes.txt")).unwrap(),
        "precious data"
    );
    assert_eq!(
        std::fs::read_to_string(layout.path("C/Users/Alice/notes - Copy.txt")).unwrap(),
        "precious data"
    );
    let listing = explorer.navigator_mut().list_current().await.unwrap();
    assert!(listing.find("notes - Copy.txt").is_some());
}

#[tokio::test]
async fn test_opening_a_file_goes_to_the_opener() {
    let layout = DriveLayout::new().unwrap();
    let mut explorer = layout.started().await.unwrap();
    let alice = node(&mut explorer, &layout.path("C/Users/Alice")).await;
    explorer.navigator_mut().navigate(alice).await.unwrap();
    let listing = explorer.navigator_mut().list_current().await.unwrap();
    let track = listing.find("track10.mp3").unwrap().node;

    let outcome = explorer.launch(track).await.unwrap();

    let path = layout.path("C/Users/Alice/track10.mp3");
    assert_eq!(outcome, LaunchOutcome::Opened(path.clone()));
    assert_eq!(layout.opener.opened(), vec![path]);
}
