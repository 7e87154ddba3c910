use crate::common::fixtures::DriveLayout;
use fresh_explorer::config::Config;
use fresh_explorer::view::file_tree::NodeKind;
use std::sync::Arc;

#[tokio::test]
async fn test_same_icon_index_is_one_bitmap() {
    let layout = DriveLayout::new().unwrap();
    let explorer = layout.started().await.unwrap();
    let icons = explorer.icons();

    let a = icons.icon_for(NodeKind::File, &layout.path("C/Users/Alice/track2.mp3"));
    let b = icons.icon_for(NodeKind::File, &layout.path("C/Users/Alice/track10.mp3"));
    let notes = icons.icon_for(NodeKind::File, &layout.path("C/Users/Alice/notes.txt"));

    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &notes));
    assert_eq!(icons.extension_len(), 0);
}

#[tokio::test]
async fn test_extension_cache_is_opt_in() {
    let layout = DriveLayout::new().unwrap();
    let mut config = Config::default();
    config.icons.cache_by_extension = true;
    let explorer = layout.explorer(config);
    let icons = explorer.icons();

    let a = icons.icon_for(NodeKind::File, &layout.path("C/Users/Alice/track2.mp3"));
    let b = icons.icon_for(NodeKind::File, &layout.path("C/Users/Alice/track10.mp3"));

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(icons.extension_len(), 1);
}

#[tokio::test]
async fn test_tree_nodes_keep_their_icon() {
    let layout = DriveLayout::new().unwrap();
    let mut explorer = layout.started().await.unwrap();
    let c = explorer.navigator().current().unwrap();

    let first = explorer.icon(c).unwrap();
    let second = explorer.icon(c).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
}
