pub mod drive_hotplug;
pub mod file_operations;
pub mod icons;
pub mod navigation;
