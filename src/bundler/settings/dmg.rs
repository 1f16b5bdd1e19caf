//! Disk image layout settings.

use std::path::PathBuf;

/// Default path of the macOS "removable disk" icon used as the drive icon base.
pub const SYSTEM_DISK_ICON: &str =
    "/System/Library/Extensions/IOStorageFamily.kext/Contents/Resources/Removable.icns";

/// Longest volume title Finder aliases in the layout can reference.
pub const MAX_TITLE_LEN: usize = 27;

/// Point in Finder window coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Finder window size in points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

/// macOS DMG disk image configuration.
///
/// Configures the appearance and layout of the installer window shown when
/// the image is mounted: the app on the left, an `Applications` link on the
/// right, both drawn over a background picture.
///
/// # See Also
///
/// - [`Settings`](super::Settings) - full pipeline configuration
#[derive(Clone, Debug)]
pub struct DmgSettings {
    /// Volume title.
    ///
    /// Default: None (the application's display name)
    pub title: Option<String>,

    /// Path to background image for DMG window.
    ///
    /// Should be PNG format. Recommended size: 660x400 pixels.
    ///
    /// Default: None (a plain background is generated)
    pub background: Option<PathBuf>,

    /// DMG window size in points.
    ///
    /// Default: 660x400
    pub window_size: WindowSize,

    /// Top-left corner of the Finder window on screen.
    ///
    /// Default: (500, 400)
    pub window_position: Position,

    /// Icon size in the Finder icon view.
    ///
    /// Default: 160
    pub icon_size: u32,

    /// Position of the application icon.
    ///
    /// Default: (180, 170)
    pub app_position: Position,

    /// Position of the `Applications` link.
    ///
    /// Default: (480, 170)
    pub applications_position: Position,

    /// Base icon the app icon is composed onto.
    ///
    /// Default: the system removable-disk icon
    pub base_disk_icon: PathBuf,
}

impl Default for DmgSettings {
    fn default() -> Self {
        Self {
            title: None,
            background: None,
            window_size: WindowSize {
                width: 660,
                height: 400,
            },
            window_position: Position::new(500, 400),
            icon_size: 160,
            app_position: Position::new(180, 170),
            applications_position: Position::new(480, 170),
            base_disk_icon: PathBuf::from(SYSTEM_DISK_ICON),
        }
    }
}
