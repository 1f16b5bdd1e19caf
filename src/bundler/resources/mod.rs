//! Generated artwork: the drive icon and the default window background.

pub mod background;
pub mod icons;
