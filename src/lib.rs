//! Interactive terminal treemap of disk usage.
//!
//! A walker streams file records into a [`presenter::Presenter`], which grows
//! a [`tree::FileTree`], lays it out as a [`treemap::Treemap`] on every tick
//! and publishes [`state::State`] snapshots to the terminal front end in
//! [`app`].

pub mod app;
pub mod args;
pub mod cancel;
pub mod config;
pub mod error;
pub mod geometry;
pub mod humanize;
pub mod navigation;
pub mod paths;
pub mod presenter;
pub mod recovery;
pub mod render;
pub mod spinner;
pub mod state;
pub mod tiling;
pub mod tree;
pub mod treemap;
pub mod walker;
