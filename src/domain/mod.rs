pub mod camera;
pub mod entity;
pub mod geometry;
pub mod physics;
pub mod placement;
pub mod rules;
