// ============================================================================
// rocketviz
// Interactive 3D viewer for a vehicle-soccer physics simulation.
// Reads entity state from a `sim::Simulation` each tick, renders it with
// wgpu, and writes keyboard/gamepad controls back into the simulation.
// ============================================================================

pub mod app;
pub mod camera;
pub mod config;
pub mod controls;
pub mod gamepad;
pub mod input;
pub mod renderer;
pub mod scene;
pub mod sim;
pub mod viewer;
