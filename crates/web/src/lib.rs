//! Browser client for Taskboard
//!
//! Rendering lives in `components`; everything it shows comes from the
//! explicit state in `state`, changed only through `state::update`.

pub mod api;
pub mod app;
pub mod components;
pub mod state;
pub mod types;

/// Client-side rendering entry point
pub fn mount() {
    use crate::app::App;
    console_error_panic_hook::set_once();
    leptos::mount_to_body(App);
}
