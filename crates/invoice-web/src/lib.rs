//! Invoice Assistant Web Frontend
//!
//! Leptos CSR app covering dashboard, invoices, clients, billing and settings.
//! Trial gating comes from `invoice-core`, backed by `localStorage`.

mod api;
mod app;
mod components;
mod logging;
mod pages;
mod state;

pub use app::App;

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    logging::init(tracing::Level::INFO);
    leptos::mount::mount_to_body(App);
}
