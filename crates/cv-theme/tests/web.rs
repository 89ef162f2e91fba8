//! Browser tests: `wasm-pack test --headless --chrome -- --features web`.

#![cfg(all(target_arch = "wasm32", feature = "web"))]

use cv_theme::web::{
    current_theme, install_theme_switcher, toggle_theme, DocumentHost, LocalStorage,
};
use cv_theme::{PreferenceStore, ThemeHost, STORAGE_KEY, THEME_ATTRIBUTE};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn clear_storage() {
    if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
        let _ = storage.remove_item(STORAGE_KEY);
    }
}

#[wasm_bindgen_test]
fn local_storage_round_trip() {
    clear_storage();
    let store = LocalStorage;
    assert_eq!(store.load(), None);
    assert!(store.save("dark"));
    assert_eq!(store.load().as_deref(), Some("dark"));
    clear_storage();
}

#[wasm_bindgen_test]
fn document_host_sets_root_attribute() {
    let host = DocumentHost;
    host.set_mode_attribute("dark");
    let root = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.document_element())
        .unwrap();
    assert_eq!(root.get_attribute(THEME_ATTRIBUTE).as_deref(), Some("dark"));
    assert_eq!(host.mode_attribute().as_deref(), Some("dark"));
}

#[wasm_bindgen_test]
fn toggle_persists_and_flips() {
    clear_storage();
    install_theme_switcher();
    let before = current_theme();
    let after = toggle_theme();
    assert_ne!(before, after);
    assert_eq!(LocalStorage.load().as_deref(), Some(after.as_str()));
    assert_eq!(toggle_theme(), before);
    clear_storage();
}
