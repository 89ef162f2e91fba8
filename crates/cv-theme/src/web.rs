//! Browser implementations of the capabilities and the JS entry points.
//!
//! ```html
//! <script type="module">
//!   import init, { applyInitialMode, installThemeSwitcher } from './cv_theme.js';
//!   await init();
//!   applyInitialMode();
//!   document.addEventListener('DOMContentLoaded', () => installThemeSwitcher());
//! </script>
//! ```

use crate::capability::{ListenerSupport, PreferenceStore, SchemeListener, SystemScheme, ThemeHost};
use crate::controller::{KeyChord, KeyOutcome, ThemeController};
use crate::mode::{
    Mode, ACCENT_META_SELECTOR, DARK_SCHEME_QUERY, STORAGE_KEY, THEME_ATTRIBUTE,
    THEME_CHANGED_EVENT,
};
use js_sys::Reflect;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CustomEvent, CustomEventInit, Document, Element, KeyboardEvent, MediaQueryList,
    MediaQueryListEvent, Storage,
};

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

fn root() -> Option<Element> {
    document()?.document_element()
}

fn storage() -> Option<Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

fn dark_query() -> Option<MediaQueryList> {
    web_sys::window()?.match_media(DARK_SCHEME_QUERY).ok().flatten()
}

fn has_method(target: &JsValue, name: &str) -> bool {
    Reflect::has(target, &JsValue::from_str(name)).unwrap_or(false)
}

/// `window.localStorage`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

impl PreferenceStore for LocalStorage {
    fn load(&self) -> Option<String> {
        storage()?.get_item(STORAGE_KEY).ok().flatten()
    }

    fn save(&self, value: &str) -> bool {
        storage().is_some_and(|s| s.set_item(STORAGE_KEY, value).is_ok())
    }
}

/// `window.matchMedia("(prefers-color-scheme: dark)")`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MediaScheme;

impl SystemScheme for MediaScheme {
    fn prefers_dark(&self) -> Option<bool> {
        dark_query().map(|q| q.matches())
    }

    fn subscribe(&self, listener: SchemeListener) -> ListenerSupport {
        let Some(query) = dark_query() else {
            return ListenerSupport::Unavailable;
        };
        let support = if has_method(&query, "addEventListener") {
            ListenerSupport::Modern
        } else if has_method(&query, "addListener") {
            ListenerSupport::Legacy
        } else {
            return ListenerSupport::Unavailable;
        };

        let callback =
            Closure::<dyn Fn(MediaQueryListEvent)>::new(move |event: MediaQueryListEvent| {
                listener(event.matches())
            });
        let function: &js_sys::Function = callback.as_ref().unchecked_ref();
        let registered = match support {
            ListenerSupport::Modern => query
                .add_event_listener_with_callback("change", function)
                .is_ok(),
            _ => query.add_listener_with_opt_callback(Some(function)).is_ok(),
        };
        if !registered {
            return ListenerSupport::Unavailable;
        }
        // Lives as long as the page.
        callback.forget();
        support
    }
}

/// The current document.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentHost;

impl DocumentHost {
    fn accent_element() -> Option<Element> {
        document()?.query_selector(ACCENT_META_SELECTOR).ok().flatten()
    }
}

impl ThemeHost for DocumentHost {
    fn mode_attribute(&self) -> Option<String> {
        root()?.get_attribute(THEME_ATTRIBUTE)
    }

    fn set_mode_attribute(&self, value: &str) {
        if let Some(root) = root() {
            let _ = root.set_attribute(THEME_ATTRIBUTE, value);
        }
    }

    fn set_accent_hint(&self, color: &str) -> bool {
        Self::accent_element().is_some_and(|meta| meta.set_attribute("content", color).is_ok())
    }

    fn notify_changed(&self, mode: Mode) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let detail = js_sys::Object::new();
        let _ = Reflect::set(
            &detail,
            &JsValue::from_str("theme"),
            &JsValue::from_str(mode.as_str()),
        );
        let init = CustomEventInit::new();
        init.set_detail(&detail);
        match CustomEvent::new_with_event_init_dict(THEME_CHANGED_EVENT, &init) {
            Ok(event) => {
                let _ = window.dispatch_event(&event);
            }
            Err(e) => debug!("Could not create {THEME_CHANGED_EVENT} event: {e:?}"),
        }
    }
}

/// Controller wired to the live page.
pub type WebThemeController = ThemeController<LocalStorage, MediaScheme, DocumentHost>;

thread_local! {
    static CONTROLLER: RefCell<Option<Rc<WebThemeController>>> = const { RefCell::new(None) };
    static INSTALLED: Cell<bool> = const { Cell::new(false) };
}

fn controller() -> Rc<WebThemeController> {
    CONTROLLER.with(|slot| {
        slot.borrow_mut()
            .get_or_insert_with(|| {
                Rc::new(ThemeController::new(LocalStorage, MediaScheme, DocumentHost))
            })
            .clone()
    })
}

fn bind_keyboard(controller: &Rc<WebThemeController>) {
    let Some(document) = document() else {
        return;
    };
    let weak = Rc::downgrade(controller);
    let callback = Closure::<dyn Fn(KeyboardEvent)>::new(move |event: KeyboardEvent| {
        let Some(controller) = weak.upgrade() else {
            return;
        };
        let key = event.key();
        let chord = KeyChord {
            key: &key,
            ctrl: event.ctrl_key(),
            meta: event.meta_key(),
            shift: event.shift_key(),
        };
        if let KeyOutcome::Toggled(_) = controller.handle_key(&chord) {
            event.prevent_default();
        }
    });
    if document
        .add_event_listener_with_callback("keydown", callback.as_ref().unchecked_ref())
        .is_ok()
    {
        callback.forget();
    }
}

/// Pre-paint step: set the root attribute from storage or the platform.
#[wasm_bindgen(js_name = applyInitialMode)]
pub fn apply_initial_mode() -> String {
    controller().apply_initial().to_string()
}

/// Full setup once the document is ready. Repeated calls only re-apply.
#[wasm_bindgen(js_name = installThemeSwitcher)]
pub fn install_theme_switcher() -> String {
    let controller = controller();
    if INSTALLED.with(|flag| flag.replace(true)) {
        controller.apply_mode(controller.resolve_initial_mode());
    } else {
        controller.init();
        bind_keyboard(&controller);
    }
    controller.current_mode().to_string()
}

#[wasm_bindgen(js_name = toggleTheme)]
pub fn toggle_theme() -> String {
    controller().toggle().to_string()
}

#[wasm_bindgen(js_name = currentTheme)]
pub fn current_theme() -> String {
    controller().current_mode().to_string()
}
