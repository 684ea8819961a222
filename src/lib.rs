pub mod engine;
pub mod game;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{WebGlRenderingContext, HtmlCanvasElement, KeyboardEvent, Request, RequestInit, RequestMode, Response, Window};
use std::cell::RefCell;
use std::rc::Rc;
use crate::engine::renderer::Renderer;
use crate::engine::mesh::Mesh;
use crate::game::SolarSystem;
use crate::game::config::{ConfigError, SceneConfig};

const CONFIG_PATH: &str = "/assets/config.json";

thread_local! {
    static SOLAR: RefCell<Option<SolarSystem>> = RefCell::new(None);
}

#[wasm_bindgen]
pub async fn init_solar_system() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let window = web_sys::window().ok_or("No window")?;
    let document = window.document().ok_or("No document")?;
    let canvas = document.get_element_by_id("canvas")
        .ok_or("No canvas")?
        .dyn_into::<HtmlCanvasElement>()?;

    let gl = canvas
        .get_context("webgl")?
        .ok_or("No WebGL")?
        .dyn_into::<WebGlRenderingContext>()?;

    let renderer = Renderer::new(gl)?;
    let (width, height) = viewport_size(&window);
    renderer.set_size(width, height);

    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let config = load_config(&window, &opts).await?;

    let mut ship_model = None;
    if let Some(path) = &config.ship.model {
        if let Some(bytes) = fetch_bytes(&window, &opts, path).await? {
            match Mesh::from_gltf(&bytes) {
                Ok(mesh) => ship_model = Some(mesh),
                Err(err) => log::warn!("ship model {} unusable, flying the default hull: {}", path, err),
            }
        } else {
            log::warn!("ship model {} not found, flying the default hull", path);
        }
    }

    let solar = SolarSystem::new(renderer, &config, ship_model)?;
    SOLAR.with(|s| *s.borrow_mut() = Some(solar));

    // Key handlers only flip flags; the frame loop reads them.
    for (event_name, pressed) in [("keydown", true), ("keyup", false)] {
        let closure = Closure::wrap(Box::new(move |event: KeyboardEvent| {
            SOLAR.with(|s| {
                if let Some(solar) = s.borrow_mut().as_mut() {
                    if solar.set_key(&event.key(), pressed) {
                        event.prevent_default();
                    }
                }
            });
        }) as Box<dyn FnMut(_)>);

        window.add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    let resize = Closure::wrap(Box::new(move || {
        if let Some(window) = web_sys::window() {
            let (width, height) = viewport_size(&window);
            SOLAR.with(|s| {
                if let Some(solar) = s.borrow_mut().as_mut() {
                    solar.resize(width, height);
                }
            });
        }
    }) as Box<dyn FnMut()>);
    window.add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref())?;
    resize.forget();

    // Frame loop
    let f = Rc::new(RefCell::new(None));
    let g = f.clone();

    *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        SOLAR.with(|solar| {
            if let Some(solar) = solar.borrow_mut().as_mut() {
                solar.update();
                solar.render();
            }
        });
        if let Some(next) = f.borrow().as_ref() {
            request_animation_frame(next);
        }
    }) as Box<dyn FnMut()>));

    if let Some(first) = g.borrow().as_ref() {
        request_animation_frame(first);
    }

    log::info!("solar system running");
    Ok(())
}

/// Defaults when the file is absent; a file that is present must parse.
async fn load_config(window: &Window, opts: &RequestInit) -> Result<SceneConfig, JsValue> {
    let request = Request::new_with_str_and_init(CONFIG_PATH, opts)?;
    let resp_value = match JsFuture::from(window.fetch_with_request(&request)).await {
        Ok(value) => value,
        Err(_) => {
            log::info!("{} unreachable, using built-in scene tables", CONFIG_PATH);
            return Ok(SceneConfig::default());
        }
    };

    let resp: Response = resp_value.dyn_into()?;
    if !resp.ok() {
        log::info!("{} not found ({}), using built-in scene tables", CONFIG_PATH, resp.status());
        return Ok(SceneConfig::default());
    }

    let json = JsFuture::from(resp.json()?).await?;
    serde_wasm_bindgen::from_value(json)
        .map_err(|e| ConfigError::Parse(e.to_string()))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

async fn fetch_bytes(window: &Window, opts: &RequestInit, path: &str) -> Result<Option<Vec<u8>>, JsValue> {
    let request = Request::new_with_str_and_init(path, opts)?;
    let resp_value = match JsFuture::from(window.fetch_with_request(&request)).await {
        Ok(value) => value,
        Err(_) => return Ok(None),
    };

    let resp: Response = resp_value.dyn_into()?;
    if !resp.ok() {
        return Ok(None);
    }

    let buffer = JsFuture::from(resp.array_buffer()?).await?;
    Ok(Some(js_sys::Uint8Array::new(&buffer).to_vec()))
}

fn viewport_size(window: &Window) -> (u32, u32) {
    let dimension = |value: Result<JsValue, JsValue>| {
        value.ok().and_then(|v| v.as_f64()).map(|v| v.max(0.0) as u32).unwrap_or(0)
    };
    (dimension(window.inner_width()), dimension(window.inner_height()))
}

fn request_animation_frame(f: &Closure<dyn FnMut()>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Err(err) = window.request_animation_frame(f.as_ref().unchecked_ref()) {
        log::error!("requestAnimationFrame failed: {:?}", err);
    }
}
