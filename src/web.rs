//! Browser runner.
//!
//! Exposes the lessons to JavaScript: `runLesson` binds a lesson to a canvas, fetches its
//! images, then drives it according to its [`Schedule`]. The returned [`LessonHandle`] forwards
//! control changes and stops the lesson.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt::Display;
use std::rc::Rc;

use log::{error, info};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    HtmlCanvasElement, Performance, Request, RequestInit, RequestMode, Response,
    WebGl2RenderingContext, Window,
};

use crate::lessons::{render, Assets, Lesson, WallClock};
use crate::{
    Context, FrameTime, Gpu, LessonError, LessonId, LessonSettings, Schedule, StateQueryError,
};

thread_local! {
    // one cached graphics state per canvas, shared by every lesson run on it
    static CANVAS_GPUS: RefCell<HashMap<String, (HtmlCanvasElement, Gpu)>> =
        RefCell::new(HashMap::new());
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    console_log::init_with_level(log::Level::Info)
        .map_err(|e| JsValue::from_str(&format!("cannot initialize the logger: {}", e)))?;

    Ok(())
}

/// Names accepted by `runLesson`.
#[wasm_bindgen(js_name = lessonNames)]
pub fn lesson_names() -> js_sys::Array {
    LessonId::ALL
        .iter()
        .map(|id| JsValue::from_str(id.name()))
        .collect()
}

fn to_js(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

fn wall_clock() -> WallClock {
    let date = js_sys::Date::new_0();

    WallClock {
        hours: date.get_hours(),
        minutes: date.get_minutes(),
        seconds: date.get_seconds(),
    }
}

async fn fetch_bytes(window: &Window, url: &str) -> Result<Vec<u8>, JsValue> {
    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init(url, &opts)?;
    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await?
        .dyn_into()?;

    if !response.ok() {
        return Err(JsValue::from_str(&format!(
            "cannot fetch {}: HTTP {}",
            url,
            response.status()
        )));
    }

    let buffer = JsFuture::from(response.array_buffer()?).await?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

/// The graphics handle of the canvas with id `canvas_id`, created on first use.
fn canvas_gpu(canvas_id: &str, canvas: &HtmlCanvasElement) -> Result<Gpu, JsValue> {
    let known = CANVAS_GPUS.with(|gpus| {
        gpus.borrow()
            .get(canvas_id)
            .filter(|(known, _)| known == canvas)
            .map(|(_, gpu)| gpu.clone())
    });

    if let Some(gpu) = known {
        return Ok(gpu);
    }

    let context: WebGl2RenderingContext = canvas
        .get_context("webgl2")?
        .ok_or_else(|| to_js(StateQueryError::UnavailableGlState))?
        .dyn_into()?;
    let gpu = Gpu::from_context(Context::from_webgl2_context(context)).map_err(to_js)?;

    CANVAS_GPUS.with(|gpus| {
        gpus.borrow_mut()
            .insert(canvas_id.to_owned(), (canvas.clone(), gpu.clone()));
    });

    Ok(gpu)
}

/// A lesson bound to its canvas.
struct Runner {
    lesson: Box<dyn Lesson>,
    gpu: Gpu,
    performance: Performance,
    started_at: f64,
}

impl Runner {
    fn time(&self) -> FrameTime {
        FrameTime {
            since_start_ms: self.performance.now() - self.started_at,
            now_ms: js_sys::Date::now(),
            clock: wall_clock(),
        }
    }

    fn frame(&mut self) {
        let time = self.time();

        if let Err(e) = render(self.lesson.as_mut(), &self.gpu, &time) {
            error!("{}: {}", self.lesson.id(), e);
        }
    }

    fn apply_settings(&mut self, settings: &LessonSettings) -> Result<(), LessonError> {
        self.lesson.apply_settings(&self.gpu, settings)
    }
}

enum Timer {
    Idle,
    Interval {
        handle: i32,
        _callback: Closure<dyn FnMut()>,
    },
    AnimationFrame {
        callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>,
        request: Rc<Cell<Option<i32>>>,
    },
}

fn request_animation_frame(callback: &Closure<dyn FnMut(f64)>) -> Result<i32, JsValue> {
    window()?.request_animation_frame(callback.as_ref().unchecked_ref())
}

/// A running lesson.
#[wasm_bindgen]
pub struct LessonHandle {
    runner: Rc<RefCell<Runner>>,
    settings: LessonSettings,
    schedule: Schedule,
    timer: Timer,
}

#[wasm_bindgen]
impl LessonHandle {
    /// Name of the lesson.
    #[wasm_bindgen(getter)]
    pub fn lesson(&self) -> String {
        self.runner.borrow().lesson.id().name().to_owned()
    }

    /// Apply new controls, given as the same JSON object `runLesson` accepts.
    ///
    /// The seed and the asset base URL only matter at startup and are kept.
    #[wasm_bindgen(js_name = updateSettings)]
    pub fn update_settings(&mut self, settings_json: &str) -> Result<(), JsValue> {
        let mut settings = LessonSettings::from_json(settings_json).map_err(to_js)?;
        settings.seed = self.settings.seed;
        settings.asset_base_url = self.settings.asset_base_url.clone();

        self.runner
            .borrow_mut()
            .apply_settings(&settings)
            .map_err(to_js)?;
        self.settings = settings;

        if self.schedule == Schedule::Once {
            self.runner.borrow_mut().frame();
        }

        Ok(())
    }

    /// Follow a new canvas size, in pixels.
    pub fn resize(&mut self, width: u32, height: u32) {
        let mut runner = self.runner.borrow_mut();
        runner.gpu.set_viewport(0, 0, width as i32, height as i32);

        if self.schedule == Schedule::Once {
            runner.frame();
        }
    }

    /// Stop drawing. The last frame stays on the canvas.
    pub fn stop(&mut self) {
        match std::mem::replace(&mut self.timer, Timer::Idle) {
            Timer::Idle => (),

            Timer::Interval { handle, .. } => {
                if let Ok(window) = window() {
                    window.clear_interval_with_handle(handle);
                }
            }

            Timer::AnimationFrame { callback, request } => {
                if let (Some(id), Ok(window)) = (request.take(), window()) {
                    let _ = window.cancel_animation_frame(id);
                }

                // break the callback’s reference to itself
                callback.borrow_mut().take();
            }
        }

        info!("{} stopped", self.lesson());
    }
}

impl Drop for LessonHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl LessonHandle {
    fn start_timer(&mut self) -> Result<(), JsValue> {
        self.runner.borrow_mut().frame();

        self.timer = match self.schedule {
            Schedule::Once => Timer::Idle,

            Schedule::Interval(ms) => {
                let runner = self.runner.clone();
                let callback = Closure::wrap(
                    Box::new(move || runner.borrow_mut().frame()) as Box<dyn FnMut()>
                );
                let handle = window()?.set_interval_with_callback_and_timeout_and_arguments_0(
                    callback.as_ref().unchecked_ref(),
                    ms as i32,
                )?;

                Timer::Interval {
                    handle,
                    _callback: callback,
                }
            }

            Schedule::AnimationFrame => {
                let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut(f64)>>));
                let request = Rc::new(Cell::new(None));

                let this = callback.clone();
                let next = request.clone();
                let runner = self.runner.clone();

                *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |_: f64| {
                    runner.borrow_mut().frame();

                    if let Some(callback) = this.borrow().as_ref() {
                        match request_animation_frame(callback) {
                            Ok(id) => next.set(Some(id)),
                            Err(e) => error!("cannot request an animation frame: {:?}", e),
                        }
                    }
                }) as Box<dyn FnMut(f64)>));

                if let Some(first) = callback.borrow().as_ref() {
                    request.set(Some(request_animation_frame(first)?));
                }

                Timer::AnimationFrame { callback, request }
            }
        };

        Ok(())
    }
}

/// Run the lesson named `lesson` on the canvas with id `canvas_id`.
///
/// `settings_json` holds the lesson controls; missing fields take their default value. Randomized
/// lessons are seeded from the current time unless a `seed` is given.
#[wasm_bindgen(js_name = runLesson)]
pub async fn run_lesson(
    canvas_id: String,
    lesson: String,
    settings_json: Option<String>,
) -> Result<LessonHandle, JsValue> {
    let id: LessonId = lesson.parse().map_err(to_js)?;

    let mut settings =
        LessonSettings::from_json(settings_json.as_deref().unwrap_or_default()).map_err(to_js)?;
    settings.seed = settings.seed.or(Some(js_sys::Date::now() as u64));

    let window = window()?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas: HtmlCanvasElement = document
        .get_element_by_id(&canvas_id)
        .ok_or_else(|| JsValue::from_str(&format!("canvas {} not found", canvas_id)))?
        .dyn_into()?;

    let gpu = canvas_gpu(&canvas_id, &canvas)?;
    gpu.set_viewport(0, 0, canvas.width() as i32, canvas.height() as i32);

    let mut assets = Assets::new();
    for &asset in id.assets() {
        let url = asset.url(&settings.asset_base_url);
        info!("fetching {}", url);

        let bytes = fetch_bytes(&window, &url).await?;
        assets.insert(asset, asset.decode(&bytes).map_err(to_js)?);
    }

    let lesson = id.create(&gpu, &settings, &assets).map_err(to_js)?;
    info!("{} started on #{}", id, canvas_id);

    let performance = window
        .performance()
        .ok_or_else(|| JsValue::from_str("no performance timer"))?;
    let started_at = performance.now();

    let mut handle = LessonHandle {
        runner: Rc::new(RefCell::new(Runner {
            lesson,
            gpu,
            performance,
            started_at,
        })),
        settings,
        schedule: id.schedule(),
        timer: Timer::Idle,
    };
    handle.start_timer()?;

    Ok(handle)
}
