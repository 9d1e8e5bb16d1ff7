//! WebGL 2.0 lessons on top of Glow
//!
//! A set of small, independent rendering programs, each one demonstrating a single WebGL 2
//! primitive: uniforms, vertex attributes (scalar, buffered, interleaved and normalized integer
//! encodings), element arrays, textures and mipmaps. Every lesson owns one canvas, one shader
//! program and a handful of draw calls.
//!
//! The lessons run on any [glow] context: WebGL 2 in the browser (see the `web` module when
//! building for `wasm32`), or a native OpenGL ES 3.0 compatible context created from a loader
//! function.
//!
//! [glow]: https://github.com/grovesNL/glow

use std::cell::RefCell;
use std::rc::Rc;

pub mod buffer;
pub mod draw;
pub mod error;
pub mod geometry;
pub mod lessons;
pub mod math;
pub mod pixel;
pub mod prng;
pub mod settings;
pub mod shader;
mod state;
pub mod texture;
pub mod vertex;

#[cfg(wasm)]
pub mod web;

use glow::Context as GlowContext;

pub use error::LessonError;
pub use lessons::{FrameTime, Lesson, LessonId, Schedule};
pub use settings::LessonSettings;
pub use state::{BlendingState, StateQueryError};

/// The graphics context which must be provided to create a [`Gpu`]
pub struct Context {
    glow_context: GlowContext,
}

impl Context {
    /// Create a native context from a GL loader function
    ///
    /// # Safety
    ///
    /// The loader must return valid function pointers for the GL context current on this thread.
    #[cfg(not(wasm))]
    pub unsafe fn from_loader_function<F>(loader_function: F) -> Self
    where
        F: FnMut(&str) -> *const std::os::raw::c_void,
    {
        Self {
            glow_context: GlowContext::from_loader_function(loader_function),
        }
    }

    /// Create a WebGL 2 context
    #[cfg(wasm)]
    pub fn from_webgl2_context(context: web_sys::WebGl2RenderingContext) -> Self {
        Self {
            glow_context: GlowContext::from_webgl2_context(context),
        }
    }
}

/// A lesson’s handle on the graphics context.
///
/// Every GPU object created by a lesson keeps a shared reference to the same cached state, so a
/// `Gpu` is cheap to clone and must stay on the thread that created it.
#[derive(Clone, Debug)]
pub struct Gpu {
    pub(crate) state: Rc<RefCell<state::GlState>>,
}

impl Gpu {
    /// Create a GPU handle from a [`Context`].
    pub fn from_context(ctx: Context) -> Result<Self, StateQueryError> {
        let Context { glow_context } = ctx;

        state::GlState::new(glow_context).map(|state| Gpu {
            state: Rc::new(RefCell::new(state)),
        })
    }

    /// Set the viewport rectangle, in pixels.
    pub fn set_viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.state
            .borrow_mut()
            .set_viewport([x, y, width, height]);
    }

    /// Width and height of the current viewport, in pixels.
    pub fn viewport_size(&self) -> (i32, i32) {
        let [_, _, w, h] = self.state.borrow().viewport();
        (w, h)
    }

    /// Clear the color buffer with the given color.
    pub fn clear(&self, color: [f32; 4]) {
        let mut state = self.state.borrow_mut();
        state.set_clear_color(color);

        unsafe {
            use glow::HasContext;
            state.ctx.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    /// Enable or disable blending.
    pub fn set_blending(&self, blending: BlendingState) {
        self.state.borrow_mut().set_blending_state(blending);
    }

    /// Set the source and destination blending factors.
    pub fn set_blending_func(
        &self,
        src: luminance::blending::Factor,
        dst: luminance::blending::Factor,
    ) {
        self.state.borrow_mut().set_blending_func(src, dst);
    }
}
