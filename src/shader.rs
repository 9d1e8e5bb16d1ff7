//! Shader support for Glow.
//!
//! A [`Program`] is built from a vertex and a fragment [`Stage`]. Sources are handed to the
//! driver verbatim. When linking fails, the info logs of both stages are written to the log
//! (the browser console on the web) and returned in the error; nothing is retried.

use glow::HasContext;
use log::{error, warn};
use luminance::shader::StageType;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;
use thiserror::Error;

use crate::state::GlState;
use crate::Gpu;

/// Errors that can occur while compiling stages or linking programs.
#[derive(Debug, Clone, Error)]
pub enum ShaderError {
    /// The driver refused to allocate a shader stage.
    #[error("cannot create {stage} stage: {reason}")]
    StageCreation { stage: &'static str, reason: String },

    /// A stage failed to compile.
    #[error("{stage} stage compilation failed:\n{log}")]
    Compilation { stage: &'static str, log: String },

    /// The driver refused to allocate a program.
    #[error("cannot create shader program: {0}")]
    ProgramCreation(String),

    /// The program failed to link.
    #[error(
        "program link failed: {log}\nvertex stage log: {vertex_log}\n\
         fragment stage log: {fragment_log}"
    )]
    Link {
        log: String,
        vertex_log: String,
        fragment_log: String,
    },
}

/// Non-fatal problem met while looking up a uniform.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UniformWarning {
    /// The uniform is not declared, or was optimized away by the compiler.
    #[error("inactive uniform: {0}")]
    Inactive(String),
}

impl UniformWarning {
    fn inactive(name: &str) -> Self {
        UniformWarning::Inactive(name.to_owned())
    }
}

#[derive(Debug)]
pub struct Stage {
    handle: glow::Shader,
    ty: StageType,
    state: Rc<RefCell<GlState>>,
}

impl Drop for Stage {
    fn drop(&mut self) {
        unsafe {
            self.state.borrow().ctx.delete_shader(self.handle);
        }
    }
}

impl Stage {
    /// Compile a stage from its GLSL source, passed to the driver as-is.
    pub fn new(gpu: &Gpu, ty: StageType, src: &str) -> Result<Self, ShaderError> {
        let stage = stage_name(ty);
        let shader_ty = glow_shader_type(ty).ok_or_else(|| ShaderError::StageCreation {
            stage,
            reason: "unsupported shader type".to_owned(),
        })?;

        unsafe {
            let state = gpu.state.borrow();

            let handle = state
                .ctx
                .create_shader(shader_ty)
                .map_err(|reason| ShaderError::StageCreation { stage, reason })?;

            state.ctx.shader_source(handle, src);
            state.ctx.compile_shader(handle);

            if state.ctx.get_shader_compile_status(handle) {
                Ok(Stage {
                    handle,
                    ty,
                    state: gpu.state.clone(),
                })
            } else {
                let log = format_shader_error(src, &state.ctx.get_shader_info_log(handle));
                state.ctx.delete_shader(handle);

                error!("{} stage compilation failed:\n{}", stage, log);
                Err(ShaderError::Compilation { stage, log })
            }
        }
    }

    pub fn ty(&self) -> StageType {
        self.ty
    }

    fn info_log(&self) -> String {
        unsafe { self.state.borrow().ctx.get_shader_info_log(self.handle) }
    }
}

/// A linked vertex + fragment program.
#[derive(Debug)]
pub struct Program {
    pub(crate) handle: glow::Program,
    state: Rc<RefCell<GlState>>,
}

impl Drop for Program {
    fn drop(&mut self) {
        unsafe {
            let mut state = self.state.borrow_mut();
            state.forget_program(self.handle);
            state.ctx.delete_program(self.handle);
        }
    }
}

impl Program {
    /// Compile both sources and link them.
    pub fn from_sources(gpu: &Gpu, vertex: &str, fragment: &str) -> Result<Self, ShaderError> {
        let vertex = Stage::new(gpu, StageType::VertexShader, vertex)?;
        let fragment = Stage::new(gpu, StageType::FragmentShader, fragment)?;

        Program::new(gpu, &vertex, &fragment)
    }

    pub fn new(gpu: &Gpu, vertex: &Stage, fragment: &Stage) -> Result<Self, ShaderError> {
        let handle = unsafe {
            let state = gpu.state.borrow();

            let handle = state
                .ctx
                .create_program()
                .map_err(ShaderError::ProgramCreation)?;

            state.ctx.attach_shader(handle, vertex.handle);
            state.ctx.attach_shader(handle, fragment.handle);

            handle
        };

        let program = Program {
            handle,
            state: gpu.state.clone(),
        };

        program.link(vertex, fragment).map(move |_| program)
    }

    fn link(&self, vertex: &Stage, fragment: &Stage) -> Result<(), ShaderError> {
        let (linked, log) = unsafe {
            let state = self.state.borrow();

            state.ctx.link_program(self.handle);

            let linked = state.ctx.get_program_link_status(self.handle);
            let log = if linked {
                String::new()
            } else {
                state.ctx.get_program_info_log(self.handle)
            };

            (linked, log)
        };

        if linked {
            return Ok(());
        }

        let vertex_log = vertex.info_log();
        let fragment_log = fragment.info_log();

        error!("program link failed: {}", log);
        error!("vertex stage log: {}", vertex_log);
        error!("fragment stage log: {}", fragment_log);

        Err(ShaderError::Link {
            log,
            vertex_log,
            fragment_log,
        })
    }

    /// Make this program the current one.
    pub fn bind(&self) {
        self.state.borrow_mut().use_program(Some(self.handle));
    }

    /// Look up a uniform by name.
    pub fn ask_uniform<T>(&self, name: &str) -> Result<Uniform<T>, UniformWarning>
    where
        T: Uniformable + ?Sized,
    {
        let location = unsafe {
            self.state
                .borrow()
                .ctx
                .get_uniform_location(self.handle, name)
        };

        location
            .map(Uniform::new)
            .ok_or_else(|| UniformWarning::inactive(name))
    }

    /// Look up a uniform by name, falling back to an unbound uniform when it is inactive.
    ///
    /// Setting an unbound uniform does nothing, the same way WebGL ignores a null location.
    pub fn uniform<T>(&self, name: &str) -> Uniform<T>
    where
        T: Uniformable + ?Sized,
    {
        self.ask_uniform(name).unwrap_or_else(|warning| {
            warn!("{}", warning);
            Uniform::unbound()
        })
    }

    /// Upload a value to a uniform of this program; the program is made current first.
    pub fn set<T>(&self, uniform: &Uniform<T>, value: &T)
    where
        T: Uniformable + ?Sized,
    {
        let mut state = self.state.borrow_mut();
        state.use_program(Some(self.handle));

        unsafe {
            value.update(&state.ctx, uniform.location.as_ref());
        }
    }
}

/// A typed uniform location.
#[derive(Debug)]
pub struct Uniform<T: ?Sized> {
    location: Option<glow::UniformLocation>,
    _t: PhantomData<*const T>,
}

impl<T: ?Sized> Uniform<T> {
    fn new(location: glow::UniformLocation) -> Self {
        Uniform {
            location: Some(location),
            _t: PhantomData,
        }
    }

    /// A uniform that is not mapped to any location.
    pub fn unbound() -> Self {
        Uniform {
            location: None,
            _t: PhantomData,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.location.is_some()
    }
}

/// Types that can be sent to a uniform location.
pub trait Uniformable {
    /// # Safety
    ///
    /// The program owning `location` must be the current program.
    unsafe fn update(&self, ctx: &glow::Context, location: Option<&glow::UniformLocation>);
}

impl Uniformable for i32 {
    unsafe fn update(&self, ctx: &glow::Context, location: Option<&glow::UniformLocation>) {
        ctx.uniform_1_i32(location, *self);
    }
}

impl Uniformable for f32 {
    unsafe fn update(&self, ctx: &glow::Context, location: Option<&glow::UniformLocation>) {
        ctx.uniform_1_f32(location, *self);
    }
}

impl Uniformable for [f32; 2] {
    unsafe fn update(&self, ctx: &glow::Context, location: Option<&glow::UniformLocation>) {
        ctx.uniform_2_f32(location, self[0], self[1]);
    }
}

impl Uniformable for [f32; 3] {
    unsafe fn update(&self, ctx: &glow::Context, location: Option<&glow::UniformLocation>) {
        ctx.uniform_3_f32(location, self[0], self[1], self[2]);
    }
}

impl Uniformable for [f32; 4] {
    unsafe fn update(&self, ctx: &glow::Context, location: Option<&glow::UniformLocation>) {
        ctx.uniform_4_f32(location, self[0], self[1], self[2], self[3]);
    }
}

// float[N]
impl Uniformable for [f32] {
    unsafe fn update(&self, ctx: &glow::Context, location: Option<&glow::UniformLocation>) {
        ctx.uniform_1_f32_slice(location, self);
    }
}

// vec4[N]
impl Uniformable for [[f32; 4]] {
    unsafe fn update(&self, ctx: &glow::Context, location: Option<&glow::UniformLocation>) {
        ctx.uniform_4_f32_slice(location, bytemuck::cast_slice(self));
    }
}

impl Uniformable for glam::Mat4 {
    unsafe fn update(&self, ctx: &glow::Context, location: Option<&glow::UniformLocation>) {
        ctx.uniform_matrix_4_f32_slice(location, false, &self.to_cols_array());
    }
}

fn glow_shader_type(ty: StageType) -> Option<u32> {
    match ty {
        StageType::VertexShader => Some(glow::VERTEX_SHADER),
        StageType::FragmentShader => Some(glow::FRAGMENT_SHADER),
        _ => None,
    }
}

fn stage_name(ty: StageType) -> &'static str {
    match ty {
        StageType::VertexShader => "vertex",
        StageType::FragmentShader => "fragment",
        StageType::GeometryShader => "geometry",
        StageType::TessellationControlShader => "tessellation control",
        StageType::TessellationEvaluationShader => "tessellation evaluation",
        #[allow(unreachable_patterns)]
        _ => "unknown",
    }
}

/// Prepend right-aligned line numbers to `source` and append the driver `log`, so that the line
/// references in the log can be matched against the GLSL.
pub fn format_shader_error(source: &str, log: &str) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let width = lines.len().to_string().len();

    let numbered = lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>width$}: {}", i + 1, line, width = width))
        .collect::<Vec<_>>()
        .join("\n");

    match (numbered.is_empty(), log.is_empty()) {
        (true, _) => log.to_owned(),
        (false, true) => numbered,
        (false, false) => format!("{}\n\n{}", numbered, log),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_shader_error_numbers_every_line() {
        let source = "#version 300 es\nvoid main()\n{\n}";
        let formatted = format_shader_error(source, "ERROR: 0:2: 'main' : syntax error");
        let lines: Vec<&str> = formatted.lines().collect();

        assert_eq!(lines[0], "1: #version 300 es");
        assert_eq!(lines[1], "2: void main()");
        assert_eq!(lines[3], "4: }");
        assert!(formatted.ends_with("ERROR: 0:2: 'main' : syntax error"));
    }

    #[test]
    fn format_shader_error_right_aligns_numbers() {
        let source = (1..=10)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        let formatted = format_shader_error(&source, "");
        let lines: Vec<&str> = formatted.lines().collect();

        assert_eq!(lines[0], " 1: line 1");
        assert_eq!(lines[9], "10: line 10");
    }

    #[test]
    fn format_shader_error_with_empty_source_is_the_log() {
        assert_eq!(format_shader_error("", "oops"), "oops");
        assert_eq!(format_shader_error("", ""), "");
    }

    #[test]
    fn only_vertex_and_fragment_stages_are_supported() {
        assert_eq!(
            glow_shader_type(StageType::VertexShader),
            Some(glow::VERTEX_SHADER)
        );
        assert_eq!(
            glow_shader_type(StageType::FragmentShader),
            Some(glow::FRAGMENT_SHADER)
        );
        assert_eq!(glow_shader_type(StageType::GeometryShader), None);
    }

    #[test]
    fn link_error_carries_both_stage_logs() {
        let err = ShaderError::Link {
            log: "link".into(),
            vertex_log: "vs: bad varying".into(),
            fragment_log: "fs: missing vColor".into(),
        };
        let msg = err.to_string();

        assert!(msg.contains("vs: bad varying"), "missing vertex log in: {msg}");
        assert!(
            msg.contains("fs: missing vColor"),
            "missing fragment log in: {msg}"
        );
    }

    #[test]
    fn unbound_uniform_has_no_location() {
        let uniform = Uniform::<f32>::unbound();
        assert!(!uniform.is_bound());
    }

    #[test]
    fn inactive_uniform_warning_names_the_uniform() {
        let warning = UniformWarning::inactive("uMVP");
        assert_eq!(warning, UniformWarning::Inactive("uMVP".to_owned()));
        assert!(warning.to_string().contains("uMVP"));
    }
}
