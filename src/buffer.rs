//! GPU buffers.
//!
//! A [`Buffer`] is bound to one target for its whole life (`ARRAY_BUFFER` for vertex data,
//! `ELEMENT_ARRAY_BUFFER` for indices). Uploading replaces the whole store, like `bufferData`.

use glow::HasContext;
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

use crate::state::{Bind, GlState};
use crate::Gpu;

/// Errors that can occur while creating buffers.
#[derive(Debug, Clone, Error)]
pub enum BufferError {
    #[error("cannot create buffer: {0}")]
    Creation(String),
}

/// What a buffer stores.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BufferKind {
    /// Vertex attributes.
    Vertex,
    /// Element indices.
    Index,
}

impl BufferKind {
    fn target(self) -> u32 {
        match self {
            BufferKind::Vertex => glow::ARRAY_BUFFER,
            BufferKind::Index => glow::ELEMENT_ARRAY_BUFFER,
        }
    }
}

/// Usage hint given to the driver.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Usage {
    StaticDraw,
    DynamicDraw,
    StreamDraw,
}

impl Usage {
    fn to_glow(self) -> u32 {
        match self {
            Usage::StaticDraw => glow::STATIC_DRAW,
            Usage::DynamicDraw => glow::DYNAMIC_DRAW,
            Usage::StreamDraw => glow::STREAM_DRAW,
        }
    }
}

#[derive(Debug)]
pub struct Buffer {
    handle: glow::Buffer,
    kind: BufferKind,
    len: usize,
    state: Rc<RefCell<GlState>>,
}

impl Drop for Buffer {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.unbind_buffer(self.handle);

        unsafe {
            state.ctx.delete_buffer(self.handle);
        }
    }
}

impl Buffer {
    /// Create an empty buffer.
    pub fn new(gpu: &Gpu, kind: BufferKind) -> Result<Self, BufferError> {
        let handle = gpu
            .state
            .borrow_mut()
            .create_buffer()
            .map_err(BufferError::Creation)?;

        Ok(Buffer {
            handle,
            kind,
            len: 0,
            state: gpu.state.clone(),
        })
    }

    /// Create a buffer and fill it with `data`.
    pub fn from_slice<T>(
        gpu: &Gpu,
        kind: BufferKind,
        data: &[T],
        usage: Usage,
    ) -> Result<Self, BufferError>
    where
        T: bytemuck::Pod,
    {
        let mut buffer = Buffer::new(gpu, kind)?;
        buffer.upload(data, usage);
        Ok(buffer)
    }

    /// Bind the buffer to its target.
    ///
    /// Binding an index buffer attaches it to the currently bound vertex array.
    pub fn bind(&self) {
        let mut state = self.state.borrow_mut();

        match self.kind {
            BufferKind::Vertex => state.bind_array_buffer(Some(self.handle), Bind::Cached),
            BufferKind::Index => state.bind_element_array_buffer(Some(self.handle), Bind::Cached),
        }
    }

    /// Replace the buffer’s content. The buffer is bound as a side effect.
    pub fn upload<T>(&mut self, data: &[T], usage: Usage)
    where
        T: bytemuck::Pod,
    {
        self.upload_bytes(bytemuck::cast_slice(data), usage);
    }

    /// Replace the buffer’s content with raw bytes. The buffer is bound as a side effect.
    pub fn upload_bytes(&mut self, bytes: &[u8], usage: Usage) {
        self.bind();

        unsafe {
            self.state
                .borrow()
                .ctx
                .buffer_data_u8_slice(self.kind.target(), bytes, usage.to_glow());
        }

        self.len = bytes.len();
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// Size of the store, in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_kinds_map_to_gl_targets() {
        assert_eq!(BufferKind::Vertex.target(), glow::ARRAY_BUFFER);
        assert_eq!(BufferKind::Index.target(), glow::ELEMENT_ARRAY_BUFFER);
    }

    #[test]
    fn usage_hints_map_to_gl_enums() {
        assert_eq!(Usage::StaticDraw.to_glow(), glow::STATIC_DRAW);
        assert_eq!(Usage::DynamicDraw.to_glow(), glow::DYNAMIC_DRAW);
        assert_eq!(Usage::StreamDraw.to_glow(), glow::STREAM_DRAW);
    }
}
