// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `gl-program`.
//
// `gl-program` is free software: you can redistribute it and/or modify it under the terms of
// either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
// version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `gl-program` is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Lesser General Public License or the Mozilla Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `gl-program`. If not, see <https://www.gnu.org/licenses/> or
// <https://www.mozilla.org/en-US/MPL/2.0/>.

//! A [`glow`] backend for `gl-program`.
//!
//! [`GlowContext`] wraps anything implementing [`HasContext`] and implements
//! [`ShaderContext`] on top of it, so a [`ShaderProgram`] can be built against a real OpenGL
//! context. [`Mesh`] uploads the vertex data the triangle demo draws.
//!
//! [`glow`]: https://crates.io/crates/glow
//! [`HasContext`]: glow::HasContext
//! [`ShaderProgram`]: gl_program::ShaderProgram

use glow::HasContext;

use gl_program::{ShaderContext, Stage, UniformKind, UniformValue};

use std::cell::Cell;
use std::fmt;

mod mesh;

pub use mesh::{Attribute, ColorVertex, Mesh, PositionVertex};

pub use gl_program;
pub use glow;

/// A wrapper around a [`glow`] context.
pub struct GlowContext<H: HasContext + ?Sized> {
    /// The program last made current through this wrapper.
    current: Cell<Option<H::Program>>,

    /// `#version` line matching the context.
    version_header: &'static str,

    /// The underlying context.
    context: H,
}

impl<H: HasContext + ?Sized> fmt::Debug for GlowContext<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlowContext")
            .field("current", &self.current.get())
            .field("version_header", &self.version_header)
            .finish_non_exhaustive()
    }
}

impl<H: HasContext> GlowContext<H> {
    /// Create a new [`GlowContext`] from a [`glow`] context.
    ///
    /// # Safety
    ///
    /// The context must be current while calling new, and must stay current on this thread for
    /// as long as this type or anything built on it is used.
    pub unsafe fn new(context: H) -> Result<Self, GlError> {
        let version = context.version();
        let version_header = version_header(version.is_embedded, version.major, version.minor)
            .ok_or_else(|| {
                GlError(format!(
                    "OpenGL version 3.3 (or 3.0 ES) or higher is required, found {}.{}{}",
                    version.major,
                    version.minor,
                    if version.is_embedded { " ES" } else { "" }
                ))
            })?;

        tracing::debug!(
            "OpenGL {}.{}{}, shaders without a version get `{version_header}`",
            version.major,
            version.minor,
            if version.is_embedded { " ES" } else { "" }
        );

        Ok(Self {
            current: Cell::new(None),
            version_header,
            context,
        })
    }
}

impl<H: HasContext + ?Sized> GlowContext<H> {
    /// Get a reference to the underlying [`glow`] context.
    pub fn context(&self) -> &H {
        &self.context
    }

    /// The `#version` directive that suits this context.
    ///
    /// Pass it to [`ProgramBuilder::version_header`] to build shaders written without one.
    ///
    /// [`ProgramBuilder::version_header`]: gl_program::ProgramBuilder::version_header
    pub fn version_header(&self) -> &'static str {
        self.version_header
    }

    /// Set the viewport to cover a framebuffer of the given size.
    pub fn resize(&self, width: u32, height: u32) {
        unsafe {
            self.context.viewport(0, 0, width as i32, height as i32);
        }
    }

    /// Clear the color buffer.
    pub fn clear(&self, [r, g, b, a]: [f32; 4]) {
        unsafe {
            self.context.clear_color(r, g, b, a);
            self.context.clear(glow::COLOR_BUFFER_BIT);
        }
    }
}

impl<H: HasContext + ?Sized> ShaderContext for GlowContext<H> {
    type Shader = H::Shader;
    type Program = H::Program;
    type UniformLocation = H::UniformLocation;
    type Error = GlError;

    fn create_shader(&self, stage: Stage) -> Result<Self::Shader, Self::Error> {
        unsafe { self.context.create_shader(shader_type(stage)).map_err(GlError) }
    }

    fn compile_shader(&self, shader: Self::Shader, source: &str) {
        unsafe {
            self.context.shader_source(shader, source);
            self.context.compile_shader(shader);
        }

        gl_error(&self.context, "compiling a shader");
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { self.context.get_shader_compile_status(shader) }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.context.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe {
            self.context.delete_shader(shader);
        }
    }

    fn create_program(&self) -> Result<Self::Program, Self::Error> {
        unsafe { self.context.create_program().map_err(GlError) }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe {
            self.context.attach_shader(program, shader);
        }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe {
            self.context.detach_shader(program, shader);
        }
    }

    fn link_program(&self, program: Self::Program) {
        unsafe {
            self.context.link_program(program);
        }

        gl_error(&self.context, "linking a program");
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        unsafe { self.context.get_program_link_status(program) }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.context.get_program_info_log(program) }
    }

    fn delete_program(&self, program: Self::Program) {
        // A deleted program stays bound until something else is used, so unbind it here to
        // keep `current` in step with the driver.
        if self.current.get() == Some(program) {
            self.use_program(None);
        }

        unsafe {
            self.context.delete_program(program);
        }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe {
            self.context.use_program(program);
        }

        self.current.set(program);
        gl_error(&self.context, "binding a program");
    }

    fn current_program(&self) -> Option<Self::Program> {
        self.current.get()
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.context.get_uniform_location(program, name) }
    }

    fn set_uniform(&self, location: &Self::UniformLocation, value: UniformValue) {
        let location = Some(location);

        unsafe {
            match value {
                UniformValue::Bool(value) => self.context.uniform_1_i32(location, value as i32),
                UniformValue::Int(value) => self.context.uniform_1_i32(location, value),
                UniformValue::Float(value) => self.context.uniform_1_f32(location, value),
                UniformValue::Vec4([x, y, z, w]) => {
                    self.context.uniform_4_f32(location, x, y, z, w)
                }
            }
        }

        gl_error(&self.context, "setting a uniform");
    }

    fn uniform_value(
        &self,
        program: Self::Program,
        location: &Self::UniformLocation,
        kind: UniformKind,
    ) -> UniformValue {
        // The driver writes as many components as the uniform has, up to a mat4.
        let value = match kind {
            UniformKind::Bool | UniformKind::Int => {
                let mut value = [0; MAX_UNIFORM_COMPONENTS];
                unsafe {
                    self.context.get_uniform_i32(program, location, &mut value);
                }
                uniform_from_ints(kind, &value)
            }
            UniformKind::Float | UniformKind::Vec4 => {
                let mut value = [0.0; MAX_UNIFORM_COMPONENTS];
                unsafe {
                    self.context.get_uniform_f32(program, location, &mut value);
                }
                uniform_from_floats(kind, &value)
            }
        };

        gl_error(&self.context, "reading a uniform");
        value
    }
}

/// Scalar components in the largest uniform a program can declare.
const MAX_UNIFORM_COMPONENTS: usize = 16;

fn uniform_from_ints(kind: UniformKind, value: &[i32]) -> UniformValue {
    match kind {
        UniformKind::Bool => UniformValue::Bool(value[0] != 0),
        _ => UniformValue::Int(value[0]),
    }
}

fn uniform_from_floats(kind: UniformKind, value: &[f32]) -> UniformValue {
    match kind {
        UniformKind::Vec4 => {
            let mut vec = [0.0; 4];
            vec.copy_from_slice(&value[..kind.components()]);
            UniformValue::Vec4(vec)
        }
        _ => UniformValue::Float(value[0]),
    }
}

/// An error from the OpenGL driver.
#[derive(Debug)]
pub struct GlError(String);

impl fmt::Display for GlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gl error: {}", self.0)
    }
}

impl std::error::Error for GlError {}

/// The `#version` directive for a context version, or `None` if it is too old.
fn version_header(is_embedded: bool, major: u32, minor: u32) -> Option<&'static str> {
    let supported = if is_embedded {
        major >= 3
    } else {
        major >= 4 || (major >= 3 && minor >= 3)
    };

    match (supported, is_embedded) {
        (false, _) => None,
        (true, true) => Some("#version 300 es"),
        (true, false) => Some("#version 330 core"),
    }
}

fn shader_type(stage: Stage) -> u32 {
    match stage {
        Stage::Vertex => glow::VERTEX_SHADER,
        Stage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn gl_error_name(err: u32) -> &'static str {
    match err {
        glow::INVALID_ENUM => "GL_INVALID_ENUM",
        glow::INVALID_VALUE => "GL_INVALID_VALUE",
        glow::INVALID_OPERATION => "GL_INVALID_OPERATION",
        glow::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        glow::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        glow::CONTEXT_LOST => "GL_CONTEXT_LOST",
        _ => "unknown GL error",
    }
}

/// Drain the driver's error flags, logging each one against `operation`.
fn gl_error(context: &(impl HasContext + ?Sized), operation: &str) {
    // Bounded, since a lost context may report the same error forever.
    for _ in 0..8 {
        let err = unsafe { context.get_error() };
        if err == glow::NO_ERROR {
            break;
        }

        tracing::error!(code = err, "{} while {operation}", gl_error_name(err));
    }
}
