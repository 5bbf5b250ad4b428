// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `gl-program`.
//
// `gl-program` is free software: you can redistribute it and/or modify it under the
// terms of either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
//   version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `gl-program` is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR
// PURPOSE. See the GNU Lesser General Public License or the Mozilla Public License for more
// details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `gl-program`. If not, see <https://www.gnu.org/licenses/>.

//! Defines the graphics context capabilities used by the loader.

use std::error::Error;
use std::fmt;

/// The set of graphics context operations needed to build and drive a shader program.
///
/// Every method assumes the context is current on the calling thread. Implementations are
/// expected to follow OpenGL semantics; in particular, [`set_uniform`] writes into the program
/// that is *currently bound*, not into the program the location was queried from.
///
/// [`set_uniform`]: ShaderContext::set_uniform
pub trait ShaderContext {
    /// A compiled (or failed) shader stage object.
    type Shader: Copy;

    /// A program object.
    type Program: Copy + PartialEq + fmt::Debug;

    /// The location of a uniform inside a linked program.
    type UniformLocation: Clone;

    /// The error type returned when an object cannot be created at all.
    type Error: Error + 'static;

    /// Create a new shader object for the given stage.
    fn create_shader(&self, stage: Stage) -> Result<Self::Shader, Self::Error>;

    /// Upload `source` into `shader` and compile it.
    fn compile_shader(&self, shader: Self::Shader, source: &str);

    /// Whether the last compilation of `shader` succeeded.
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;

    /// The compiler's info log for `shader`.
    fn shader_info_log(&self, shader: Self::Shader) -> String;

    /// Delete a shader object.
    fn delete_shader(&self, shader: Self::Shader);

    /// Create a new, empty program object.
    fn create_program(&self) -> Result<Self::Program, Self::Error>;

    /// Attach a shader object to a program.
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);

    /// Detach a shader object from a program.
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);

    /// Link every attached shader into `program`.
    fn link_program(&self, program: Self::Program);

    /// Whether the last link of `program` succeeded.
    fn program_link_status(&self, program: Self::Program) -> bool;

    /// The linker's info log for `program`.
    fn program_info_log(&self, program: Self::Program) -> String;

    /// Delete a program object, unbinding it first if it is the current program.
    fn delete_program(&self, program: Self::Program);

    /// Make `program` current, or unbind any program with `None`.
    fn use_program(&self, program: Option<Self::Program>);

    /// The program that is currently bound, if any.
    fn current_program(&self) -> Option<Self::Program>;

    /// Resolve a uniform by name. Returns `None` if the program has no such active uniform.
    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;

    /// Upload a value into a uniform of the currently bound program.
    fn set_uniform(&self, location: &Self::UniformLocation, value: UniformValue);

    /// Read the current value of a uniform back from the context.
    ///
    /// The value is returned as `kind` whatever the uniform was declared as. Its leading
    /// components are converted to `kind`, and components the uniform does not have read as
    /// zero, so reading a `vec4` as a `Float` yields its first component. Implementations must
    /// cope with a uniform larger than `kind`.
    fn uniform_value(
        &self,
        program: Self::Program,
        location: &Self::UniformLocation,
        kind: UniformKind,
    ) -> UniformValue;
}

/// A shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// The vertex stage.
    Vertex,

    /// The fragment stage.
    Fragment,
}

impl Stage {
    /// Both stages, in the order they are compiled and attached.
    pub const ALL: [Stage; 2] = [Stage::Vertex, Stage::Fragment];

    /// The lowercase name of this stage.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that can be written into a uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// A boolean, uploaded as an integer.
    Bool(bool),

    /// A signed integer.
    Int(i32),

    /// A float.
    Float(f32),

    /// A four component float vector.
    Vec4([f32; 4]),
}

impl UniformValue {
    /// The kind of this value.
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Bool(_) => UniformKind::Bool,
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec4(_) => UniformKind::Vec4,
        }
    }
}

/// The kind of a [`UniformValue`], used to read one back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Bool,
    Int,
    Float,
    Vec4,
}

impl UniformKind {
    /// How many scalar components a uniform of this kind has.
    pub fn components(self) -> usize {
        match self {
            UniformKind::Bool | UniformKind::Int | UniformKind::Float => 1,
            UniformKind::Vec4 => 4,
        }
    }
}
