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

//! The shader program and its builder.

use crate::backend::{ShaderContext, Stage, UniformKind, UniformValue};
use crate::error::{Diagnostic, Error};
use crate::source::{read_source, with_version_header};
use crate::CallOnDrop;

use ahash::RandomState;
use arrayvec::ArrayVec;
use hashbrown::HashMap;

use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

/// A callback that receives every [`Diagnostic`] a program produces.
pub type DiagnosticHook = Rc<dyn Fn(&Diagnostic<'_>)>;

/// Options for building a [`ShaderProgram`].
#[derive(Clone, Default)]
pub struct ProgramBuilder {
    /// `#version` line for sources that lack one.
    version_header: Option<String>,

    /// Extra receiver for diagnostics.
    hook: Option<DiagnosticHook>,
}

impl fmt::Debug for ProgramBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramBuilder")
            .field("version_header", &self.version_header)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl ProgramBuilder {
    /// Create a builder with no version header and no diagnostic hook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend `header` to every non-empty source that does not start with its own `#version`.
    pub fn version_header(mut self, header: impl Into<String>) -> Self {
        self.version_header = Some(header.into());
        self
    }

    /// Forward every diagnostic to `hook`, in addition to logging it.
    ///
    /// The hook stays with the built program, so it also hears about uniform names that
    /// could not be resolved.
    pub fn on_diagnostic(mut self, hook: impl Fn(&Diagnostic<'_>) + 'static) -> Self {
        self.hook = Some(Rc::new(hook));
        self
    }

    /// Read, compile and link the shaders at `vertex_path` and `fragment_path`.
    ///
    /// Unreadable files are replaced with empty sources. Read, compile and link failures are
    /// logged and recorded on the returned program; they never make this function fail. An
    /// `Err` means the context could not create a shader or program object at all.
    pub fn build<C: ShaderContext + ?Sized>(
        &self,
        context: Rc<C>,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<ShaderProgram<C>, C::Error> {
        let mut report = Report::new(self.hook.as_ref());

        let mut read = |stage, path: &Path| {
            read_source(stage, path).unwrap_or_else(|err| {
                report.fail(err);
                String::new()
            })
        };
        let vertex = read(Stage::Vertex, vertex_path.as_ref());
        let fragment = read(Stage::Fragment, fragment_path.as_ref());

        self.finish(context, [vertex.as_str(), fragment.as_str()], report)
    }

    /// Compile and link shaders from in-memory sources.
    pub fn build_from_sources<C: ShaderContext + ?Sized>(
        &self,
        context: Rc<C>,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ShaderProgram<C>, C::Error> {
        let report = Report::new(self.hook.as_ref());
        self.finish(context, [vertex_source, fragment_source], report)
    }

    fn finish<C: ShaderContext + ?Sized>(
        &self,
        context: Rc<C>,
        sources: [&str; 2],
        mut report: Report<'_>,
    ) -> Result<ShaderProgram<C>, C::Error> {
        let header = self.version_header.as_deref();
        let sources = sources.map(|source| with_version_header(source, header));

        let program = link_program(
            &*context,
            Stage::ALL.into_iter().zip(sources.iter().map(|s| &**s)),
            &mut report,
        )?;
        let linked = context.program_link_status(program);

        Ok(ShaderProgram {
            context,
            program,
            linked,
            errors: report.errors,
            locations: RefCell::new(HashMap::with_hasher(RandomState::new())),
            hook: self.hook.clone(),
        })
    }
}

/// A linked shader program, or the remains of one that failed to build.
///
/// Construction never fails because of bad sources: the handle is kept either way, and whether
/// it is usable can be checked with [`is_linked`] or [`status`]. The program object is not
/// released on drop; call [`delete`] when it is no longer needed.
///
/// [`is_linked`]: ShaderProgram::is_linked
/// [`status`]: ShaderProgram::status
/// [`delete`]: ShaderProgram::delete
pub struct ShaderProgram<C: ShaderContext + ?Sized> {
    /// The context the program lives on.
    context: Rc<C>,

    /// The program object.
    program: C::Program,

    /// Whether linking succeeded.
    linked: bool,

    /// Everything that went wrong while building.
    errors: Vec<Error>,

    /// Uniform locations by name, including names that did not resolve.
    locations: RefCell<HashMap<String, Option<C::UniformLocation>, RandomState>>,

    /// Extra receiver for diagnostics.
    hook: Option<DiagnosticHook>,
}

impl<C: ShaderContext + ?Sized> fmt::Debug for ShaderProgram<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("program", &self.program)
            .field("linked", &self.linked)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl<C: ShaderContext + ?Sized> ShaderProgram<C> {
    /// Build a program from two source files with default options.
    pub fn new(
        context: Rc<C>,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, C::Error> {
        ProgramBuilder::new().build(context, vertex_path, fragment_path)
    }

    /// Build a program from two in-memory sources with default options.
    pub fn from_sources(
        context: Rc<C>,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, C::Error> {
        ProgramBuilder::new().build_from_sources(context, vertex_source, fragment_source)
    }

    /// The underlying program object.
    pub fn handle(&self) -> C::Program {
        self.program
    }

    /// The context this program was built on.
    pub fn context(&self) -> &Rc<C> {
        &self.context
    }

    /// Whether the program linked successfully.
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    /// Every read, compile and link failure recorded while building, in order.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// `Ok` if the program linked, otherwise the first recorded failure.
    ///
    /// A failure is always recorded when linking fails, since the link log is kept as well.
    pub fn status(&self) -> Result<(), &Error> {
        match self.errors.first() {
            Some(err) if !self.linked => Err(err),
            _ => Ok(()),
        }
    }

    /// Make this the program used by subsequent draw calls.
    pub fn use_program(&self) {
        self.context.use_program(Some(self.program));
    }

    /// Whether the context reports this program as the current one.
    pub fn is_current(&self) -> bool {
        self.context.current_program() == Some(self.program)
    }

    /// Set a `bool` uniform.
    pub fn set_bool(&self, name: &str, value: bool) {
        self.set_uniform(name, UniformValue::Bool(value));
    }

    /// Set an `int` uniform.
    pub fn set_int(&self, name: &str, value: i32) {
        self.set_uniform(name, UniformValue::Int(value));
    }

    /// Set a `float` uniform.
    pub fn set_float(&self, name: &str, value: f32) {
        self.set_uniform(name, UniformValue::Float(value));
    }

    /// Set a `vec4` uniform.
    pub fn set_vec4(&self, name: &str, x: f32, y: f32, z: f32, w: f32) {
        self.set_uniform(name, UniformValue::Vec4([x, y, z, w]));
    }

    /// Resolve `name` in this program and upload `value` into the current program.
    ///
    /// The value lands in whichever program is current, so call [`use_program`] first. If
    /// the name does not resolve nothing is uploaded; the miss is only logged and reported
    /// to the diagnostic hook.
    ///
    /// [`use_program`]: ShaderProgram::use_program
    pub fn set_uniform(&self, name: &str, value: UniformValue) {
        match self.location(name) {
            Some(location) => {
                tracing::trace!("setting uniform `{name}` to {value:?}");
                self.context.set_uniform(&location, value);
            }
            None => {
                tracing::debug!("no active uniform named `{name}`, skipping upload");
                if let Some(hook) = &self.hook {
                    hook(&Diagnostic::MissingUniform { name });
                }
            }
        }
    }

    /// Read a uniform's current value back from the context.
    pub fn uniform(&self, name: &str, kind: UniformKind) -> Option<UniformValue> {
        let location = self.location(name)?;
        Some(self.context.uniform_value(self.program, &location, kind))
    }

    /// Release the program object.
    ///
    /// If the program is current, the context is left with no program bound.
    pub fn delete(self) {
        self.context.delete_program(self.program);
    }

    fn location(&self, name: &str) -> Option<C::UniformLocation> {
        if let Some(location) = self.locations.borrow().get(name) {
            return location.clone();
        }

        let location = self.context.uniform_location(self.program, name);
        self.locations
            .borrow_mut()
            .insert(name.to_owned(), location.clone());
        location
    }
}

/// Collects the failures of a build.
struct Report<'a> {
    hook: Option<&'a DiagnosticHook>,
    errors: Vec<Error>,
}

impl<'a> Report<'a> {
    fn new(hook: Option<&'a DiagnosticHook>) -> Self {
        Self {
            hook,
            errors: Vec::new(),
        }
    }

    fn fail(&mut self, err: Error) {
        tracing::error!("{err}");
        if let Some(hook) = self.hook {
            hook(&Diagnostic::Failure(&err));
        }
        self.errors.push(err);
    }
}

/// Compile every stage and link them into a new program.
///
/// Stages are attached even if they failed to compile, and are detached and deleted once
/// linking has been attempted.
fn link_program<'s, C: ShaderContext + ?Sized>(
    context: &C,
    stages: impl IntoIterator<Item = (Stage, &'s str)>,
    report: &mut Report<'_>,
) -> Result<C::Program, C::Error> {
    let mut shaders = ArrayVec::<C::Shader, 2>::new();
    for (stage, source) in stages {
        match compile_stage(context, stage, source, report) {
            Ok(shader) => shaders.push(shader),
            Err(err) => {
                shaders.iter().for_each(|&shader| context.delete_shader(shader));
                return Err(err);
            }
        }
    }

    let _delete_shaders = CallOnDrop(|| {
        shaders.iter().for_each(|&shader| context.delete_shader(shader));
    });

    let program = context.create_program()?;
    for &shader in &shaders {
        context.attach_shader(program, shader);
    }
    let _detach_shaders = CallOnDrop(|| {
        shaders
            .iter()
            .for_each(|&shader| context.detach_shader(program, shader));
    });

    context.link_program(program);

    if context.program_link_status(program) {
        tracing::debug!("linked program {program:?}");
    } else {
        report.fail(Error::Link {
            log: context.program_info_log(program),
        });
    }

    Ok(program)
}

/// Compile one stage. A failed compile is reported but the shader object is still returned.
fn compile_stage<C: ShaderContext + ?Sized>(
    context: &C,
    stage: Stage,
    source: &str,
    report: &mut Report<'_>,
) -> Result<C::Shader, C::Error> {
    let shader = context.create_shader(stage)?;
    context.compile_shader(shader, source);

    if context.shader_compile_status(shader) {
        tracing::debug!("compiled {stage} shader");
    } else {
        report.fail(Error::Compile {
            stage,
            log: context.shader_info_log(shader),
        });
    }

    Ok(shader)
}
