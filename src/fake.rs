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

//! An in-memory context that imitates a GLSL driver closely enough for tests.
//!
//! Compilation only checks characters and bracket balance. Linking checks that every
//! attached stage compiled, that both stages have a `main`, and that every fragment input
//! is a vertex output. Uniforms are every `uniform` declaration in either stage.

use crate::backend::{ShaderContext, Stage, UniformKind, UniformValue};

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct FakeShader(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct FakeProgram(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FakeLocation(usize);

#[derive(Debug)]
pub(crate) struct FakeError(&'static str);

impl fmt::Display for FakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for FakeError {}

struct ShaderState {
    stage: Stage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Default)]
struct ProgramState {
    attached: Vec<FakeShader>,
    attach_count: usize,
    linked: bool,
    log: String,
    uniforms: Vec<String>,
    values: HashMap<usize, UniformValue>,
}

#[derive(Default)]
struct State {
    next_id: u32,
    shaders: HashMap<FakeShader, ShaderState>,
    programs: HashMap<FakeProgram, ProgramState>,
    current: Option<FakeProgram>,
    compiled_sources: Vec<String>,
    location_queries: usize,
    draws: Vec<(FakeProgram, usize)>,
    fail_program_creation: bool,
}

impl State {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub(crate) struct FakeContext {
    state: RefCell<State>,
}

impl FakeContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make every following `create_program` fail.
    pub(crate) fn fail_program_creation(&self) {
        self.state.borrow_mut().fail_program_creation = true;
    }

    /// Shader objects that have been created and not deleted.
    pub(crate) fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub(crate) fn attached_shaders(&self, program: FakeProgram) -> Vec<FakeShader> {
        self.state.borrow().programs[&program].attached.clone()
    }

    /// How many times anything was ever attached to `program`.
    pub(crate) fn attach_count(&self, program: FakeProgram) -> usize {
        self.state.borrow().programs[&program].attach_count
    }

    pub(crate) fn compiled_sources(&self) -> Vec<String> {
        self.state.borrow().compiled_sources.clone()
    }

    pub(crate) fn location_queries(&self) -> usize {
        self.state.borrow().location_queries
    }

    pub(crate) fn is_program(&self, program: FakeProgram) -> bool {
        self.state.borrow().programs.contains_key(&program)
    }

    /// Record a draw with whatever program is current.
    pub(crate) fn draw_arrays(&self, count: usize) {
        let mut state = self.state.borrow_mut();
        let current = state.current;
        if let Some(program) = current {
            state.draws.push((program, count));
        }
    }

    pub(crate) fn draws(&self) -> Vec<(FakeProgram, usize)> {
        self.state.borrow().draws.clone()
    }
}

impl ShaderContext for FakeContext {
    type Shader = FakeShader;
    type Program = FakeProgram;
    type UniformLocation = FakeLocation;
    type Error = FakeError;

    fn create_shader(&self, stage: Stage) -> Result<FakeShader, FakeError> {
        let mut state = self.state.borrow_mut();
        let shader = FakeShader(state.next_id());
        state.shaders.insert(
            shader,
            ShaderState {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        Ok(shader)
    }

    fn compile_shader(&self, shader: FakeShader, source: &str) {
        let mut state = self.state.borrow_mut();
        state.compiled_sources.push(source.to_owned());

        let entry = state.shaders.get_mut(&shader).expect("no such shader");
        entry.source = source.to_owned();
        match check_syntax(source) {
            Ok(()) => {
                entry.compiled = true;
                entry.log.clear();
            }
            Err(log) => {
                entry.compiled = false;
                entry.log = log;
            }
        }
    }

    fn shader_compile_status(&self, shader: FakeShader) -> bool {
        self.state.borrow().shaders[&shader].compiled
    }

    fn shader_info_log(&self, shader: FakeShader) -> String {
        self.state.borrow().shaders[&shader].log.clone()
    }

    fn delete_shader(&self, shader: FakeShader) {
        self.state.borrow_mut().shaders.remove(&shader);
    }

    fn create_program(&self) -> Result<FakeProgram, FakeError> {
        let mut state = self.state.borrow_mut();
        if state.fail_program_creation {
            return Err(FakeError("context lost"));
        }

        let program = FakeProgram(state.next_id());
        state.programs.insert(program, ProgramState::default());
        Ok(program)
    }

    fn attach_shader(&self, program: FakeProgram, shader: FakeShader) {
        let mut state = self.state.borrow_mut();
        let entry = state.programs.get_mut(&program).expect("no such program");
        entry.attached.push(shader);
        entry.attach_count += 1;
    }

    fn detach_shader(&self, program: FakeProgram, shader: FakeShader) {
        let mut state = self.state.borrow_mut();
        let entry = state.programs.get_mut(&program).expect("no such program");
        entry.attached.retain(|&s| s != shader);
    }

    fn link_program(&self, program: FakeProgram) {
        let mut state = self.state.borrow_mut();
        let State {
            shaders, programs, ..
        } = &mut *state;
        let entry = programs.get_mut(&program).expect("no such program");

        let stages: Vec<&ShaderState> = entry.attached.iter().map(|s| &shaders[s]).collect();
        match link(&stages) {
            Ok(uniforms) => {
                entry.linked = true;
                entry.log.clear();
                entry.uniforms = uniforms;
            }
            Err(log) => {
                entry.linked = false;
                entry.log = log;
                entry.uniforms.clear();
            }
        }
        entry.values.clear();
    }

    fn program_link_status(&self, program: FakeProgram) -> bool {
        self.state.borrow().programs[&program].linked
    }

    fn program_info_log(&self, program: FakeProgram) -> String {
        self.state.borrow().programs[&program].log.clone()
    }

    fn delete_program(&self, program: FakeProgram) {
        let mut state = self.state.borrow_mut();
        if state.current == Some(program) {
            state.current = None;
        }
        state.programs.remove(&program);
    }

    fn use_program(&self, program: Option<FakeProgram>) {
        self.state.borrow_mut().current = program;
    }

    fn current_program(&self) -> Option<FakeProgram> {
        self.state.borrow().current
    }

    fn uniform_location(&self, program: FakeProgram, name: &str) -> Option<FakeLocation> {
        let mut state = self.state.borrow_mut();
        state.location_queries += 1;
        state.programs[&program]
            .uniforms
            .iter()
            .position(|uniform| uniform == name)
            .map(FakeLocation)
    }

    fn set_uniform(&self, location: &FakeLocation, value: UniformValue) {
        let mut state = self.state.borrow_mut();
        let current = state.current;
        let Some(current) = current else {
            return;
        };
        if let Some(entry) = state.programs.get_mut(&current) {
            if location.0 < entry.uniforms.len() {
                entry.values.insert(location.0, value);
            }
        }
    }

    fn uniform_value(
        &self,
        program: FakeProgram,
        location: &FakeLocation,
        kind: UniformKind,
    ) -> UniformValue {
        let state = self.state.borrow();
        let stored = state.programs[&program].values.get(&location.0).copied();

        // Stands in for the driver's memory: the declared uniform as floats.
        let components = match stored {
            Some(UniformValue::Bool(b)) => [b as i32 as f32, 0.0, 0.0, 0.0],
            Some(UniformValue::Int(i)) => [i as f32, 0.0, 0.0, 0.0],
            Some(UniformValue::Float(f)) => [f, 0.0, 0.0, 0.0],
            Some(UniformValue::Vec4(v)) => v,
            None => [0.0; 4],
        };

        match kind {
            UniformKind::Bool => UniformValue::Bool(components[0] != 0.0),
            UniformKind::Int => UniformValue::Int(components[0] as i32),
            UniformKind::Float => UniformValue::Float(components[0]),
            UniformKind::Vec4 => UniformValue::Vec4(components),
        }
    }
}

fn check_syntax(source: &str) -> Result<(), String> {
    if source.trim().is_empty() {
        return Err("0:1(1): error: syntax error, unexpected end of file\n".into());
    }

    let allowed = |c: char| {
        c.is_alphanumeric() || c.is_whitespace() || "_.,;(){}[]=+-*/#<>!&|?:".contains(c)
    };
    for (number, line) in source.lines().enumerate() {
        if let Some(token) = line.split_whitespace().find(|token| !token.chars().all(allowed)) {
            return Err(format!(
                "0:{}(1): error: syntax error, unexpected `{token}`\n",
                number + 1
            ));
        }
    }

    let balanced = |open, close| source.matches(open).count() == source.matches(close).count();
    if !balanced('(', ')') || !balanced('{', '}') {
        return Err("0:1(1): error: syntax error, unbalanced brackets\n".into());
    }

    Ok(())
}

/// Returns the uniforms of the linked program.
fn link(stages: &[&ShaderState]) -> Result<Vec<String>, String> {
    if stages.iter().any(|stage| !stage.compiled) {
        return Err("error: linking with uncompiled shader\n".into());
    }

    let find = |wanted: Stage| stages.iter().find(|stage| stage.stage == wanted);
    let (Some(vertex), Some(fragment)) = (find(Stage::Vertex), find(Stage::Fragment)) else {
        return Err("error: program lacks a vertex or fragment stage\n".into());
    };

    for stage in [vertex, fragment] {
        if !stage.source.contains("void main") {
            return Err(format!("error: {} shader lacks `main`\n", stage.stage));
        }
    }

    let outputs = declarations(&vertex.source, "out");
    for input in declarations(&fragment.source, "in") {
        if !outputs.contains(&input) {
            return Err(format!(
                "error: fragment shader input `{input}` has no matching vertex shader output\n"
            ));
        }
    }

    let mut uniforms = declarations(&vertex.source, "uniform");
    for uniform in declarations(&fragment.source, "uniform") {
        if !uniforms.contains(&uniform) {
            uniforms.push(uniform);
        }
    }
    Ok(uniforms)
}

/// Names declared as `<qualifier> <type> <name>;`, with an optional `layout(...)` prefix.
fn declarations(source: &str, qualifier: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| {
            let line = line.split("//").next().unwrap_or_default().trim();
            let line = match line.strip_prefix("layout") {
                Some(rest) => &rest[rest.find(')')? + 1..],
                None => line,
            };

            let mut tokens = line.split_whitespace();
            if tokens.next()? != qualifier {
                return None;
            }
            let _ty = tokens.next()?;
            let name = tokens.next()?.trim_end_matches(';');
            Some(name.to_owned())
        })
        .collect()
}
