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
// Public License along with `gl-program`. If not, see <https://www.gnu.org/licenses/>.

//! Loads a shader pair from disk and draws a triangle with it every frame.
//!
//! The first argument picks the scene: `two-triangles`, `color-animation` or
//! `vertex-colors` (the default). Press Escape to quit.

include!("util/setup_context.rs");

use gl_program_glow::gl_program::{ProgramBuilder, ShaderProgram};
use gl_program_glow::{GlError, Mesh};

use std::error::Error;
use std::fmt;
use std::str::FromStr;

const CLEAR_COLOR: [f32; 4] = [0.8, 0.3, 0.3, 1.0];

macro_rules! shader_path {
    ($name:literal) => {
        concat!(env!("CARGO_MANIFEST_DIR"), "/examples/shaders/", $name)
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scene {
    /// An orange square made of two indexed triangles.
    TwoTriangles,

    /// The square again, its green pulsing through a uniform.
    ColorAnimation,

    /// One triangle with a color per corner.
    VertexColors,
}

impl Scene {
    fn shader_paths(self) -> (&'static str, &'static str) {
        match self {
            Scene::TwoTriangles => (
                shader_path!("two_triangles.vert"),
                shader_path!("two_triangles.frag"),
            ),
            Scene::ColorAnimation => (
                shader_path!("color_animation.vert"),
                shader_path!("color_animation.frag"),
            ),
            Scene::VertexColors => (
                shader_path!("vertex_colors.vert"),
                shader_path!("vertex_colors.frag"),
            ),
        }
    }

    fn mesh(self, gl: &util::Gl) -> Result<Mesh<glow::Context>, GlError> {
        match self {
            Scene::TwoTriangles | Scene::ColorAnimation => Mesh::quad(gl),
            Scene::VertexColors => Mesh::colored_triangle(gl),
        }
    }
}

impl FromStr for Scene {
    type Err = UnknownScene;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "two-triangles" => Ok(Scene::TwoTriangles),
            "color-animation" => Ok(Scene::ColorAnimation),
            "vertex-colors" => Ok(Scene::VertexColors),
            _ => Err(UnknownScene(s.to_owned())),
        }
    }
}

#[derive(Debug)]
struct UnknownScene(String);

impl fmt::Display for UnknownScene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown scene `{}`, expected two-triangles, color-animation or vertex-colors",
            self.0
        )
    }
}

impl Error for UnknownScene {}

struct State {
    scene: Scene,
    program: ShaderProgram<util::Gl>,
    mesh: Mesh<glow::Context>,
}

fn main() -> Result<(), Box<dyn Error>> {
    util::init();

    let scene = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => Scene::VertexColors,
    };
    tracing::info!("drawing {scene:?}");

    util::with_context(
        move |gl| {
            let (vertex, fragment) = scene.shader_paths();
            let program = ProgramBuilder::new()
                .version_header(gl.version_header())
                .build(gl.clone(), vertex, fragment)?;
            let mesh = scene.mesh(gl)?;

            Ok(State {
                scene,
                program,
                mesh,
            })
        },
        |gl, state: &mut State, elapsed| {
            gl.clear(CLEAR_COLOR);

            state.program.use_program();
            if state.scene == Scene::ColorAnimation {
                let green = elapsed.as_secs_f32().sin() / 2.0 + 0.5;
                state.program.set_vec4("triangleColor", 0.0, green, 0.0, 1.0);
            }

            state.mesh.draw(gl);
        },
        |gl, state: State| {
            state.mesh.delete(gl);
            state.program.delete();
        },
    )
}
