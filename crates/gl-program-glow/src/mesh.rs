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

//! Vertex data living on the GPU.

use crate::{gl_error, GlError, GlowContext};

use gl_program::CallOnDrop;

use bytemuck::{Pod, Zeroable};
use glow::HasContext;

use std::mem;

/// A vertex with only a position.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Default, Pod, Zeroable)]
#[repr(C)]
pub struct PositionVertex {
    pub position: [f32; 3],
}

impl PositionVertex {
    /// `position` at location 0.
    pub const LAYOUT: &'static [Attribute] = &[Attribute {
        location: 0,
        components: 3,
        offset: 0,
    }];
}

/// A vertex with a position and a color.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Default, Pod, Zeroable)]
#[repr(C)]
pub struct ColorVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl ColorVertex {
    /// `position` at location 0, `color` at location 1.
    pub const LAYOUT: &'static [Attribute] = &[
        Attribute {
            location: 0,
            components: 3,
            offset: 0,
        },
        Attribute {
            location: 1,
            components: 3,
            offset: mem::size_of::<[f32; 3]>(),
        },
    ];
}

/// A float vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    /// The `layout (location = N)` of the attribute.
    pub location: u32,

    /// Number of `f32` components.
    pub components: i32,

    /// Byte offset inside the vertex.
    pub offset: usize,
}

/// The corners of a square, drawn as two triangles.
const QUAD_VERTICES: [PositionVertex; 4] = [
    PositionVertex {
        position: [0.5, 0.5, 0.0],
    },
    PositionVertex {
        position: [0.5, -0.5, 0.0],
    },
    PositionVertex {
        position: [-0.5, -0.5, 0.0],
    },
    PositionVertex {
        position: [-0.5, 0.5, 0.0],
    },
];

const QUAD_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

/// A triangle with a red, a green and a blue corner.
const COLORED_TRIANGLE: [ColorVertex; 3] = [
    ColorVertex {
        position: [0.5, -0.5, 0.0],
        color: [1.0, 0.0, 0.0],
    },
    ColorVertex {
        position: [-0.5, -0.5, 0.0],
        color: [0.0, 1.0, 0.0],
    },
    ColorVertex {
        position: [0.0, 0.5, 0.0],
        color: [0.0, 0.0, 1.0],
    },
];

/// A vertex array with its buffers.
///
/// Like programs, meshes are not released on drop; call [`Mesh::delete`].
pub struct Mesh<H: HasContext + ?Sized> {
    /// The vertex array object.
    vao: H::VertexArray,

    /// The vertex buffer.
    vbo: H::Buffer,

    /// The index buffer, for indexed meshes.
    ebo: Option<H::Buffer>,

    /// Number of vertices or indices to draw.
    count: i32,
}

impl<H: HasContext + ?Sized> Mesh<H> {
    /// Two triangles forming a square in the middle of the viewport, drawn with indices.
    pub fn quad(gl: &GlowContext<H>) -> Result<Self, GlError> {
        Self::new(
            gl,
            &QUAD_VERTICES,
            PositionVertex::LAYOUT,
            Some(&QUAD_INDICES),
        )
    }

    /// A single triangle with per-vertex colors.
    pub fn colored_triangle(gl: &GlowContext<H>) -> Result<Self, GlError> {
        Self::new(gl, &COLORED_TRIANGLE, ColorVertex::LAYOUT, None)
    }

    /// Upload `vertices` and, if given, `indices`, described by `layout`.
    pub fn new<V: Pod>(
        gl: &GlowContext<H>,
        vertices: &[V],
        layout: &[Attribute],
        indices: Option<&[u32]>,
    ) -> Result<Self, GlError> {
        debug_assert!(indices.map_or(true, |indices| indices
            .iter()
            .all(|&i| (i as usize) < vertices.len())));

        let context = gl.context();
        let stride = mem::size_of::<V>() as i32;

        let (vao, vbo, ebo) = create_objects(
            indices.is_some(),
            || unsafe { context.create_vertex_array().map_err(GlError) },
            || unsafe { context.create_buffer().map_err(GlError) },
            |vao| unsafe { context.delete_vertex_array(vao) },
            |buffer| unsafe { context.delete_buffer(buffer) },
        )?;

        unsafe {
            context.bind_vertex_array(Some(vao));
            let _unbind_vao = CallOnDrop(|| {
                context.bind_vertex_array(None);
            });

            context.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            context.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(vertices),
                glow::STATIC_DRAW,
            );

            // The element buffer binding is part of the VAO state, so it stays bound.
            if let (Some(ebo), Some(indices)) = (ebo, indices) {
                context.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
                context.buffer_data_u8_slice(
                    glow::ELEMENT_ARRAY_BUFFER,
                    bytemuck::cast_slice(indices),
                    glow::STATIC_DRAW,
                );
            }

            for attribute in layout {
                context.vertex_attrib_pointer_f32(
                    attribute.location,
                    attribute.components,
                    glow::FLOAT,
                    false,
                    stride,
                    attribute.offset as i32,
                );
                context.enable_vertex_attrib_array(attribute.location);
            }

            context.bind_buffer(glow::ARRAY_BUFFER, None);
            gl_error(context, "uploading a mesh");

            Ok(Mesh {
                vao,
                vbo,
                ebo,
                count: indices.map_or(vertices.len(), <[u32]>::len) as i32,
            })
        }
    }

    /// Draw the mesh as triangles with the current program.
    pub fn draw(&self, gl: &GlowContext<H>) {
        let context = gl.context();

        unsafe {
            context.bind_vertex_array(Some(self.vao));

            if self.ebo.is_some() {
                context.draw_elements(glow::TRIANGLES, self.count, glow::UNSIGNED_INT, 0);
            } else {
                context.draw_arrays(glow::TRIANGLES, 0, self.count);
            }
        }

        gl_error(context, "drawing a mesh");
    }

    /// Release the vertex array and its buffers.
    pub fn delete(self, gl: &GlowContext<H>) {
        let context = gl.context();

        unsafe {
            context.delete_vertex_array(self.vao);
            context.delete_buffer(self.vbo);
            if let Some(ebo) = self.ebo {
                context.delete_buffer(ebo);
            }
        }
    }
}

/// Create a vertex array, a vertex buffer and, if `indexed`, an index buffer.
///
/// If any creation fails, the objects created before it are deleted again.
fn create_objects<A: Copy, B: Copy>(
    indexed: bool,
    mut create_array: impl FnMut() -> Result<A, GlError>,
    mut create_buffer: impl FnMut() -> Result<B, GlError>,
    mut delete_array: impl FnMut(A),
    mut delete_buffer: impl FnMut(B),
) -> Result<(A, B, Option<B>), GlError> {
    let vao = create_array()?;
    let delete_vao = CallOnDrop(|| delete_array(vao));

    let vbo = create_buffer()?;
    let delete_vbo = CallOnDrop(|| delete_buffer(vbo));

    let ebo = if indexed {
        Some(create_buffer()?)
    } else {
        None
    };

    mem::forget(delete_vbo);
    mem::forget(delete_vao);
    Ok((vao, vbo, ebo))
}
