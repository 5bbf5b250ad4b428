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

//! Loads a vertex and a fragment shader from disk and links them into a GPU program.
//!
//! The centerpiece is [`ShaderProgram`]. It reads both sources, compiles each stage, links
//! them, and then offers [`use_program`] and a handful of typed uniform setters. Failures do
//! not abort anything: an unreadable file becomes an empty source, a bad stage becomes a
//! program that fails to link, and an unknown uniform name becomes a no-op. Every one of
//! these is logged through [`tracing`], recorded on the program, and can be observed with
//! [`ProgramBuilder::on_diagnostic`].
//!
//! This crate does not talk to a graphics API directly. It drives anything that implements
//! [`ShaderContext`]; the `gl-program-glow` crate implements it on top of [`glow`].
//!
//! [`use_program`]: ShaderProgram::use_program
//! [`tracing`]: https://crates.io/crates/tracing
//! [`glow`]: https://crates.io/crates/glow

#![forbid(unsafe_code)]

mod backend;
mod error;
mod program;
mod source;

#[cfg(test)]
mod fake;

pub use backend::{ShaderContext, Stage, UniformKind, UniformValue};
pub use error::{Diagnostic, Error};
pub use program::{DiagnosticHook, ProgramBuilder, ShaderProgram};
pub use source::read_source;

/// Runs the closure when dropped.
///
/// Backends use it to release half-built GL objects on early returns.
#[doc(hidden)]
pub struct CallOnDrop<F: FnMut()>(pub F);

impl<F: FnMut()> Drop for CallOnDrop<F> {
    fn drop(&mut self) {
        (self.0)();
    }
}
