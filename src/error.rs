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

//! Failures that can happen while building a program.

use crate::backend::Stage;

use std::fmt;
use std::io;
use std::path::PathBuf;

/// A failure recorded while building a [`ShaderProgram`].
///
/// None of these abort construction. They are logged, handed to the diagnostic hook and kept
/// on the program, where [`ShaderProgram::errors`] returns them.
///
/// [`ShaderProgram`]: crate::ShaderProgram
/// [`ShaderProgram::errors`]: crate::ShaderProgram::errors
#[derive(Debug)]
pub enum Error {
    /// A source file could not be read. An empty source was compiled in its place.
    Read {
        /// The stage the file was meant for.
        stage: Stage,

        /// The path that failed.
        path: PathBuf,

        /// The underlying I/O error.
        source: io::Error,
    },

    /// A stage failed to compile.
    Compile {
        /// The stage that failed.
        stage: Stage,

        /// The compiler's info log.
        log: String,
    },

    /// The program failed to link.
    Link {
        /// The linker's info log.
        log: String,
    },
}

impl Error {
    /// The stage this failure belongs to, if it belongs to a single one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Read { stage, .. } | Error::Compile { stage, .. } => Some(*stage),
            Error::Link { .. } => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Read { stage, path, source } => write!(
                f,
                "failed to read {stage} shader source from {}: {source}",
                path.display()
            ),
            Error::Compile { stage, log } => {
                write!(f, "{stage} shader failed to compile: {}", log.trim_end())
            }
            Error::Link { log } => write!(f, "program failed to link: {}", log.trim_end()),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Something worth knowing about that did not stop the program from being built or used.
#[derive(Debug, Clone, Copy)]
pub enum Diagnostic<'a> {
    /// A read, compile or link failure.
    Failure(&'a Error),

    /// A uniform was set by a name the program does not have. The upload was skipped.
    MissingUniform {
        /// The name that was looked up.
        name: &'a str,
    },
}

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Failure(err) => fmt::Display::fmt(err, f),
            Diagnostic::MissingUniform { name } => {
                write!(f, "no active uniform named `{name}`")
            }
        }
    }
}
