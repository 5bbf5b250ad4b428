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

//! Reading shader sources.

use crate::backend::Stage;
use crate::error::Error;

use std::borrow::Cow;
use std::fs;
use std::path::Path;

/// Read the whole source file for `stage` at `path`.
pub fn read_source(stage: Stage, path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|source| Error::Read {
        stage,
        path: path.to_path_buf(),
        source,
    })
}

/// Prepend `header` to `source` unless the source is empty or declares its own `#version`.
pub(crate) fn with_version_header<'a>(source: &'a str, header: Option<&str>) -> Cow<'a, str> {
    match header {
        Some(header) if !source.trim().is_empty() && !declares_version(source) => {
            Cow::Owned(format!("{}\n{source}", header.trim_end()))
        }
        _ => Cow::Borrowed(source),
    }
}

/// `#version` must be the first directive, only whitespace and comments may precede it.
fn declares_version(source: &str) -> bool {
    let mut rest = source;
    loop {
        rest = rest.trim_start();
        if let Some(comment) = rest.strip_prefix("//") {
            rest = comment.split_once('\n').map_or("", |(_, tail)| tail);
        } else if let Some(comment) = rest.strip_prefix("/*") {
            match comment.split_once("*/") {
                Some((_, tail)) => rest = tail,
                None => return false,
            }
        } else {
            return rest.strip_prefix('#').map_or(false, |directive| {
                directive
                    .trim_start_matches(&[' ', '\t'][..])
                    .starts_with("version")
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn reads_whole_file() {
        let path = std::env::temp_dir().join(format!("gl-program-read-{}.vert", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        write!(file, "void main() {{\n}}\n").unwrap();
        drop(file);

        let source = read_source(Stage::Vertex, &path).unwrap();
        assert_eq!(source, "void main() {\n}\n");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let path = Path::new("this/path/does/not/exist.frag");
        match read_source(Stage::Fragment, path) {
            Err(Error::Read { stage, path: p, .. }) => {
                assert_eq!(stage, Stage::Fragment);
                assert_eq!(p, path);
            }
            other => panic!("expected a read error, got {other:?}"),
        }
    }

    #[test]
    fn header_is_prepended_when_missing() {
        let out = with_version_header("void main() {}", Some("#version 330 core"));
        assert_eq!(out, "#version 330 core\nvoid main() {}");
    }

    #[test]
    fn header_is_kept_out_of_versioned_sources() {
        let src = "// triangle\n\n#version 410 core\nvoid main() {}";
        assert!(matches!(
            with_version_header(src, Some("#version 330 core")),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn block_comments_may_precede_the_version() {
        let src = "/* copyright\n * notice */\n#version 410 core\nvoid main() {}";
        assert_eq!(with_version_header(src, Some("#version 330 core")), src);

        let src = "/* a */ // b\n/**/#  version 300 es\nvoid main() {}";
        assert_eq!(with_version_header(src, Some("#version 330 core")), src);
    }

    #[test]
    fn version_inside_a_comment_does_not_count() {
        let src = "/* #version 410 core */\nvoid main() {}";
        assert_eq!(
            with_version_header(src, Some("#version 330 core")),
            format!("#version 330 core\n{src}")
        );

        let unterminated = "/* #version 410 core\nvoid main() {}";
        assert!(matches!(
            with_version_header(unterminated, Some("#version 330 core")),
            Cow::Owned(_)
        ));
    }

    #[test]
    fn header_is_kept_out_of_empty_sources() {
        assert_eq!(with_version_header("  \n", Some("#version 300 es")), "  \n");
        assert_eq!(with_version_header("void main() {}", None), "void main() {}");
    }
}
