//! Reader for the subset of Wavefront OBJ/MTL used by the game assets.
//!
//! Only triangles are accepted. Indices are converted to 0-based on the way in,
//! and a missing texture or normal sub-index stays `None`.

mod mtl;

pub use self::mtl::{Library, MaterialDesc};

use std::{
    fmt,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct IndexTuple {
    pub vertex: usize,
    pub texcoord: Option<usize>,
    pub normal: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Face {
    pub material: Option<String>,
    pub corners: [IndexTuple; 3],
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Attribute {
    Position,
    TexCoord,
    Normal,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Attribute::Position => "position",
            Attribute::TexCoord => "texture coordinate",
            Attribute::Normal => "normal",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: `{keyword}` needs {expected} numbers")]
    MissingValues {
        line: usize,
        keyword: String,
        expected: usize,
    },
    #[error("line {line}: invalid number {token:?}")]
    BadNumber { line: usize, token: String },
    #[error("line {line}: invalid face corner {token:?}")]
    BadIndex { line: usize, token: String },
    #[error("line {line}: face has {count} corners, only triangles are supported")]
    NotTriangle { line: usize, count: usize },
    #[error("line {line}: `{keyword}` without a name")]
    MissingName { line: usize, keyword: String },
    #[error("face {face}: {attribute} index {index} is out of range ({available} defined)")]
    OutOfRange {
        face: usize,
        attribute: Attribute,
        index: usize,
        available: usize,
    },
}

#[derive(Clone, Debug, Default)]
pub struct Obj {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    pub faces: Vec<Face>,
    /// Material library names, in the order of their `mtllib` lines.
    pub material_libs: Vec<String>,
}

pub(crate) fn parse_floats<'a, I, const N: usize>(
    mut tokens: I,
    line: usize,
    keyword: &str,
) -> Result<[f32; N], ParseError>
where
    I: Iterator<Item = &'a str>,
{
    let mut values = [0.0; N];
    for value in values.iter_mut() {
        let token = tokens.next().ok_or_else(|| ParseError::MissingValues {
            line,
            keyword: keyword.to_string(),
            expected: N,
        })?;
        *value = token.parse().map_err(|_| ParseError::BadNumber {
            line,
            token: token.to_string(),
        })?;
    }
    Ok(values)
}

pub(crate) fn parse_name<'a, I>(mut tokens: I, line: usize, keyword: &str) -> Result<String, ParseError>
where
    I: Iterator<Item = &'a str>,
{
    tokens
        .next()
        .map(str::to_string)
        .ok_or_else(|| ParseError::MissingName {
            line,
            keyword: keyword.to_string(),
        })
}

fn parse_index(part: Option<&str>, line: usize, token: &str) -> Result<Option<usize>, ParseError> {
    match part {
        None | Some("") => Ok(None),
        Some(text) => match text.parse::<usize>() {
            Ok(index) if index > 0 => Ok(Some(index - 1)),
            _ => Err(ParseError::BadIndex {
                line,
                token: token.to_string(),
            }),
        },
    }
}

fn parse_corner(token: &str, line: usize) -> Result<IndexTuple, ParseError> {
    let mut parts = token.split('/');
    let vertex = match parse_index(parts.next(), line, token)? {
        Some(index) => index,
        None => {
            return Err(ParseError::BadIndex {
                line,
                token: token.to_string(),
            })
        }
    };
    let texcoord = parse_index(parts.next(), line, token)?;
    let normal = parse_index(parts.next(), line, token)?;
    if parts.next().is_some() {
        return Err(ParseError::BadIndex {
            line,
            token: token.to_string(),
        });
    }
    Ok(IndexTuple {
        vertex,
        texcoord,
        normal,
    })
}

impl Obj {
    pub fn load(path: &Path) -> Result<Self, ParseError> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    pub fn parse<R: BufRead>(reader: R) -> Result<Self, ParseError> {
        let mut obj = Obj::default();
        let mut current_material = None::<String>;

        for (line_index, line) in reader.lines().enumerate() {
            let line = line?;
            let number = line_index + 1;
            let mut tokens = line.split_whitespace();
            let keyword = match tokens.next() {
                Some(keyword) => keyword,
                None => continue,
            };
            match keyword {
                "v" => obj.positions.push(parse_floats(tokens, number, keyword)?),
                "vn" => obj.normals.push(parse_floats(tokens, number, keyword)?),
                "vt" => obj.texcoords.push(parse_floats(tokens, number, keyword)?),
                "f" => {
                    let corners = tokens
                        .map(|token| parse_corner(token, number))
                        .collect::<Result<Vec<_>, _>>()?;
                    if corners.len() != 3 {
                        return Err(ParseError::NotTriangle {
                            line: number,
                            count: corners.len(),
                        });
                    }
                    obj.faces.push(Face {
                        material: current_material.clone(),
                        corners: [corners[0], corners[1], corners[2]],
                    });
                }
                "mtllib" => obj
                    .material_libs
                    .push(parse_name(tokens, number, keyword)?),
                "usemtl" => current_material = Some(parse_name(tokens, number, keyword)?),
                _ => {}
            }
        }

        obj.validate()?;
        log::debug!(
            "Parsed {} positions, {} normals, {} texcoords, {} faces",
            obj.positions.len(),
            obj.normals.len(),
            obj.texcoords.len(),
            obj.faces.len()
        );
        Ok(obj)
    }

    /// Checks that every face corner points at existing data.
    pub fn validate(&self) -> Result<(), ParseError> {
        let check = |face, attribute, index: usize, available: usize| {
            if index < available {
                Ok(())
            } else {
                Err(ParseError::OutOfRange {
                    face,
                    attribute,
                    index,
                    available,
                })
            }
        };
        for (face_index, face) in self.faces.iter().enumerate() {
            for corner in face.corners.iter() {
                check(
                    face_index,
                    Attribute::Position,
                    corner.vertex,
                    self.positions.len(),
                )?;
                if let Some(index) = corner.texcoord {
                    check(face_index, Attribute::TexCoord, index, self.texcoords.len())?;
                }
                if let Some(index) = corner.normal {
                    check(face_index, Attribute::Normal, index, self.normals.len())?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
# a single triangle
mtllib scene.mtl
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0 0.5
vt 0 1
vn 0 0 1
usemtl body
f 1/1/1 2/2/1 3/3/1
";

    #[test]
    fn parse_triangle() {
        let obj = Obj::parse(TRIANGLE.as_bytes()).unwrap();
        assert_eq!(obj.positions.len(), 3);
        assert_eq!(obj.texcoords[1], [1.0, 0.0]);
        assert_eq!(obj.material_libs, vec!["scene.mtl".to_string()]);
        assert_eq!(obj.faces.len(), 1);
        let face = &obj.faces[0];
        assert_eq!(face.material.as_deref(), Some("body"));
        let vertices = face.corners.iter().map(|c| c.vertex).collect::<Vec<_>>();
        assert_eq!(vertices, vec![0, 1, 2]);
        assert_eq!(face.corners[2].texcoord, Some(2));
        assert_eq!(face.corners[2].normal, Some(0));
    }

    #[test]
    fn missing_sub_indices() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 1 0\nf 1 2//1 3/\n";
        let obj = Obj::parse(text.as_bytes()).unwrap();
        let corners = &obj.faces[0].corners;
        assert_eq!(corners[0].texcoord, None);
        assert_eq!(corners[0].normal, None);
        assert_eq!(corners[1].texcoord, None);
        assert_eq!(corners[1].normal, Some(0));
        assert_eq!(corners[2].texcoord, None);
        assert_eq!(obj.faces[0].material, None);
    }

    #[test]
    fn reject_quads() {
        let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        match Obj::parse(text.as_bytes()) {
            Err(ParseError::NotTriangle { line: 5, count: 4 }) => {}
            other => panic!("Unexpected result {:?}", other),
        }
    }

    #[test]
    fn reject_relative_and_zero_indices() {
        for face in &["f -1 -2 -3", "f 0 1 2", "f 1/x/1 2 3", "f 1/1/1/1 2 3"] {
            let text = format!("v 0 0 0\nv 1 0 0\nv 0 1 0\n{}\n", face);
            assert!(matches!(
                Obj::parse(text.as_bytes()),
                Err(ParseError::BadIndex { line: 4, .. })
            ));
        }
    }

    #[test]
    fn reject_out_of_range() {
        let text = "v 0 0 0\nv 1 0 0\nf 1 2 3\n";
        assert!(matches!(
            Obj::parse(text.as_bytes()),
            Err(ParseError::OutOfRange {
                attribute: Attribute::Position,
                index: 2,
                ..
            })
        ));
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1//2 2 3\n";
        assert!(matches!(
            Obj::parse(text.as_bytes()),
            Err(ParseError::OutOfRange {
                attribute: Attribute::Normal,
                ..
            })
        ));
    }

    #[test]
    fn unknown_keywords_are_ignored() {
        let text = "o car\ng wheels\ns off\nl 1 2\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let obj = Obj::parse(text.as_bytes()).unwrap();
        assert_eq!(obj.faces.len(), 1);
    }

    #[test]
    fn bad_numbers() {
        assert!(matches!(
            Obj::parse("v 0 zero 0\n".as_bytes()),
            Err(ParseError::BadNumber { line: 1, .. })
        ));
        assert!(matches!(
            Obj::parse("vt 0.5\n".as_bytes()),
            Err(ParseError::MissingValues { line: 1, expected: 2, .. })
        ));
    }
}
