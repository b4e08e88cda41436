use crate::{parse_floats, parse_name, ParseError};

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialDesc {
    pub name: String,
    pub diffuse: [f32; 3],
    /// Raw `map_Kd` argument, exactly as written in the file.
    pub diffuse_map: Option<String>,
}

impl MaterialDesc {
    fn new(name: String) -> Self {
        MaterialDesc {
            name,
            diffuse: [1.0; 3],
            diffuse_map: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Library {
    pub materials: Vec<MaterialDesc>,
}

impl Library {
    pub fn load(path: &Path) -> Result<Self, ParseError> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    pub fn parse<R: BufRead>(reader: R) -> Result<Self, ParseError> {
        let mut materials = Vec::<MaterialDesc>::new();

        for (line_index, line) in reader.lines().enumerate() {
            let line = line?;
            let number = line_index + 1;
            let trimmed = line.trim_start();
            let mut tokens = trimmed.split_whitespace();
            let keyword = match tokens.next() {
                Some(keyword) => keyword,
                None => continue,
            };
            match keyword {
                "newmtl" => {
                    let name = parse_name(tokens, number, keyword)?;
                    materials.push(MaterialDesc::new(name));
                }
                "Kd" => {
                    if let Some(current) = materials.last_mut() {
                        current.diffuse = parse_floats(tokens, number, keyword)?;
                    }
                }
                "map_Kd" => {
                    // the path is the rest of the line and may contain spaces
                    let path = trimmed[keyword.len()..].trim();
                    if path.is_empty() {
                        return Err(ParseError::MissingName {
                            line: number,
                            keyword: keyword.to_string(),
                        });
                    }
                    if let Some(current) = materials.last_mut() {
                        current.diffuse_map = Some(path.to_string());
                    }
                }
                _ => {}
            }
        }

        Ok(Library { materials })
    }
}
