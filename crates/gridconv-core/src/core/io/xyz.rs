use crate::core::io::traits::StructureFile;
use crate::core::models::structure::{Atom, Cell, Structure};
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: XyzParseErrorKind },
    #[error("Header declares {declared} atoms but {found} coordinate lines were read")]
    AtomCountMismatch { declared: usize, found: usize },
}

#[derive(Debug, Error)]
pub enum XyzParseErrorKind {
    #[error("Missing atom count header")]
    MissingHeader,
    #[error("Invalid atom count '{0}'")]
    InvalidAtomCount(String),
    #[error("Expected 'symbol x y z', found {0} fields")]
    TooFewFields(usize),
    #[error("Invalid coordinate '{0}'")]
    InvalidCoordinate(String),
    #[error("Lattice must contain 9 numbers")]
    InvalidLattice,
}

/// Extended XYZ reader/writer.
///
/// Only the `Lattice="..."` key of the comment line is interpreted; everything else on
/// that line is ignored.
pub struct XyzFile;

impl XyzFile {
    fn parse_lattice(comment: &str, line: usize) -> Result<Option<Cell>, XyzError> {
        let Some(start) = comment.find("Lattice=\"") else {
            return Ok(None);
        };
        let rest = &comment[start + "Lattice=\"".len()..];
        let end = rest.find('"').ok_or(XyzError::Parse {
            line,
            kind: XyzParseErrorKind::InvalidLattice,
        })?;
        let values: Vec<f64> = rest[..end]
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map_err(|_| XyzError::Parse {
                line,
                kind: XyzParseErrorKind::InvalidLattice,
            })?;
        let flat: [f64; 9] = values.try_into().map_err(|_| XyzError::Parse {
            line,
            kind: XyzParseErrorKind::InvalidLattice,
        })?;
        Ok(Some(Cell::from_flat(flat)))
    }

    fn parse_atom(line: &str, line_num: usize) -> Result<Atom, XyzError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(XyzError::Parse {
                line: line_num,
                kind: XyzParseErrorKind::TooFewFields(fields.len()),
            });
        }
        let mut coords = [0.0; 3];
        for (slot, raw) in coords.iter_mut().zip(&fields[1..4]) {
            *slot = raw.parse().map_err(|_| XyzError::Parse {
                line: line_num,
                kind: XyzParseErrorKind::InvalidCoordinate(raw.to_string()),
            })?;
        }
        Ok(Atom::new(
            fields[0],
            Point3::new(coords[0], coords[1], coords[2]),
        ))
    }
}

impl StructureFile for XyzFile {
    type Error = XyzError;

    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error> {
        let mut lines = reader.lines();

        let header = lines.next().transpose()?.ok_or(XyzError::Parse {
            line: 1,
            kind: XyzParseErrorKind::MissingHeader,
        })?;
        let declared: usize = header.trim().parse().map_err(|_| XyzError::Parse {
            line: 1,
            kind: XyzParseErrorKind::InvalidAtomCount(header.trim().to_string()),
        })?;

        let comment = lines.next().transpose()?.unwrap_or_default();
        let cell = Self::parse_lattice(&comment, 2)?;

        let mut atoms = Vec::with_capacity(declared);
        for (idx, line_res) in lines.enumerate() {
            let line = line_res?;
            if line.trim().is_empty() {
                continue;
            }
            atoms.push(Self::parse_atom(&line, idx + 3)?);
        }

        if atoms.len() != declared {
            return Err(XyzError::AtomCountMismatch {
                declared,
                found: atoms.len(),
            });
        }

        Ok(Structure::new(atoms, cell))
    }

    fn write_to(structure: &Structure, writer: &mut impl Write) -> Result<(), Self::Error> {
        writeln!(writer, "{}", structure.atom_count())?;
        match structure.cell() {
            Some(cell) => writeln!(
                writer,
                "Lattice=\"{} {} {} {} {} {} {} {} {}\"",
                cell.a.x, cell.a.y, cell.a.z, cell.b.x, cell.b.y, cell.b.z, cell.c.x, cell.c.y,
                cell.c.z
            )?,
            None => writeln!(writer)?,
        }
        for atom in structure.atoms() {
            writeln!(
                writer,
                "{:<3} {:>15.8} {:>15.8} {:>15.8}",
                atom.element, atom.position.x, atom.position.y, atom.position.z
            )?;
        }
        Ok(())
    }
}
