use nalgebra::{Point3, Vector3};

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: String,
    pub position: Point3<f64>,
}

impl Atom {
    pub fn new(element: impl Into<String>, position: Point3<f64>) -> Self {
        Self {
            element: element.into(),
            position,
        }
    }
}

/// Simulation cell given by its three lattice vectors, in angstrom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub a: Vector3<f64>,
    pub b: Vector3<f64>,
    pub c: Vector3<f64>,
}

impl Cell {
    pub fn new(a: Vector3<f64>, b: Vector3<f64>, c: Vector3<f64>) -> Self {
        Self { a, b, c }
    }

    pub fn cubic(length: f64) -> Self {
        Self {
            a: Vector3::new(length, 0.0, 0.0),
            b: Vector3::new(0.0, length, 0.0),
            c: Vector3::new(0.0, 0.0, length),
        }
    }

    pub fn from_flat(values: [f64; 9]) -> Self {
        Self {
            a: Vector3::new(values[0], values[1], values[2]),
            b: Vector3::new(values[3], values[4], values[5]),
            c: Vector3::new(values[6], values[7], values[8]),
        }
    }

    pub fn volume(&self) -> f64 {
        self.a.dot(&self.b.cross(&self.c)).abs()
    }
}

/// Atomic positions plus an optional periodic cell.
///
/// The sweep treats this as opaque input; it is only used to bind geometry into the
/// engine once and to provide a fallback atom count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Structure {
    atoms: Vec<Atom>,
    cell: Option<Cell>,
}

impl Structure {
    pub fn new(atoms: Vec<Atom>, cell: Option<Cell>) -> Self {
        Self { atoms, cell }
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn cell(&self) -> Option<&Cell> {
        self.cell.as_ref()
    }

    pub fn with_cell(mut self, cell: Cell) -> Self {
        self.cell = Some(cell);
        self
    }
}
