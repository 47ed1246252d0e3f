use rand::{Rng, distr::StandardUniform, prelude::Distribution};

/// Enum representing the type of piece.
///
/// The discriminants are fixed because they index the static geometry tables
/// and encode piece identity in learned-state indices and saved weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece.
    I = 0,
    /// O-piece.
    O = 1,
    /// T-piece.
    T = 2,
    /// J-piece.
    J = 3,
    /// L-piece.
    L = 4,
    /// Z-piece.
    Z = 5,
    /// S-piece.
    S = 6,
}

impl Distribution<PieceKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        match rng.random_range(0..=6) {
            0 => PieceKind::I,
            1 => PieceKind::O,
            2 => PieceKind::T,
            3 => PieceKind::J,
            4 => PieceKind::L,
            5 => PieceKind::Z,
            _ => PieceKind::S,
        }
    }
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    /// All piece kinds in discriminant order.
    pub const ALL: [PieceKind; PieceKind::LEN] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::J,
        PieceKind::L,
        PieceKind::Z,
        PieceKind::S,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(PieceKind::I),
            1 => Some(PieceKind::O),
            2 => Some(PieceKind::T),
            3 => Some(PieceKind::J),
            4 => Some(PieceKind::L),
            5 => Some(PieceKind::Z),
            6 => Some(PieceKind::S),
            _ => None,
        }
    }

    /// Returns the single character representation of this piece kind.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::T => 'T',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
            PieceKind::Z => 'Z',
            PieceKind::S => 'S',
        }
    }

    /// Side length of the square bounding box (4 for I, 2 for O, 3 otherwise).
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            PieceKind::I => 4,
            PieceKind::O => 2,
            _ => 3,
        }
    }
}

/// Rotation state of a piece.
///
/// Represents one of four rotation states:
///
/// - `0`: 0° (spawn orientation)
/// - `1`: 90° clockwise
/// - `2`: 180°
/// - `3`: 270° clockwise (90° counterclockwise)
///
/// Rotation operations wrap around modulo 4.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PieceRotation(u8);

impl PieceRotation {
    #[must_use]
    pub const fn new(index: u8) -> Self {
        PieceRotation(index % 4)
    }

    #[must_use]
    pub fn rotated_cw(self) -> Self {
        PieceRotation((self.0 + 1) % 4)
    }

    #[must_use]
    pub fn rotated_ccw(self) -> Self {
        PieceRotation((self.0 + 3) % 4)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Direction of a rotation, used to select wall-kick test offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

/// A piece type in a specific orientation.
///
/// Pieces carry no position; the board tracks where the active piece sits.
/// All geometry queries are table lookups.
///
/// # Coordinate System
///
/// Body offsets are relative to the lower-left corner of the piece's square
/// bounding box, with x increasing rightward and y increasing upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    kind: PieceKind,
    rotation: PieceRotation,
}

impl Piece {
    #[must_use]
    pub fn new(kind: PieceKind) -> Self {
        Self {
            kind,
            rotation: PieceRotation::default(),
        }
    }

    #[must_use]
    pub const fn with_rotation(kind: PieceKind, rotation: PieceRotation) -> Self {
        Self { kind, rotation }
    }

    #[must_use]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub fn rotation(&self) -> PieceRotation {
        self.rotation
    }

    /// Bounding box width (equal to the box side length).
    #[must_use]
    pub const fn width(&self) -> usize {
        self.kind.size()
    }

    /// Bounding box height (equal to the box side length).
    #[must_use]
    pub const fn height(&self) -> usize {
        self.kind.size()
    }

    /// The four occupied cell offsets within the bounding box.
    #[must_use]
    pub fn body(&self) -> &'static [(u8, u8); 4] {
        &PIECE_BODIES[self.kind.index()][self.rotation.index()]
    }

    /// Per-column lowest occupied y offset; `None` for empty columns.
    #[must_use]
    pub fn skirt(&self) -> &'static [Option<u8>] {
        &PIECE_SKIRTS[self.kind.index()][self.rotation.index()][..self.kind.size()]
    }

    #[must_use]
    pub fn rotated_cw(&self) -> Self {
        Self {
            kind: self.kind,
            rotation: self.rotation.rotated_cw(),
        }
    }

    #[must_use]
    pub fn rotated_ccw(&self) -> Self {
        Self {
            kind: self.kind,
            rotation: self.rotation.rotated_ccw(),
        }
    }

    /// Wall-kick test offsets for rotating out of the current orientation.
    ///
    /// The offsets follow the Super Rotation System: 5 tests for most
    /// pieces, an I-specific table, and the single identity test for O.
    /// Offsets are (dx, dy) with y increasing upward, applied to the anchor
    /// before re-checking validity.
    #[must_use]
    pub fn kick_offsets(&self, direction: RotationDirection) -> &'static [(i8, i8)] {
        match (self.kind, direction) {
            (PieceKind::O, _) => &O_KICKS,
            (PieceKind::I, RotationDirection::Clockwise) => &I_CW_KICKS[self.rotation.index()],
            (PieceKind::I, RotationDirection::CounterClockwise) => {
                &I_CCW_KICKS[self.rotation.index()]
            }
            (_, RotationDirection::Clockwise) => &NORMAL_CW_KICKS[self.rotation.index()],
            (_, RotationDirection::CounterClockwise) => &NORMAL_CCW_KICKS[self.rotation.index()],
        }
    }
}

type PieceBody = [(u8, u8); 4];
type PieceSkirt = [Option<u8>; 4];

const N: Option<u8> = None;

const fn s2(a: u8, b: u8) -> PieceSkirt {
    [Some(a), Some(b), N, N]
}

const fn s3(a: Option<u8>, b: Option<u8>, c: Option<u8>) -> PieceSkirt {
    [a, b, c, N]
}

/// Occupied offsets for every (kind, rotation), lower-left origin, y up.
const PIECE_BODIES: [[PieceBody; 4]; PieceKind::LEN] = [
    // I
    [
        [(0, 2), (1, 2), (2, 2), (3, 2)],
        [(2, 0), (2, 1), (2, 2), (2, 3)],
        [(0, 1), (1, 1), (2, 1), (3, 1)],
        [(1, 0), (1, 1), (1, 2), (1, 3)],
    ],
    // O
    [
        [(0, 0), (0, 1), (1, 0), (1, 1)],
        [(0, 0), (0, 1), (1, 0), (1, 1)],
        [(0, 0), (0, 1), (1, 0), (1, 1)],
        [(0, 0), (0, 1), (1, 0), (1, 1)],
    ],
    // T
    [
        [(0, 1), (1, 1), (2, 1), (1, 2)],
        [(1, 2), (1, 1), (2, 1), (1, 0)],
        [(0, 1), (1, 1), (2, 1), (1, 0)],
        [(0, 1), (1, 1), (1, 0), (1, 2)],
    ],
    // J
    [
        [(0, 1), (1, 1), (2, 1), (0, 2)],
        [(1, 0), (1, 1), (1, 2), (2, 2)],
        [(0, 1), (1, 1), (2, 1), (2, 0)],
        [(1, 0), (1, 1), (1, 2), (0, 0)],
    ],
    // L
    [
        [(0, 1), (1, 1), (2, 1), (2, 2)],
        [(1, 0), (1, 1), (1, 2), (2, 0)],
        [(0, 1), (1, 1), (2, 1), (0, 0)],
        [(1, 0), (1, 1), (1, 2), (0, 2)],
    ],
    // Z
    [
        [(0, 2), (1, 2), (1, 1), (2, 1)],
        [(1, 0), (2, 2), (1, 1), (2, 1)],
        [(0, 1), (1, 1), (1, 0), (2, 0)],
        [(0, 0), (1, 2), (0, 1), (1, 1)],
    ],
    // S
    [
        [(0, 1), (1, 1), (1, 2), (2, 2)],
        [(2, 0), (1, 1), (2, 1), (1, 2)],
        [(0, 0), (1, 0), (1, 1), (2, 1)],
        [(1, 0), (0, 1), (1, 1), (0, 2)],
    ],
];

/// Lowest occupied offset per bounding-box column for every (kind, rotation).
const PIECE_SKIRTS: [[PieceSkirt; 4]; PieceKind::LEN] = [
    // I
    [
        [Some(2), Some(2), Some(2), Some(2)],
        [N, N, Some(0), N],
        [Some(1), Some(1), Some(1), Some(1)],
        [N, Some(0), N, N],
    ],
    // O
    [s2(0, 0), s2(0, 0), s2(0, 0), s2(0, 0)],
    // T
    [
        s3(Some(1), Some(1), Some(1)),
        s3(N, Some(0), Some(1)),
        s3(Some(1), Some(0), Some(1)),
        s3(Some(1), Some(0), N),
    ],
    // J
    [
        s3(Some(1), Some(1), Some(1)),
        s3(N, Some(0), Some(2)),
        s3(Some(1), Some(1), Some(0)),
        s3(Some(0), Some(0), N),
    ],
    // L
    [
        s3(Some(1), Some(1), Some(1)),
        s3(N, Some(0), Some(0)),
        s3(Some(0), Some(1), Some(1)),
        s3(Some(2), Some(0), N),
    ],
    // Z
    [
        s3(Some(2), Some(1), Some(1)),
        s3(N, Some(0), Some(1)),
        s3(Some(1), Some(0), Some(0)),
        s3(Some(0), Some(1), N),
    ],
    // S
    [
        s3(Some(1), Some(1), Some(2)),
        s3(N, Some(1), Some(0)),
        s3(Some(0), Some(0), Some(1)),
        s3(Some(1), Some(0), N),
    ],
];

const O_KICKS: [(i8, i8); 1] = [(0, 0)];

/// SRS kick tests for J/L/S/T/Z, indexed by the rotation being left.
const NORMAL_CW_KICKS: [[(i8, i8); 5]; 4] = [
    [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)],
    [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],
    [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],
    [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],
];

const NORMAL_CCW_KICKS: [[(i8, i8); 5]; 4] = [
    [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],
    [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],
    [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)],
    [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],
];

/// SRS kick tests for the I piece, indexed by the rotation being left.
const I_CW_KICKS: [[(i8, i8); 5]; 4] = [
    [(0, 0), (-2, 0), (1, 0), (-2, -1), (1, 2)],
    [(0, 0), (-1, 0), (2, 0), (-1, 2), (2, -1)],
    [(0, 0), (2, 0), (-1, 0), (2, 1), (-1, -2)],
    [(0, 0), (1, 0), (-2, 0), (1, -2), (-2, 1)],
];

const I_CCW_KICKS: [[(i8, i8); 5]; 4] = [
    [(0, 0), (-1, 0), (2, 0), (-1, 2), (2, -1)],
    [(0, 0), (2, 0), (-1, 0), (2, 1), (-1, -2)],
    [(0, 0), (1, 0), (-2, 0), (1, -2), (-2, 1)],
    [(0, 0), (-2, 0), (1, 0), (-2, -1), (1, 2)],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_matches_skirt() {
        for kind in PieceKind::ALL {
            for r in 0..4 {
                let piece = Piece::with_rotation(kind, PieceRotation::new(r));
                let skirt = piece.skirt();
                assert_eq!(skirt.len(), piece.width());
                for (col, lowest) in skirt.iter().enumerate() {
                    let column_cells: Vec<u8> = piece
                        .body()
                        .iter()
                        .filter(|(x, _)| usize::from(*x) == col)
                        .map(|(_, y)| *y)
                        .collect();
                    match lowest {
                        Some(y) => assert_eq!(column_cells.iter().min(), Some(y)),
                        None => assert!(column_cells.is_empty()),
                    }
                }
            }
        }
    }

    #[test]
    fn bodies_have_four_distinct_cells_in_box() {
        for kind in PieceKind::ALL {
            for r in 0..4 {
                let piece = Piece::with_rotation(kind, PieceRotation::new(r));
                let body = piece.body();
                for (x, y) in body {
                    assert!(usize::from(*x) < kind.size());
                    assert!(usize::from(*y) < kind.size());
                }
                for i in 0..4 {
                    for j in (i + 1)..4 {
                        assert_ne!(body[i], body[j]);
                    }
                }
            }
        }
    }

    #[test]
    fn rotation_wraps_modulo_four() {
        let piece = Piece::new(PieceKind::T);
        assert_eq!(piece.rotated_cw().rotation().index(), 1);
        assert_eq!(piece.rotated_ccw().rotation().index(), 3);
        assert_eq!(
            piece
                .rotated_cw()
                .rotated_cw()
                .rotated_cw()
                .rotated_cw()
                .rotation(),
            piece.rotation()
        );
    }

    #[test]
    fn o_piece_has_single_kick_test() {
        let piece = Piece::new(PieceKind::O);
        assert_eq!(piece.kick_offsets(RotationDirection::Clockwise), &[(0, 0)]);
        assert_eq!(
            piece.kick_offsets(RotationDirection::CounterClockwise),
            &[(0, 0)]
        );
    }

    #[test]
    fn kick_tables_start_with_identity() {
        for kind in PieceKind::ALL {
            for r in 0..4 {
                let piece = Piece::with_rotation(kind, PieceRotation::new(r));
                for direction in [
                    RotationDirection::Clockwise,
                    RotationDirection::CounterClockwise,
                ] {
                    assert_eq!(piece.kick_offsets(direction)[0], (0, 0));
                }
            }
        }
    }

    #[test]
    fn uniform_sampling_covers_all_kinds() {
        use rand::SeedableRng as _;

        let mut rng = rand_pcg::Pcg32::seed_from_u64(7);
        let mut seen = [false; PieceKind::LEN];
        for _ in 0..1000 {
            let kind: PieceKind = rng.random();
            seen[kind.index()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
