//! Board topology: three concentric rings, square lookup, movement rules.
//!
//! Middle and outer rings are circular. The inner ring is a reflecting
//! "Z-path" over positions 1..=9; direction is carried explicitly alongside
//! the position instead of being guessed from it on every move.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lowest walkable inner-ring position. Position 0 is an unused placeholder
/// and gets coerced here before walking.
pub const INNER_LOW: usize = 1;
/// Highest walkable inner-ring position; the walk reflects here.
pub const INNER_HIGH: usize = 9;
/// Inner-ring "star" cell: transitioning from here lets the player pick any
/// middle-ring position.
pub const GATEWAY_POSITION: usize = 5;

const DEFAULT_INNER_SIZE: usize = 10;
const DEFAULT_MIDDLE_SIZE: usize = 24;
const DEFAULT_OUTER_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Ring {
    Inner,
    #[default]
    Middle,
    Outer,
}

impl Ring {
    pub const ALL: [Self; 3] = [Self::Inner, Self::Middle, Self::Outer];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "inner",
            Self::Middle => "middle",
            Self::Outer => "outer",
        }
    }
}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ring {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inner" => Ok(Self::Inner),
            "middle" => Ok(Self::Middle),
            "outer" => Ok(Self::Outer),
            _ => Err(()),
        }
    }
}

/// Travel direction on the inner ring. Circular rings always move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SquareKind {
    Start,
    Paycheck,
    Opportunity,
    Doodad,
    Market,
    Charity,
    Downsized,
    Baby,
    RingTransition,
}

impl SquareKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Paycheck => "paycheck",
            Self::Opportunity => "opportunity",
            Self::Doodad => "doodad",
            Self::Market => "market",
            Self::Charity => "charity",
            Self::Downsized => "downsized",
            Self::Baby => "baby",
            Self::RingTransition => "ring_transition",
        }
    }
}

impl fmt::Display for SquareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed per-square parameters with a catch-all map for extension fields
/// supplied by board data files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquareParams {
    /// Ring a transition square sends the player to.
    #[serde(default)]
    pub transition_target: Option<Ring>,
    /// Scale applied to the drawn doodad amount.
    #[serde(default = "SquareParams::default_multiplier")]
    pub doodad_multiplier: f64,
    #[serde(flatten)]
    pub extras: HashMap<String, serde_json::Value>,
}

impl SquareParams {
    const fn default_multiplier() -> f64 {
        1.0
    }
}

impl Default for SquareParams {
    fn default() -> Self {
        Self {
            transition_target: None,
            doodad_multiplier: Self::default_multiplier(),
            extras: HashMap::new(),
        }
    }
}

/// A single addressable board cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Square {
    pub position: usize,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SquareKind,
    #[serde(default)]
    pub params: SquareParams,
}

impl Square {
    #[must_use]
    pub fn new(position: usize, name: &str, kind: SquareKind) -> Self {
        Self {
            position,
            name: name.to_string(),
            kind,
            params: SquareParams::default(),
        }
    }

    #[must_use]
    fn transition_to(position: usize, name: &str, target: Ring) -> Self {
        let mut square = Self::new(position, name, SquareKind::RingTransition);
        square.params.transition_target = Some(target);
        square
    }
}

/// Square list and size for one ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingLayout {
    pub size: usize,
    pub squares: Vec<Square>,
}

impl RingLayout {
    fn from_kinds(kinds: &[(usize, &str, SquareKind)], size: usize) -> Self {
        let squares = kinds
            .iter()
            .map(|(position, name, kind)| Square::new(*position, name, *kind))
            .collect();
        Self { size, squares }
    }

    fn with_transitions(mut self, transitions: &[(usize, &str, Ring)]) -> Self {
        for (position, name, target) in transitions {
            self.squares
                .push(Square::transition_to(*position, name, *target));
        }
        self.squares.sort_by_key(|square| square.position);
        self
    }
}

/// Per-ring board description as supplied by a board data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub inner: RingLayout,
    pub middle: RingLayout,
    pub outer: RingLayout,
}

impl BoardConfig {
    /// The documented fallback layout (ring sizes 10/24/32).
    #[must_use]
    pub fn default_layout() -> Self {
        Self {
            inner: default_inner_layout(),
            middle: default_middle_layout(),
            outer: default_outer_layout(),
        }
    }

    /// Load a board description from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a board layout.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub const fn layout(&self, ring: Ring) -> &RingLayout {
        match ring {
            Ring::Inner => &self.inner,
            Ring::Middle => &self.middle,
            Ring::Outer => &self.outer,
        }
    }

    /// Validate layout invariants.
    ///
    /// # Errors
    ///
    /// Returns `BoardError` when a ring is empty or a square sits outside
    /// its ring or collides with another.
    pub fn validate(&self) -> Result<(), BoardError> {
        for ring in Ring::ALL {
            let layout = self.layout(ring);
            if layout.size == 0 {
                return Err(BoardError::EmptyRing { ring });
            }
            let mut seen = vec![false; layout.size];
            for square in &layout.squares {
                if square.position >= layout.size {
                    return Err(BoardError::PositionOutOfRange {
                        ring,
                        position: square.position,
                        size: layout.size,
                    });
                }
                if seen[square.position] {
                    return Err(BoardError::DuplicatePosition {
                        ring,
                        position: square.position,
                    });
                }
                seen[square.position] = true;
            }
        }
        Ok(())
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::default_layout()
    }
}

/// Errors raised when board layout invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("{ring} ring has no squares")]
    EmptyRing { ring: Ring },
    #[error("{ring} ring square at {position} exceeds ring size {size}")]
    PositionOutOfRange {
        ring: Ring,
        position: usize,
        size: usize,
    },
    #[error("{ring} ring declares position {position} twice")]
    DuplicatePosition { ring: Ring, position: usize },
}

fn default_middle_layout() -> RingLayout {
    RingLayout::from_kinds(
        &[
            (0, "Start", SquareKind::Start),
            (1, "Paycheck", SquareKind::Paycheck),
            (2, "Opportunity", SquareKind::Opportunity),
            (3, "Doodad", SquareKind::Doodad),
            (4, "Opportunity", SquareKind::Opportunity),
            (5, "Market", SquareKind::Market),
            (7, "Charity", SquareKind::Charity),
            (8, "Opportunity", SquareKind::Opportunity),
            (9, "Doodad", SquareKind::Doodad),
            (10, "Opportunity", SquareKind::Opportunity),
            (11, "Downsized", SquareKind::Downsized),
            (12, "Paycheck", SquareKind::Paycheck),
            (13, "Opportunity", SquareKind::Opportunity),
            (14, "Baby", SquareKind::Baby),
            (15, "Opportunity", SquareKind::Opportunity),
            (16, "Doodad", SquareKind::Doodad),
            (17, "Market", SquareKind::Market),
            (19, "Opportunity", SquareKind::Opportunity),
            (20, "Charity", SquareKind::Charity),
            (21, "Opportunity", SquareKind::Opportunity),
            (22, "Doodad", SquareKind::Doodad),
            (23, "Opportunity", SquareKind::Opportunity),
        ],
        DEFAULT_MIDDLE_SIZE,
    )
    .with_transitions(&[
        (6, "Inner gateway", Ring::Inner),
        (18, "Inner gateway", Ring::Inner),
    ])
}

fn default_inner_layout() -> RingLayout {
    RingLayout::from_kinds(
        &[
            (0, "Unused", SquareKind::Start),
            (2, "Paycheck", SquareKind::Paycheck),
            (3, "Opportunity", SquareKind::Opportunity),
            (4, "Doodad", SquareKind::Doodad),
            (6, "Opportunity", SquareKind::Opportunity),
            (7, "Charity", SquareKind::Charity),
            (8, "Paycheck", SquareKind::Paycheck),
        ],
        DEFAULT_INNER_SIZE,
    )
    .with_transitions(&[
        (1, "Middle gateway", Ring::Middle),
        (GATEWAY_POSITION, "Star gateway", Ring::Middle),
        (9, "Middle gateway", Ring::Middle),
    ])
}

fn default_outer_layout() -> RingLayout {
    RingLayout::from_kinds(
        &[
            (0, "Start", SquareKind::Start),
            (1, "Opportunity", SquareKind::Opportunity),
            (2, "Doodad", SquareKind::Doodad),
            (3, "Opportunity", SquareKind::Opportunity),
            (4, "Paycheck", SquareKind::Paycheck),
            (5, "Market", SquareKind::Market),
            (6, "Opportunity", SquareKind::Opportunity),
            (7, "Charity", SquareKind::Charity),
            (8, "Opportunity", SquareKind::Opportunity),
            (9, "Doodad", SquareKind::Doodad),
            (10, "Opportunity", SquareKind::Opportunity),
            (11, "Downsized", SquareKind::Downsized),
            (12, "Paycheck", SquareKind::Paycheck),
            (13, "Opportunity", SquareKind::Opportunity),
            (14, "Baby", SquareKind::Baby),
            (15, "Opportunity", SquareKind::Opportunity),
            (17, "Market", SquareKind::Market),
            (18, "Doodad", SquareKind::Doodad),
            (19, "Opportunity", SquareKind::Opportunity),
            (20, "Paycheck", SquareKind::Paycheck),
            (21, "Opportunity", SquareKind::Opportunity),
            (22, "Charity", SquareKind::Charity),
            (23, "Doodad", SquareKind::Doodad),
            (24, "Opportunity", SquareKind::Opportunity),
            (25, "Baby", SquareKind::Baby),
            (26, "Opportunity", SquareKind::Opportunity),
            (27, "Doodad", SquareKind::Doodad),
            (28, "Paycheck", SquareKind::Paycheck),
            (29, "Opportunity", SquareKind::Opportunity),
            (30, "Downsized", SquareKind::Downsized),
            (31, "Opportunity", SquareKind::Opportunity),
        ],
        DEFAULT_OUTER_SIZE,
    )
    .with_transitions(&[(16, "Middle gateway", Ring::Middle)])
}

/// Lookup and movement over a validated board layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    config: BoardConfig,
}

impl Board {
    #[must_use]
    pub const fn new(config: BoardConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn default_board() -> Self {
        Self::new(BoardConfig::default_layout())
    }

    #[must_use]
    pub const fn config(&self) -> &BoardConfig {
        &self.config
    }

    #[must_use]
    pub const fn ring_size(&self, ring: Ring) -> usize {
        self.config.layout(ring).size
    }

    /// Bounds-checked square lookup. Positions without a declared square
    /// (and out-of-range positions) return `None`.
    #[must_use]
    pub fn square(&self, position: usize, ring: Ring) -> Option<&Square> {
        let layout = self.config.layout(ring);
        if position >= layout.size {
            return None;
        }
        layout
            .squares
            .iter()
            .find(|square| square.position == position)
    }

    /// Advance a walker by `steps`, returning the new position and the
    /// direction it will travel next.
    #[must_use]
    pub fn advance(
        &self,
        position: usize,
        steps: u32,
        ring: Ring,
        direction: Direction,
    ) -> (usize, Direction) {
        match ring {
            Ring::Middle | Ring::Outer => {
                let size = self.ring_size(ring);
                ((position + steps as usize) % size, Direction::Forward)
            }
            Ring::Inner => advance_inner(position, steps, direction),
        }
    }

    /// Whether this cell is the inner-ring star allowing a free choice of
    /// middle-ring destination.
    #[must_use]
    pub fn is_gateway(&self, ring: Ring, position: usize) -> bool {
        ring == Ring::Inner && position == GATEWAY_POSITION
    }

    /// Fixed cross-ring remapping. Known pairs: middle-18 <-> inner-1 and
    /// middle-6 <-> inner-9; anything else lands on the target ring's
    /// default entry cell.
    #[must_use]
    pub fn transition_position(&self, from: Ring, position: usize, target: Ring) -> usize {
        match (from, target) {
            (Ring::Middle, Ring::Inner) => match position {
                18 => 1,
                6 => 9,
                _ => INNER_LOW,
            },
            (Ring::Inner, Ring::Middle) => match position {
                1 => 18,
                9 => 6,
                _ => 0,
            },
            (_, Ring::Inner) => INNER_LOW,
            _ => 0,
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::default_board()
    }
}

/// Direction a walker travels when it first lands on a ring. Entering the
/// inner ring at the top boundary means the walker is already reversing.
#[must_use]
pub const fn entry_direction(ring: Ring, position: usize) -> Direction {
    match ring {
        Ring::Inner if position >= INNER_HIGH => Direction::Backward,
        _ => Direction::Forward,
    }
}

fn advance_inner(position: usize, steps: u32, direction: Direction) -> (usize, Direction) {
    let mut position = position.clamp(INNER_LOW, INNER_HIGH);
    // A walker sitting on the top boundary can only be reversing.
    let mut direction = if position == INNER_HIGH {
        Direction::Backward
    } else {
        direction
    };
    for _ in 0..steps {
        match direction {
            Direction::Forward => {
                position += 1;
                if position == INNER_HIGH {
                    direction = Direction::Backward;
                }
            }
            Direction::Backward => {
                position -= 1;
                if position == INNER_LOW {
                    direction = Direction::Forward;
                }
            }
        }
    }
    (position, direction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_has_documented_sizes() {
        let config = BoardConfig::default_layout();
        assert!(config.validate().is_ok());
        assert_eq!(config.inner.size, 10);
        assert_eq!(config.middle.size, 24);
        assert_eq!(config.outer.size, 32);
    }

    #[test]
    fn lookup_is_bounds_checked() {
        let board = Board::default_board();
        assert!(board.square(0, Ring::Middle).is_some());
        assert!(board.square(24, Ring::Middle).is_none());
        assert_eq!(
            board.square(5, Ring::Middle).map(|s| s.kind),
            Some(SquareKind::Market)
        );
        assert_eq!(
            board.square(GATEWAY_POSITION, Ring::Inner).map(|s| s.kind),
            Some(SquareKind::RingTransition)
        );
    }

    #[test]
    fn circular_advance_composes() {
        let board = Board::default_board();
        for (s1, s2) in [(3, 5), (20, 9), (0, 6), (23, 23)] {
            let (direct, _) = board.advance(7, s1 + s2, Ring::Middle, Direction::Forward);
            let (first, dir) = board.advance(7, s1, Ring::Middle, Direction::Forward);
            let (chained, _) = board.advance(first, s2, Ring::Middle, dir);
            assert_eq!(direct, chained);
        }
        let (wrapped, _) = board.advance(30, 5, Ring::Outer, Direction::Forward);
        assert_eq!(wrapped, 3);
    }

    #[test]
    fn inner_walk_reflects_at_boundaries() {
        let board = Board::default_board();
        // 9 -> 8 -> 7 -> 6, reversing from the top boundary.
        let (position, direction) = board.advance(9, 3, Ring::Inner, Direction::Backward);
        assert_eq!(position, 6);
        assert_eq!(direction, Direction::Backward);

        // 7 -> 8 -> 9 -> 8: one reflection at the top.
        let (position, direction) = board.advance(7, 3, Ring::Inner, Direction::Forward);
        assert_eq!(position, 8);
        assert_eq!(direction, Direction::Backward);

        // 2 -> 1 -> 2 -> 3: one reflection at the bottom.
        let (position, direction) = board.advance(2, 3, Ring::Inner, Direction::Backward);
        assert_eq!(position, 3);
        assert_eq!(direction, Direction::Forward);

        // Placeholder position 0 is coerced to 1 before walking.
        let (position, _) = board.advance(0, 2, Ring::Inner, Direction::Forward);
        assert_eq!(position, 3);
    }

    #[test]
    fn inner_walk_round_trips_away_from_boundaries() {
        let board = Board::default_board();
        let (forward, dir) = board.advance(3, 2, Ring::Inner, Direction::Forward);
        assert_eq!(forward, 5);
        let (back, _) = board.advance(forward, 2, Ring::Inner, flip(dir));
        assert_eq!(back, 3);
    }

    #[test]
    fn transition_table_matches_fixed_pairs() {
        let board = Board::default_board();
        assert_eq!(board.transition_position(Ring::Middle, 18, Ring::Inner), 1);
        assert_eq!(board.transition_position(Ring::Middle, 6, Ring::Inner), 9);
        assert_eq!(board.transition_position(Ring::Inner, 1, Ring::Middle), 18);
        assert_eq!(board.transition_position(Ring::Inner, 9, Ring::Middle), 6);
        // Unlisted positions fall back to the target ring's entry cell.
        assert_eq!(board.transition_position(Ring::Middle, 3, Ring::Inner), 1);
        assert_eq!(board.transition_position(Ring::Outer, 16, Ring::Middle), 0);
        assert!(board.is_gateway(Ring::Inner, GATEWAY_POSITION));
        assert!(!board.is_gateway(Ring::Middle, GATEWAY_POSITION));
    }

    #[test]
    fn entry_direction_defaults_forward_except_top_boundary() {
        assert_eq!(entry_direction(Ring::Inner, 1), Direction::Forward);
        assert_eq!(entry_direction(Ring::Inner, 9), Direction::Backward);
        assert_eq!(entry_direction(Ring::Middle, 18), Direction::Forward);
    }

    #[test]
    fn config_json_round_trip_keeps_extras() {
        let json = r#"{
            "inner": {"size": 10, "squares": [
                {"position": 1, "name": "Gate", "type": "ring_transition",
                 "params": {"transition_target": "middle", "artwork": "gate.png"}}
            ]},
            "middle": {"size": 24, "squares": [
                {"position": 0, "name": "Start", "type": "start"}
            ]},
            "outer": {"size": 32, "squares": []}
        }"#;
        let config = BoardConfig::from_json(json).unwrap();
        assert!(config.validate().is_ok());
        let gate = &config.inner.squares[0];
        assert_eq!(gate.params.transition_target, Some(Ring::Middle));
        assert!(gate.params.extras.contains_key("artwork"));
    }

    #[test]
    fn validation_flags_bad_layouts() {
        let mut config = BoardConfig::default_layout();
        config.middle.squares.push(Square::new(0, "Dup", SquareKind::Start));
        assert_eq!(
            config.validate(),
            Err(BoardError::DuplicatePosition {
                ring: Ring::Middle,
                position: 0
            })
        );

        let mut config = BoardConfig::default_layout();
        config.outer.squares.push(Square::new(40, "Far", SquareKind::Doodad));
        assert!(matches!(
            config.validate(),
            Err(BoardError::PositionOutOfRange { .. })
        ));
    }

    const fn flip(direction: Direction) -> Direction {
        match direction {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}
