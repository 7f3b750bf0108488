use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn euclidean(self, other: Position) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        dx.hypot(dy)
    }

    pub fn step(self, dir: Direction) -> Position {
        self.offset(dir, 1)
    }

    pub fn offset(self, dir: Direction, distance: i32) -> Position {
        let (dx, dy) = dir.delta();
        Position::new(self.x + dx * distance, self.y + dy * distance)
    }

    pub fn in_bounds(self, grid_size: i32) -> bool {
        self.x >= 0 && self.y >= 0 && self.x < grid_size && self.y < grid_size
    }

    /// Up, down, left, right.
    pub fn neighbors(self) -> [Position; 4] {
        Direction::ALL.map(|dir| self.step(dir))
    }

    /// Every cell of the `(2r+1)^2` square around `self`, the centre excluded.
    pub fn surrounding(self, radius: i32) -> Vec<Position> {
        let mut cells = Vec::new();
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                if dx == 0 && dy == 0 {
                    continue;
                }
                cells.push(Position::new(self.x + dx, self.y + dy));
            }
        }
        cells
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_opposite(self, other: Direction) -> bool {
        self.opposite() == other
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodType {
    Normal,
    Speed,
    Super,
    Mine,
    Magnet,
}

impl FoodType {
    /// Draw order for the weighted type selection.
    pub const ALL: [FoodType; 5] = [
        FoodType::Normal,
        FoodType::Speed,
        FoodType::Super,
        FoodType::Mine,
        FoodType::Magnet,
    ];

    pub fn is_hazard(self) -> bool {
        self == FoodType::Mine
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Speed,
    Magnet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    #[serde(rename = "wall")]
    Wall,
    #[serde(rename = "self")]
    SelfCollision,
    #[serde(rename = "headToHead")]
    HeadToHead,
    #[serde(rename = "other")]
    OtherBody,
    #[serde(rename = "mine")]
    Mine,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "easy" => Some(Self::Easy),
            "normal" => Some(Self::Normal),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    TwoPlayer,
    VersusAi,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Ready,
    Playing,
    Paused,
    Over,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameOutcome {
    /// `None` when the top score is shared.
    pub winner: Option<usize>,
    pub scores: Vec<u64>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    FoodEaten {
        agent: usize,
        #[serde(rename = "foodType")]
        food_type: FoodType,
        at: Position,
        magnet: bool,
    },
    AgentDied {
        agent: usize,
        cause: DeathCause,
        at: Position,
    },
    AgentRespawned {
        agent: usize,
        at: Position,
        direction: Direction,
        forced: bool,
    },
    EffectApplied {
        agent: usize,
        effect: EffectKind,
        #[serde(rename = "expiresAtMs")]
        expires_at_ms: u64,
    },
    EffectExpired {
        agent: usize,
        effect: EffectKind,
    },
    FoodSpawned {
        count: usize,
    },
    LeadLost {
        agent: usize,
    },
    GameOver {
        winner: Option<usize>,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct EffectView {
    pub kind: EffectKind,
    #[serde(rename = "remainingMs")]
    pub remaining_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct AgentView {
    pub index: usize,
    pub name: String,
    pub ai: bool,
    pub alive: bool,
    pub direction: Direction,
    pub body: Vec<Position>,
    pub length: usize,
    pub score: u64,
    #[serde(rename = "foodEaten")]
    pub food_eaten: u32,
    #[serde(rename = "speedMultiplier")]
    pub speed_multiplier: f64,
    pub effects: Vec<EffectView>,
    #[serde(rename = "respawnInMs")]
    pub respawn_in_ms: Option<u64>,
    /// Where the agent last died, for the countdown marker while it waits.
    #[serde(rename = "lastDeathAt")]
    pub last_death_at: Option<Position>,
}

#[derive(Clone, Debug, Serialize)]
pub struct FoodView {
    pub id: u64,
    #[serde(rename = "foodType")]
    pub food_type: FoodType,
    pub at: Position,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    pub state: GameState,
    #[serde(rename = "timeRemainingS")]
    pub time_remaining_s: u32,
    #[serde(rename = "gridSize")]
    pub grid_size: i32,
    pub agents: Vec<AgentView>,
    pub foods: Vec<FoodView>,
    pub outcome: Option<GameOutcome>,
    pub events: Vec<RuntimeEvent>,
}
