use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Number of days in a chart week (0 = Monday ... 6 = Sunday)
pub const DAYS_PER_WEEK: usize = 7;
/// Number of time-of-day slots per day (morning, afternoon, evening)
pub const SLOTS_PER_DAY: usize = 3;

/// State of a single time slot on the chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    #[default]
    Empty,
    Star,
    Cross,
}

impl SlotState {
    /// The state a slot moves to when it is tapped: Empty -> Star -> Cross -> Empty
    pub fn next(self) -> Self {
        match self {
            SlotState::Empty => SlotState::Star,
            SlotState::Star => SlotState::Cross,
            SlotState::Cross => SlotState::Empty,
        }
    }

    pub fn is_star(self) -> bool {
        self == SlotState::Star
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotState::Empty => write!(f, "empty"),
            SlotState::Star => write!(f, "star"),
            SlotState::Cross => write!(f, "cross"),
        }
    }
}

/// The three slots of one day: morning, afternoon, evening
pub type DayState = [SlotState; SLOTS_PER_DAY];

/// One child's chart for a single ISO week
///
/// `data` only holds days that have been materialized; any other day
/// reads as all-empty through [`ChartWeek::day`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChartWeek {
    /// Composite key: "<child_id>:<iso_year>-W<week>", e.g. "child-123:2024-W34"
    pub id: String,
    pub data: BTreeMap<u8, DayState>,
}

impl ChartWeek {
    /// Build the storage key for a child's week. Weeks are zero-padded to two digits.
    pub fn generate_id(child_id: &str, year: i32, week: u32) -> String {
        format!("{}:{}-W{:02}", child_id, year, week)
    }

    /// A fully materialized week with every slot empty
    pub fn empty(id: impl Into<String>) -> Self {
        let data = (0..DAYS_PER_WEEK as u8)
            .map(|day| (day, [SlotState::Empty; SLOTS_PER_DAY]))
            .collect();
        Self { id: id.into(), data }
    }

    /// Slots for a day, defaulting to all-empty when the day was never written
    pub fn day(&self, day_index: usize) -> DayState {
        u8::try_from(day_index)
            .ok()
            .and_then(|day| self.data.get(&day).copied())
            .unwrap_or([SlotState::Empty; SLOTS_PER_DAY])
    }
}

/// Reward currency a prize target is measured in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrizeTargetType {
    Stars,
    Days,
    Weeks,
}

impl fmt::Display for PrizeTargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrizeTargetType::Stars => write!(f, "stars"),
            PrizeTargetType::Days => write!(f, "days"),
            PrizeTargetType::Weeks => write!(f, "weeks"),
        }
    }
}

/// A parent-defined goal that is achieved once enough unspent currency accumulates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrizeTarget {
    pub id: String,
    pub child_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub target_type: PrizeTargetType,
    pub target_count: u32,
    pub is_achieved: bool,
    /// Epoch milliseconds at which the target was achieved
    pub achieved_at: Option<i64>,
    /// Insertion sequence; lower values are funded first
    pub sequence: u64,
}

/// Which perfect-state event earns a redeemable prize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrizeMode {
    Daily,
    #[default]
    Weekly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundPattern {
    #[default]
    Confetti,
    Rainbow,
    Meadow,
    Ocean,
}

/// A child profile together with its reward ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: String,
    pub parent_id: String,
    pub name: String,
    pub prize_count: u32,
    pub prize_mode: PrizeMode,
    pub prize_targets: Vec<PrizeTarget>,
    pub total_stars: u32,
    pub total_perfect_days: u32,
    pub total_perfect_weeks: u32,
    pub spent_stars: u32,
    pub spent_perfect_days: u32,
    pub spent_perfect_weeks: u32,
    pub background_pattern: BackgroundPattern,
    /// Sequence number handed to the next prize target
    pub next_target_sequence: u64,
    /// RFC 3339 timestamp
    pub created_at: String,
    /// RFC 3339 timestamp
    pub updated_at: String,
}

impl Default for Child {
    fn default() -> Self {
        Self {
            id: String::new(),
            parent_id: String::new(),
            name: "My Child".to_string(),
            prize_count: 0,
            prize_mode: PrizeMode::default(),
            prize_targets: Vec::new(),
            total_stars: 0,
            total_perfect_days: 0,
            total_perfect_weeks: 0,
            spent_stars: 0,
            spent_perfect_days: 0,
            spent_perfect_weeks: 0,
            background_pattern: BackgroundPattern::default(),
            next_target_sequence: 0,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }
}

impl Child {
    /// Cumulative total for a currency
    pub fn total_for(&self, target_type: PrizeTargetType) -> u32 {
        match target_type {
            PrizeTargetType::Stars => self.total_stars,
            PrizeTargetType::Days => self.total_perfect_days,
            PrizeTargetType::Weeks => self.total_perfect_weeks,
        }
    }

    /// Amount of a currency already consumed by achieved targets
    pub fn spent_for(&self, target_type: PrizeTargetType) -> u32 {
        match target_type {
            PrizeTargetType::Stars => self.spent_stars,
            PrizeTargetType::Days => self.spent_perfect_days,
            PrizeTargetType::Weeks => self.spent_perfect_weeks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateChildRequest {
    pub parent_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildListResponse {
    pub children: Vec<Child>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteChildQuery {
    pub parent_id: String,
}

/// Body of a slot update; `state` may be omitted to advance the slot one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateSlotRequest {
    pub day_index: usize,
    pub slot_index: usize,
    pub state: Option<SlotState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateSlotResponse {
    pub chart_week: ChartWeek,
    /// Present only when the toggle changed the ledger
    pub child: Option<Child>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetChartResponse {
    pub chart_week: ChartWeek,
    pub child: Child,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeekResponse {
    pub year: i32,
    pub week: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UpdateSettingsRequest {
    pub name: Option<String>,
    pub prize_mode: Option<PrizeMode>,
    pub background_pattern: Option<BackgroundPattern>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePrizeTargetRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub target_type: PrizeTargetType,
    pub target_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UpdatePrizeTargetRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub target_type: Option<PrizeTargetType>,
    pub target_count: Option<i64>,
    pub is_achieved: Option<bool>,
}

/// Error body returned by the REST layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
