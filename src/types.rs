use chrono::NaiveDate;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::RecordError;

pub const TOTO_MIN: u8 = 1;
pub const TOTO_MAX: u8 = 49;
pub const TOTO_PICK: usize = 6;
pub const TOTO_TIERS: [u8; 4] = [3, 4, 5, 6];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GameType {
    #[serde(rename = "TOTO")]
    Toto,
    #[serde(rename = "4D")]
    FourD,
}

impl GameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::Toto => "TOTO",
            GameType::FourD => "4D",
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TOTO" => Ok(GameType::Toto),
            "4D" | "4-D" => Ok(GameType::FourD),
            other => Err(format!("Unknown game type: {}", other)),
        }
    }
}

/// Draw date read off a ticket. `Unknown` is the `"UNKNOWN"` sentinel used
/// when no date could be parsed; it never matches a winning-number record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawDate {
    Known(NaiveDate),
    Unknown,
}

impl DrawDate {
    pub const UNKNOWN: &'static str = "UNKNOWN";

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            DrawDate::Known(date) => Some(*date),
            DrawDate::Unknown => None,
        }
    }
}

impl fmt::Display for DrawDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawDate::Known(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            DrawDate::Unknown => f.write_str(Self::UNKNOWN),
        }
    }
}

impl FromStr for DrawDate {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(Self::UNKNOWN) {
            return Ok(DrawDate::Unknown);
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map(DrawDate::Known)
    }
}

impl Serialize for DrawDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DrawDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Validated ticket payload. TOTO tickets carry the selected numbers,
/// 4D tickets carry the single reconstructed 4-digit string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketNumbers {
    Toto(Vec<u8>),
    FourD(String),
}

impl TicketNumbers {
    pub fn game_type(&self) -> GameType {
        match self {
            TicketNumbers::Toto(_) => GameType::Toto,
            TicketNumbers::FourD(_) => GameType::FourD,
        }
    }
}

// Persisted and returned as a JSON list: `[1, 5, 12, ...]` or `["4109"]`.
impl Serialize for TicketNumbers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TicketNumbers::Toto(numbers) => numbers.serialize(serializer),
            TicketNumbers::FourD(number) => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(number)?;
                seq.end()
            }
        }
    }
}

/// One unit of comparison produced by expanding a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Combination {
    Toto(Vec<u8>),
    FourD(String),
}

pub fn is_four_digit(value: &str) -> bool {
    value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct TotoWinning {
    numbers: Vec<u8>,
}

impl TotoWinning {
    pub fn new(numbers: Vec<u8>) -> Result<Self, RecordError> {
        let in_range = numbers.iter().all(|n| (TOTO_MIN..=TOTO_MAX).contains(n));
        let mut distinct = numbers.clone();
        distinct.sort_unstable();
        distinct.dedup();

        if numbers.len() != TOTO_PICK || distinct.len() != TOTO_PICK || !in_range {
            return Err(RecordError::Toto(numbers));
        }
        Ok(Self { numbers })
    }

    pub fn numbers(&self) -> &[u8] {
        &self.numbers
    }
}

impl TryFrom<Vec<u8>> for TotoWinning {
    type Error = RecordError;

    fn try_from(numbers: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(numbers)
    }
}

impl From<TotoWinning> for Vec<u8> {
    fn from(winning: TotoWinning) -> Self {
        winning.numbers
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FourDCategory {
    First,
    Second,
    Third,
    Starter,
    Consolation,
}

impl FourDCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FourDCategory::First => "first",
            FourDCategory::Second => "second",
            FourDCategory::Third => "third",
            FourDCategory::Starter => "starter",
            FourDCategory::Consolation => "consolation",
        }
    }
}

impl fmt::Display for FourDCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FourDCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(FourDCategory::First),
            "second" => Ok(FourDCategory::Second),
            "third" => Ok(FourDCategory::Third),
            "starter" => Ok(FourDCategory::Starter),
            "consolation" => Ok(FourDCategory::Consolation),
            other => Err(format!("Unknown 4D prize category: {}", other)),
        }
    }
}

#[derive(Deserialize)]
struct FourDWinningFields {
    first: String,
    second: String,
    third: String,
    starter: Vec<String>,
    consolation: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FourDWinningFields")]
pub struct FourDWinning {
    first: String,
    second: String,
    third: String,
    starter: Vec<String>,
    consolation: Vec<String>,
}

impl FourDWinning {
    pub fn new(
        first: impl Into<String>,
        second: impl Into<String>,
        third: impl Into<String>,
        starter: Vec<String>,
        consolation: Vec<String>,
    ) -> Result<Self, RecordError> {
        let winning = Self {
            first: first.into(),
            second: second.into(),
            third: third.into(),
            starter,
            consolation,
        };

        let all = [&winning.first, &winning.second, &winning.third]
            .into_iter()
            .chain(winning.starter.iter())
            .chain(winning.consolation.iter());
        for number in all {
            if !is_four_digit(number) {
                return Err(RecordError::FourD(number.clone()));
            }
        }
        Ok(winning)
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    pub fn third(&self) -> &str {
        &self.third
    }

    pub fn starter(&self) -> &[String] {
        &self.starter
    }

    pub fn consolation(&self) -> &[String] {
        &self.consolation
    }

    /// Every winning number with its category, in prize priority order.
    pub fn entries(&self) -> Vec<(FourDCategory, &str)> {
        let mut entries = vec![
            (FourDCategory::First, self.first.as_str()),
            (FourDCategory::Second, self.second.as_str()),
            (FourDCategory::Third, self.third.as_str()),
        ];
        entries.extend(self.starter.iter().map(|n| (FourDCategory::Starter, n.as_str())));
        entries.extend(
            self.consolation
                .iter()
                .map(|n| (FourDCategory::Consolation, n.as_str())),
        );
        entries
    }
}

impl TryFrom<FourDWinningFields> for FourDWinning {
    type Error = RecordError;

    fn try_from(fields: FourDWinningFields) -> Result<Self, Self::Error> {
        Self::new(
            fields.first,
            fields.second,
            fields.third,
            fields.starter,
            fields.consolation,
        )
    }
}

/// Winning numbers of one draw. Serialized as a list for TOTO and as an
/// object with the five prize slots for 4D.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WinningRecord {
    Toto(TotoWinning),
    FourD(FourDWinning),
}

impl WinningRecord {
    pub fn game_type(&self) -> GameType {
        match self {
            WinningRecord::Toto(_) => GameType::Toto,
            WinningRecord::FourD(_) => GameType::FourD,
        }
    }
}

/// Count of TOTO combinations per match tier. Always holds the tiers 3..=6.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TierCounts(BTreeMap<u8, u32>);

// JSON object keys are strings; parse them explicitly so this also works
// when buffered by the untagged `PrizeResult`.
impl<'de> Deserialize<'de> for TierCounts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, u32>::deserialize(deserializer)?;
        let mut counts = BTreeMap::new();
        for (key, count) in raw {
            let tier: u8 = key
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("invalid tier: {}", key)))?;
            if !TOTO_TIERS.contains(&tier) {
                return Err(serde::de::Error::custom(format!("invalid tier: {}", tier)));
            }
            counts.insert(tier, count);
        }
        Ok(Self(counts))
    }
}

impl TierCounts {
    pub fn new() -> Self {
        Self(TOTO_TIERS.iter().map(|tier| (*tier, 0)).collect())
    }

    /// Records one combination matching `match_count` numbers. Counts outside
    /// the tracked tiers are ignored.
    pub fn record(&mut self, match_count: usize) {
        let Ok(tier) = u8::try_from(match_count) else {
            return;
        };
        if let Some(count) = self.0.get_mut(&tier) {
            *count += 1;
        }
    }

    pub fn get(&self, tier: u8) -> u32 {
        self.0.get(&tier).copied().unwrap_or(0)
    }

    pub fn has_winner(&self) -> bool {
        self.0.values().any(|count| *count > 0)
    }
}

impl Default for TierCounts {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrizeResult {
    Toto(TierCounts),
    FourD {
        prize_category: Option<FourDCategory>,
    },
}

impl PrizeResult {
    pub fn is_winner(&self) -> bool {
        match self {
            PrizeResult::Toto(counts) => counts.has_winner(),
            PrizeResult::FourD { prize_category } => prize_category.is_some(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketCheckRow {
    pub id: i64,
    pub game_type: String,
    pub draw_date: String,
    pub numbers: serde_json::Value,
    pub is_system_bet: bool,
    pub prize_results: serde_json::Value,
    pub is_winner: bool,
    pub created_at: String,
}

/// Winning numbers as submitted by an admin or returned by the results feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinningNumbersPayload {
    pub game_type: GameType,
    pub draw_date: NaiveDate,
    pub winning_numbers: WinningRecord,
}

#[derive(Serialize)]
pub struct WinningNumbersRequest {
    pub game_type: GameType,
    pub draw_date: String,
}

#[derive(Deserialize, Debug)]
pub struct WinningNumbersResponse {
    #[serde(rename = "statusMessage")]
    pub status_message: String,
    #[serde(rename = "statusCode")]
    pub status_code: i32,
    pub status: bool,
    pub response: Option<ResponseData>,
}

#[derive(Deserialize, Debug)]
pub struct ResponseData {
    pub result: Option<WinningNumbersPayload>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_game_type_round_trips_through_labels() {
        assert_eq!("toto".parse::<GameType>().unwrap(), GameType::Toto);
        assert_eq!("4-d".parse::<GameType>().unwrap(), GameType::FourD);
        assert_eq!(serde_json::to_value(GameType::FourD).unwrap(), json!("4D"));
        assert!("pick3".parse::<GameType>().is_err());
    }

    #[test]
    fn test_draw_date_display_and_sentinel() {
        let date = DrawDate::Known(NaiveDate::from_ymd_opt(2026, 1, 20).unwrap());
        assert_eq!(date.to_string(), "2026-01-20");
        assert_eq!(DrawDate::Unknown.to_string(), "UNKNOWN");
        assert_eq!("UNKNOWN".parse::<DrawDate>().unwrap(), DrawDate::Unknown);
        assert_eq!("2026-01-20".parse::<DrawDate>().unwrap(), date);
    }

    #[test]
    fn test_ticket_numbers_serialize_as_list() {
        let toto = TicketNumbers::Toto(vec![1, 2, 3, 4, 5, 6, 7]);
        let four_d = TicketNumbers::FourD("0042".to_string());
        assert_eq!(serde_json::to_value(&toto).unwrap(), json!([1, 2, 3, 4, 5, 6, 7]));
        assert_eq!(serde_json::to_value(&four_d).unwrap(), json!(["0042"]));
    }

    #[test]
    fn test_toto_winning_rejects_bad_sets() {
        assert!(TotoWinning::new(vec![1, 5, 12, 23, 34, 45]).is_ok());
        assert!(TotoWinning::new(vec![1, 5, 12, 23, 34]).is_err());
        assert!(TotoWinning::new(vec![1, 1, 12, 23, 34, 45]).is_err());
        assert!(TotoWinning::new(vec![0, 5, 12, 23, 34, 45]).is_err());
        assert!(TotoWinning::new(vec![1, 5, 12, 23, 34, 50]).is_err());
    }

    #[test]
    fn test_winning_record_deserializes_both_shapes() {
        let toto: WinningRecord = serde_json::from_value(json!([1, 5, 12, 23, 34, 45])).unwrap();
        assert_eq!(toto.game_type(), GameType::Toto);

        let four_d: WinningRecord = serde_json::from_value(json!({
            "first": "4109",
            "second": "1234",
            "third": "5678",
            "starter": ["0001", "1111"],
            "consolation": ["2222", "3333"]
        }))
        .unwrap();
        assert_eq!(four_d.game_type(), GameType::FourD);

        let bad = serde_json::from_value::<WinningRecord>(json!({
            "first": "41090",
            "second": "1234",
            "third": "5678",
            "starter": [],
            "consolation": []
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_prize_result_json_shapes() {
        let mut counts = TierCounts::new();
        counts.record(5);
        let toto = PrizeResult::Toto(counts);
        assert_eq!(
            serde_json::to_value(&toto).unwrap(),
            json!({"3": 0, "4": 0, "5": 1, "6": 0})
        );

        let four_d = PrizeResult::FourD {
            prize_category: Some(FourDCategory::Second),
        };
        assert_eq!(
            serde_json::to_value(&four_d).unwrap(),
            json!({"prize_category": "second"})
        );

        let parsed: PrizeResult =
            serde_json::from_value(json!({"prize_category": null})).unwrap();
        assert_eq!(parsed, PrizeResult::FourD { prize_category: None });
        assert!(!parsed.is_winner());

        let parsed: PrizeResult =
            serde_json::from_value(json!({"3": 2, "4": 0, "5": 0, "6": 0})).unwrap();
        assert!(parsed.is_winner());
    }

    #[test]
    fn test_tier_counts_ignore_low_matches() {
        let mut counts = TierCounts::new();
        counts.record(0);
        counts.record(2);
        counts.record(7);
        assert!(!counts.has_winner());
        assert_eq!(counts, TierCounts::new());
    }
}
