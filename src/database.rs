use anyhow::{Context, anyhow};
use chrono::{NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Result};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::checker::{CheckStore, TicketCheck};
use crate::types::{
    DrawDate, FourDCategory, FourDWinning, GameType, TicketCheckRow, TotoWinning,
    WinningNumbersPayload, WinningRecord,
};
use crate::winning_numbers::WinningNumberSource;

const TOTO_CATEGORY: &str = "winning";

pub fn ensure_parent_dir(db_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
            info!("📁 Ensured directory: {}", parent.display());
        }
    }
    Ok(())
}

pub fn create_database(db_path: &Path) -> anyhow::Result<Connection> {
    ensure_parent_dir(db_path)
        .with_context(|| format!("Failed to create directory for {}", db_path.display()))?;

    let conn = Connection::open(db_path)?;
    create_database_with_connection(&conn)?;
    Ok(conn)
}

pub fn create_database_with_connection(conn: &Connection) -> Result<()> {
    // Returns the resulting mode ("wal", or "memory" for in-memory databases).
    conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get::<_, String>(0))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS ticket_checks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            game_type TEXT NOT NULL,
            draw_date TEXT NOT NULL,
            numbers TEXT NOT NULL,
            is_system_bet INTEGER NOT NULL,
            prize_results TEXT NOT NULL,
            is_winner INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS draw_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            game_type TEXT NOT NULL,
            draw_date TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (game_type, draw_date)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS prize_numbers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            draw_id INTEGER NOT NULL,
            category TEXT NOT NULL,
            number_value TEXT NOT NULL,
            position INTEGER NOT NULL,
            FOREIGN KEY (draw_id) REFERENCES draw_results (id) ON DELETE CASCADE
        )",
        [],
    )?;

    Ok(())
}

pub fn save_ticket_check(conn: &Connection, check: &TicketCheck) -> anyhow::Result<i64> {
    let ticket = &check.ticket;
    conn.execute(
        "INSERT INTO ticket_checks (
            game_type, draw_date, numbers, is_system_bet, prize_results, is_winner, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            ticket.game_type().as_str(),
            ticket.draw_date().to_string(),
            serde_json::to_string(ticket.numbers())?,
            ticket.is_system_bet(),
            serde_json::to_string(&check.prize_results)?,
            check.is_winner,
            Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        ),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_all_ticket_checks(conn: &Connection) -> anyhow::Result<Vec<TicketCheckRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, game_type, draw_date, numbers, is_system_bet, prize_results, is_winner, created_at
         FROM ticket_checks
         ORDER BY created_at DESC, id DESC",
    )?;

    let row_iter = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, bool>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, bool>(6)?,
            row.get::<_, String>(7)?,
        ))
    })?;

    let mut results = Vec::new();
    for row in row_iter {
        let (
            id,
            game_type,
            draw_date,
            numbers,
            is_system_bet,
            prize_results,
            is_winner,
            created_at,
        ) = row?;
        results.push(TicketCheckRow {
            id,
            game_type,
            draw_date,
            numbers: serde_json::from_str(&numbers)
                .with_context(|| format!("Corrupt numbers in ticket check {}", id))?,
            is_system_bet,
            prize_results: serde_json::from_str(&prize_results)
                .with_context(|| format!("Corrupt prize results in ticket check {}", id))?,
            is_winner,
            created_at,
        });
    }
    Ok(results)
}

/// Stores the winning numbers of one draw, replacing any earlier record for
/// the same game and date.
pub fn save_winning_numbers(
    conn: &mut Connection,
    draw_date: NaiveDate,
    record: &WinningRecord,
) -> Result<i64> {
    let tx = conn.transaction()?;
    let game_type = record.game_type().as_str();
    let date = draw_date.format("%Y-%m-%d").to_string();

    tx.execute(
        "DELETE FROM prize_numbers WHERE draw_id IN (
            SELECT id FROM draw_results WHERE game_type = ?1 AND draw_date = ?2
        )",
        (game_type, &date),
    )?;
    tx.execute(
        "DELETE FROM draw_results WHERE game_type = ?1 AND draw_date = ?2",
        (game_type, &date),
    )?;
    tx.execute(
        "INSERT INTO draw_results (game_type, draw_date) VALUES (?1, ?2)",
        (game_type, &date),
    )?;
    let draw_id = tx.last_insert_rowid();

    let entries: Vec<(&str, String)> = match record {
        WinningRecord::Toto(toto) => toto
            .numbers()
            .iter()
            .map(|n| (TOTO_CATEGORY, n.to_string()))
            .collect(),
        WinningRecord::FourD(four_d) => four_d
            .entries()
            .into_iter()
            .map(|(category, number)| (category.as_str(), number.to_string()))
            .collect(),
    };

    for (position, (category, number)) in entries.iter().enumerate() {
        tx.execute(
            "INSERT INTO prize_numbers (draw_id, category, number_value, position)
             VALUES (?1, ?2, ?3, ?4)",
            (draw_id, category, number, position as i64),
        )?;
    }

    tx.commit()?;
    Ok(draw_id)
}

pub fn get_winning_numbers(
    conn: &Connection,
    game_type: GameType,
    draw_date: NaiveDate,
) -> anyhow::Result<Option<WinningRecord>> {
    let date = draw_date.format("%Y-%m-%d").to_string();
    let draw_id: Option<i64> = conn
        .query_row(
            "SELECT id FROM draw_results WHERE game_type = ?1 AND draw_date = ?2",
            (game_type.as_str(), &date),
            |row| row.get(0),
        )
        .optional()?;

    let Some(draw_id) = draw_id else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT category, number_value FROM prize_numbers WHERE draw_id = ?1 ORDER BY position",
    )?;
    let prize_iter = stmt.query_map([draw_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut prizes = Vec::new();
    for prize in prize_iter {
        prizes.push(prize?);
    }

    let record = match game_type {
        GameType::Toto => {
            let numbers = prizes
                .iter()
                .map(|(_, value)| value.parse::<u8>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .with_context(|| format!("Corrupt TOTO numbers for draw {}", date))?;
            WinningRecord::Toto(TotoWinning::new(numbers)?)
        }
        GameType::FourD => WinningRecord::FourD(four_d_from_rows(&prizes, &date)?),
    };
    Ok(Some(record))
}

fn four_d_from_rows(prizes: &[(String, String)], date: &str) -> anyhow::Result<FourDWinning> {
    let mut first = Vec::new();
    let mut second = Vec::new();
    let mut third = Vec::new();
    let mut starter = Vec::new();
    let mut consolation = Vec::new();

    for (category, value) in prizes {
        let category: FourDCategory = category.parse().map_err(|e: String| anyhow!(e))?;
        let slot = match category {
            FourDCategory::First => &mut first,
            FourDCategory::Second => &mut second,
            FourDCategory::Third => &mut third,
            FourDCategory::Starter => &mut starter,
            FourDCategory::Consolation => &mut consolation,
        };
        slot.push(value.clone());
    }

    let single = |values: Vec<String>, name: &str| -> anyhow::Result<String> {
        match <[String; 1]>::try_from(values) {
            Ok([value]) => Ok(value),
            Err(values) => Err(anyhow!(
                "Draw {} has {} {} prize numbers, expected 1",
                date,
                values.len(),
                name
            )),
        }
    };

    Ok(FourDWinning::new(
        single(first, "first")?,
        single(second, "second")?,
        single(third, "third")?,
        starter,
        consolation,
    )?)
}

pub fn winning_numbers_exist(
    conn: &Connection,
    game_type: GameType,
    draw_date: &str,
) -> Result<bool> {
    let mut stmt = conn
        .prepare("SELECT COUNT(*) FROM draw_results WHERE game_type = ?1 AND draw_date = ?2")?;
    let count: i64 = stmt.query_row((game_type.as_str(), draw_date), |row| row.get(0))?;
    Ok(count > 0)
}

/// Splits requested draw dates into those still missing and those already
/// stored.
pub fn check_existing_dates(
    conn: &Connection,
    game_type: GameType,
    dates: &[NaiveDate],
) -> Result<(Vec<NaiveDate>, Vec<NaiveDate>)> {
    let mut dates_to_fetch = Vec::new();
    let mut existing_dates = Vec::new();

    for date in dates {
        let formatted_date = date.format("%Y-%m-%d").to_string();
        if winning_numbers_exist(conn, game_type, &formatted_date)? {
            existing_dates.push(*date);
        } else {
            dates_to_fetch.push(*date);
        }
    }

    Ok((dates_to_fetch, existing_dates))
}

/// Admin input: `{"game_type": "TOTO", "draw_date": "2026-01-20",
/// "winning_numbers": [1, 5, 12, 23, 34, 45]}` or the 4D object form.
pub fn parse_and_insert_raw_json(
    conn: &mut Connection,
    raw_json: &str,
) -> anyhow::Result<WinningNumbersPayload> {
    let payload: WinningNumbersPayload =
        serde_json::from_str(raw_json).context("Invalid winning numbers JSON")?;
    save_winning_payload(conn, &payload)?;
    Ok(payload)
}

pub fn save_winning_payload(
    conn: &mut Connection,
    payload: &WinningNumbersPayload,
) -> anyhow::Result<i64> {
    let found = payload.winning_numbers.game_type();
    if found != payload.game_type {
        return Err(crate::error::RecordError::GameMismatch {
            expected: payload.game_type,
            found,
        }
        .into());
    }
    Ok(save_winning_numbers(
        conn,
        payload.draw_date,
        &payload.winning_numbers,
    )?)
}

/// SQLite-backed record store and winning-number source.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(create_database(db_path)?))
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        create_database_with_connection(&conn)?;
        Ok(Self::new(conn))
    }

    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn connection(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))
    }

    pub fn insert_winning_numbers(&self, raw_json: &str) -> anyhow::Result<WinningNumbersPayload> {
        parse_and_insert_raw_json(&mut *self.connection()?, raw_json)
    }

    pub fn save_winning_payload(&self, payload: &WinningNumbersPayload) -> anyhow::Result<i64> {
        save_winning_payload(&mut *self.connection()?, payload)
    }
}

impl CheckStore for SqliteStore {
    fn save_check(&self, check: &TicketCheck) -> anyhow::Result<i64> {
        save_ticket_check(&*self.connection()?, check)
    }

    fn list_checks(&self) -> anyhow::Result<Vec<TicketCheckRow>> {
        get_all_ticket_checks(&*self.connection()?)
    }
}

impl WinningNumberSource for SqliteStore {
    fn lookup(
        &self,
        game_type: GameType,
        draw_date: &DrawDate,
    ) -> anyhow::Result<Option<WinningRecord>> {
        let Some(date) = draw_date.date() else {
            return Ok(None);
        };
        get_winning_numbers(&*self.connection()?, game_type, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::process_ticket_text;
    use crate::winning_numbers::StaticWinningNumbers;
    use serde_json::json;

    fn demo_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 20).unwrap()
    }

    #[test]
    fn test_saved_checks_come_back_newest_first() {
        let store = SqliteStore::open_in_memory().unwrap();
        let source = StaticWinningNumbers::with_demo_draws().unwrap();

        let toto = process_ticket_text("TOTO 20/01/2026 03 05 12 23 34 45 09", true, &source)
            .unwrap();
        let four_d = process_ticket_text("4D 2026-01-20 9876", false, &source).unwrap();

        let first_id = store.save_check(&toto).unwrap();
        let second_id = store.save_check(&four_d).unwrap();
        assert!(second_id > first_id);

        let rows = store.list_checks().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, second_id);
        assert_eq!(rows[0].game_type, "4D");
        assert_eq!(rows[0].numbers, json!(["9876"]));
        assert_eq!(rows[0].prize_results, json!({"prize_category": null}));
        assert!(!rows[0].is_winner);

        assert_eq!(rows[1].game_type, "TOTO");
        assert_eq!(rows[1].draw_date, "2026-01-20");
        assert!(rows[1].is_system_bet);
        assert!(rows[1].is_winner);
        assert!(rows[1].created_at.ends_with('Z'));
    }

    #[test]
    fn test_winning_numbers_round_trip_through_tables() {
        let store = SqliteStore::open_in_memory().unwrap();
        let demo = StaticWinningNumbers::with_demo_draws().unwrap();
        let date = DrawDate::Known(demo_date());

        for game_type in [GameType::Toto, GameType::FourD] {
            let record = demo.lookup(game_type, &date).unwrap().unwrap();
            save_winning_numbers(&mut *store.connection().unwrap(), demo_date(), &record).unwrap();
            assert_eq!(store.lookup(game_type, &date).unwrap(), Some(record));
        }

        let other = DrawDate::Known(NaiveDate::from_ymd_opt(2026, 1, 23).unwrap());
        assert_eq!(store.lookup(GameType::Toto, &other).unwrap(), None);
        assert_eq!(store.lookup(GameType::Toto, &DrawDate::Unknown).unwrap(), None);
    }

    #[test]
    fn test_admin_json_replaces_previous_record() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_winning_numbers(
                r#"{"game_type": "TOTO", "draw_date": "2026-01-23", "winning_numbers": [2, 4, 6, 8, 10, 12]}"#,
            )
            .unwrap();
        store
            .insert_winning_numbers(
                r#"{"game_type": "TOTO", "draw_date": "2026-01-23", "winning_numbers": [3, 6, 9, 12, 15, 18]}"#,
            )
            .unwrap();

        let date = DrawDate::Known(NaiveDate::from_ymd_opt(2026, 1, 23).unwrap());
        let Some(WinningRecord::Toto(toto)) = store.lookup(GameType::Toto, &date).unwrap() else {
            panic!("expected TOTO record");
        };
        assert_eq!(toto.numbers(), &[3, 6, 9, 12, 15, 18]);

        let conn = store.connection().unwrap();
        let draws: i64 = conn
            .query_row("SELECT COUNT(*) FROM draw_results", [], |row| row.get(0))
            .unwrap();
        let prizes: i64 = conn
            .query_row("SELECT COUNT(*) FROM prize_numbers", [], |row| row.get(0))
            .unwrap();
        assert_eq!((draws, prizes), (1, 6));
    }

    #[test]
    fn test_admin_json_rejects_bad_records() {
        let store = SqliteStore::open_in_memory().unwrap();
        let cases = [
            "not json",
            r#"{"game_type": "TOTO", "draw_date": "2026-01-23", "winning_numbers": [1, 2, 3]}"#,
            r#"{"game_type": "4D", "draw_date": "2026-01-23", "winning_numbers": [1, 2, 3, 4, 5, 6]}"#,
            r#"{"game_type": "TOTO", "draw_date": "23/01/2026", "winning_numbers": [1, 2, 3, 4, 5, 6]}"#,
        ];
        for raw in cases {
            assert!(store.insert_winning_numbers(raw).is_err(), "{}", raw);
        }
        assert!(
            !winning_numbers_exist(&store.connection().unwrap(), GameType::Toto, "2026-01-23")
                .unwrap()
        );
    }

    #[test]
    fn test_check_existing_dates_splits_requests() {
        let store = SqliteStore::open_in_memory().unwrap();
        let demo = StaticWinningNumbers::with_demo_draws().unwrap();
        let record = demo
            .lookup(GameType::FourD, &DrawDate::Known(demo_date()))
            .unwrap()
            .unwrap();
        save_winning_numbers(&mut *store.connection().unwrap(), demo_date(), &record).unwrap();

        let later = NaiveDate::from_ymd_opt(2026, 1, 24).unwrap();
        let (to_fetch, existing) = check_existing_dates(
            &store.connection().unwrap(),
            GameType::FourD,
            &[demo_date(), later],
        )
        .unwrap();
        assert_eq!(to_fetch, vec![later]);
        assert_eq!(existing, vec![demo_date()]);

        let (to_fetch, _) =
            check_existing_dates(&store.connection().unwrap(), GameType::Toto, &[demo_date()])
                .unwrap();
        assert_eq!(to_fetch, vec![demo_date()]);
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("tickets.db");
        let store = SqliteStore::open(&db_path).unwrap();
        assert!(db_path.exists());
        assert!(store.list_checks().unwrap().is_empty());
    }
}
