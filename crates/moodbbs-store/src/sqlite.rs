//! SQLite-based store implementation

use chrono::{DateTime, Local};
use moodbbs_api::{
    MoodBuff, MoodEvent, MoodSnapshot, ParseLabelError, PersonalityTrait, Quest, QuestCompletion,
    QuestConstraint, QuestSnooze, RenewalPolicy,
};
use moodbbs_util::{CompletionId, EventId, QuestId, SnoozeId, TraitId};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{Store, StoreError, StoreResult};

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("store lock poisoned".into()))
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS quests (
                id INTEGER PRIMARY KEY,
                template_id TEXT,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                category TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                location TEXT,
                xp_reward INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL,
                renewal_type TEXT,
                cooldown_days INTEGER,
                max_active_instances INTEGER,
                active_months_json TEXT,
                next_eligible_renewal TEXT,
                renewal_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                due_at TEXT,
                constraint_type TEXT,
                constraint_note TEXT,
                completed_at TEXT
            );

            -- Completion audit trail (append-only)
            CREATE TABLE IF NOT EXISTS quest_completions (
                id INTEGER PRIMARY KEY,
                quest_id INTEGER NOT NULL,
                completed_at TEXT NOT NULL,
                location_visited TEXT,
                duration_minutes INTEGER,
                notes TEXT,
                buffs_json TEXT NOT NULL,
                xp_awarded INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS quest_snoozes (
                id INTEGER PRIMARY KEY,
                quest_id INTEGER NOT NULL,
                snoozed_at TEXT NOT NULL,
                return_at TEXT NOT NULL,
                reason TEXT,
                reason_category TEXT NOT NULL,
                context_json TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS mood_events (
                id INTEGER PRIMARY KEY,
                event_type TEXT NOT NULL,
                modifier INTEGER NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL,
                expires_at TEXT,
                is_active INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS traits (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                modifier INTEGER NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                category TEXT NOT NULL
            );

            -- Single row
            CREATE TABLE IF NOT EXISTS user_stats (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                total_xp INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS mood_snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL,
                score INTEGER NOT NULL,
                tier TEXT NOT NULL,
                face TEXT NOT NULL,
                contributors_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_completions_quest ON quest_completions(quest_id);
            CREATE INDEX IF NOT EXISTS idx_snoozes_quest ON quest_snoozes(quest_id);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

// Row conversion helpers

fn corrupt(table: &'static str, message: impl Into<String>) -> StoreError {
    StoreError::Corrupt {
        table,
        message: message.into(),
    }
}

fn parse_time(table: &'static str, value: &str) -> StoreResult<DateTime<Local>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Local))
        .map_err(|e| corrupt(table, format!("bad timestamp '{}': {}", value, e)))
}

fn parse_opt_time(table: &'static str, value: Option<String>) -> StoreResult<Option<DateTime<Local>>> {
    value.map(|v| parse_time(table, &v)).transpose()
}

fn parse_label<T>(table: &'static str, value: &str) -> StoreResult<T>
where
    T: FromStr<Err = ParseLabelError>,
{
    value.parse().map_err(|e: ParseLabelError| corrupt(table, e.to_string()))
}

fn opt_rfc3339(value: Option<DateTime<Local>>) -> Option<String> {
    value.map(|dt| dt.to_rfc3339())
}

struct QuestRow {
    id: i64,
    template_id: Option<String>,
    title: String,
    description: String,
    category: String,
    difficulty: String,
    location: Option<String>,
    xp_reward: u32,
    status: String,
    renewal_type: Option<String>,
    cooldown_days: Option<u32>,
    max_active_instances: Option<u32>,
    active_months_json: Option<String>,
    next_eligible_renewal: Option<String>,
    renewal_count: u32,
    created_at: String,
    due_at: Option<String>,
    constraint_type: Option<String>,
    constraint_note: Option<String>,
    completed_at: Option<String>,
}

const QUEST_COLUMNS: &str = "id, template_id, title, description, category, difficulty, location, \
     xp_reward, status, renewal_type, cooldown_days, max_active_instances, active_months_json, \
     next_eligible_renewal, renewal_count, created_at, due_at, constraint_type, constraint_note, \
     completed_at";

impl QuestRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            template_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            category: row.get(4)?,
            difficulty: row.get(5)?,
            location: row.get(6)?,
            xp_reward: row.get(7)?,
            status: row.get(8)?,
            renewal_type: row.get(9)?,
            cooldown_days: row.get(10)?,
            max_active_instances: row.get(11)?,
            active_months_json: row.get(12)?,
            next_eligible_renewal: row.get(13)?,
            renewal_count: row.get(14)?,
            created_at: row.get(15)?,
            due_at: row.get(16)?,
            constraint_type: row.get(17)?,
            constraint_note: row.get(18)?,
            completed_at: row.get(19)?,
        })
    }

    fn into_quest(self) -> StoreResult<Quest> {
        const TABLE: &str = "quests";

        let renewal_policy = match self.renewal_type {
            Some(renewal_type) => {
                let active_months = self
                    .active_months_json
                    .map(|json| serde_json::from_str::<BTreeSet<u32>>(&json))
                    .transpose()?;
                Some(RenewalPolicy {
                    renewal_type: parse_label(TABLE, &renewal_type)?,
                    cooldown_days: self.cooldown_days.unwrap_or(0),
                    max_active_instances: self.max_active_instances.unwrap_or(1),
                    active_months,
                })
            }
            None => None,
        };

        let constraint = match (self.constraint_type, self.constraint_note) {
            (Some(kind), note) => Some(QuestConstraint {
                kind,
                note: note.unwrap_or_default(),
            }),
            (None, _) => None,
        };

        Ok(Quest {
            id: QuestId::new(self.id),
            template_id: self.template_id,
            title: self.title,
            description: self.description,
            category: parse_label(TABLE, &self.category)?,
            difficulty: parse_label(TABLE, &self.difficulty)?,
            location: self.location,
            xp_reward: self.xp_reward,
            status: parse_label(TABLE, &self.status)?,
            renewal_policy,
            next_eligible_renewal: parse_opt_time(TABLE, self.next_eligible_renewal)?,
            renewal_count: self.renewal_count,
            created_at: parse_time(TABLE, &self.created_at)?,
            due_at: parse_opt_time(TABLE, self.due_at)?,
            constraint,
            completed_at: parse_opt_time(TABLE, self.completed_at)?,
        })
    }
}

fn upsert_quest(conn: &Connection, quest: &Quest) -> StoreResult<()> {
    let policy = quest.renewal_policy.as_ref();
    let active_months_json = policy
        .and_then(|p| p.active_months.as_ref())
        .map(serde_json::to_string)
        .transpose()?;
    let constraint = quest.constraint.as_ref();

    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO quests ({}) VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
            QUEST_COLUMNS
        ),
        params![
            quest.id.get(),
            quest.template_id,
            quest.title,
            quest.description,
            quest.category.as_str(),
            quest.difficulty.as_str(),
            quest.location,
            quest.xp_reward,
            quest.status.as_str(),
            policy.map(|p| p.renewal_type.as_str()),
            policy.map(|p| p.cooldown_days),
            policy.map(|p| p.max_active_instances),
            active_months_json,
            opt_rfc3339(quest.next_eligible_renewal),
            quest.renewal_count,
            quest.created_at.to_rfc3339(),
            opt_rfc3339(quest.due_at),
            constraint.map(|c| c.kind.as_str()),
            constraint.map(|c| c.note.as_str()),
            opt_rfc3339(quest.completed_at),
        ],
    )?;

    debug!(quest_id = %quest.id, status = %quest.status, "Quest saved");
    Ok(())
}

fn insert_completion(conn: &Connection, completion: &QuestCompletion) -> StoreResult<()> {
    let buffs_json = serde_json::to_string(&completion.buffs)?;

    conn.execute(
        r#"
        INSERT INTO quest_completions
            (id, quest_id, completed_at, location_visited, duration_minutes, notes, buffs_json, xp_awarded)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            completion.id.get(),
            completion.quest_id.get(),
            completion.completed_at.to_rfc3339(),
            completion.location_visited,
            completion.duration_minutes,
            completion.notes,
            buffs_json,
            completion.xp_awarded,
        ],
    )?;

    debug!(completion_id = %completion.id, quest_id = %completion.quest_id, "Completion saved");
    Ok(())
}

fn insert_snooze(conn: &Connection, snooze: &QuestSnooze) -> StoreResult<()> {
    let context_json = serde_json::to_string(&snooze.context)?;

    conn.execute(
        r#"
        INSERT INTO quest_snoozes (id, quest_id, snoozed_at, return_at, reason, reason_category, context_json)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            snooze.id.get(),
            snooze.quest_id.get(),
            snooze.snoozed_at.to_rfc3339(),
            snooze.return_at.to_rfc3339(),
            snooze.reason,
            snooze.reason_category.as_str(),
            context_json,
        ],
    )?;

    debug!(snooze_id = %snooze.id, quest_id = %snooze.quest_id, "Snooze saved");
    Ok(())
}

fn upsert_mood_event(conn: &Connection, event: &MoodEvent) -> StoreResult<()> {
    conn.execute(
        r#"
        INSERT INTO mood_events (id, event_type, modifier, description, created_at, expires_at, is_active)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(id)
        DO UPDATE SET event_type = excluded.event_type,
                      modifier = excluded.modifier,
                      description = excluded.description,
                      created_at = excluded.created_at,
                      expires_at = excluded.expires_at,
                      is_active = excluded.is_active
        "#,
        params![
            event.id.get(),
            event.event_type,
            event.modifier,
            event.description,
            event.created_at.to_rfc3339(),
            opt_rfc3339(event.expires_at),
            event.is_active,
        ],
    )?;

    debug!(event_id = %event.id, event_type = %event.event_type, "Mood event saved");
    Ok(())
}

fn write_total_xp(conn: &Connection, total_xp: u64) -> StoreResult<()> {
    let total = i64::try_from(total_xp)
        .map_err(|_| StoreError::Serialization(format!("total XP {} out of range", total_xp)))?;

    conn.execute(
        r#"
        INSERT INTO user_stats (id, total_xp)
        VALUES (1, ?1)
        ON CONFLICT(id)
        DO UPDATE SET total_xp = excluded.total_xp
        "#,
        [total],
    )?;

    Ok(())
}

impl Store for SqliteStore {
    fn load_quests(&self) -> StoreResult<Vec<Quest>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM quests ORDER BY id", QUEST_COLUMNS))?;
        let rows = stmt.query_map([], QuestRow::from_row)?;

        rows.map(|row| row.map_err(StoreError::from).and_then(QuestRow::into_quest))
            .collect()
    }

    fn save_quest(&self, quest: &Quest) -> StoreResult<()> {
        let conn = self.lock()?;
        upsert_quest(&conn, quest)
    }

    fn save_quests(&self, quests: &[Quest]) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for quest in quests {
            upsert_quest(&tx, quest)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn load_completions(&self) -> StoreResult<Vec<QuestCompletion>> {
        const TABLE: &str = "quest_completions";
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, quest_id, completed_at, location_visited, duration_minutes, notes, buffs_json, xp_awarded
            FROM quest_completions ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<u32>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, u32>(7)?,
            ))
        })?;

        let mut completions = Vec::new();
        for row in rows {
            let (id, quest_id, completed_at, location_visited, duration_minutes, notes, buffs_json, xp_awarded) =
                row?;
            let buffs: Vec<MoodBuff> = serde_json::from_str(&buffs_json)?;

            completions.push(QuestCompletion {
                id: CompletionId::new(id),
                quest_id: QuestId::new(quest_id),
                completed_at: parse_time(TABLE, &completed_at)?,
                location_visited,
                duration_minutes,
                notes,
                buffs,
                xp_awarded,
            });
        }

        Ok(completions)
    }

    fn save_completion(&self, completion: &QuestCompletion) -> StoreResult<()> {
        let conn = self.lock()?;
        insert_completion(&conn, completion)
    }

    fn load_snoozes(&self) -> StoreResult<Vec<QuestSnooze>> {
        const TABLE: &str = "quest_snoozes";
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, quest_id, snoozed_at, return_at, reason, reason_category, context_json
            FROM quest_snoozes ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut snoozes = Vec::new();
        for row in rows {
            let (id, quest_id, snoozed_at, return_at, reason, reason_category, context_json) = row?;

            snoozes.push(QuestSnooze {
                id: SnoozeId::new(id),
                quest_id: QuestId::new(quest_id),
                snoozed_at: parse_time(TABLE, &snoozed_at)?,
                return_at: parse_time(TABLE, &return_at)?,
                reason,
                reason_category: parse_label(TABLE, &reason_category)?,
                context: serde_json::from_str(&context_json)?,
            });
        }

        Ok(snoozes)
    }

    fn save_snooze(&self, snooze: &QuestSnooze) -> StoreResult<()> {
        let conn = self.lock()?;
        insert_snooze(&conn, snooze)
    }

    fn record_snooze(&self, quest: &Quest, snooze: &QuestSnooze) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        upsert_quest(&tx, quest)?;
        insert_snooze(&tx, snooze)?;

        tx.commit()?;
        Ok(())
    }

    fn load_mood_events(&self) -> StoreResult<Vec<MoodEvent>> {
        const TABLE: &str = "mood_events";
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, event_type, modifier, description, created_at, expires_at, is_active
            FROM mood_events ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i32>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, bool>(6)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, event_type, modifier, description, created_at, expires_at, is_active) = row?;
            events.push(MoodEvent {
                id: EventId::new(id),
                event_type,
                modifier,
                description,
                created_at: parse_time(TABLE, &created_at)?,
                expires_at: parse_opt_time(TABLE, expires_at)?,
                is_active,
            });
        }

        Ok(events)
    }

    fn save_mood_event(&self, event: &MoodEvent) -> StoreResult<()> {
        let conn = self.lock()?;
        upsert_mood_event(&conn, event)
    }

    fn load_traits(&self) -> StoreResult<Vec<PersonalityTrait>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT id, name, description, modifier, is_active, category FROM traits ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i32>(3)?,
                row.get::<_, bool>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut traits = Vec::new();
        for row in rows {
            let (id, name, description, modifier, is_active, category) = row?;
            traits.push(PersonalityTrait {
                id: TraitId::new(id),
                name,
                description,
                modifier,
                is_active,
                category: parse_label("traits", &category)?,
            });
        }

        Ok(traits)
    }

    fn save_trait(&self, personality_trait: &PersonalityTrait) -> StoreResult<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO traits (id, name, description, modifier, is_active, category)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id)
            DO UPDATE SET name = excluded.name,
                          description = excluded.description,
                          modifier = excluded.modifier,
                          is_active = excluded.is_active,
                          category = excluded.category
            "#,
            params![
                personality_trait.id.get(),
                personality_trait.name,
                personality_trait.description,
                personality_trait.modifier,
                personality_trait.is_active,
                personality_trait.category.as_str(),
            ],
        )?;

        debug!(trait_name = %personality_trait.name, active = personality_trait.is_active, "Trait saved");
        Ok(())
    }

    fn get_total_xp(&self) -> StoreResult<u64> {
        let conn = self.lock()?;

        let total: Option<i64> = conn
            .query_row("SELECT total_xp FROM user_stats WHERE id = 1", [], |row| row.get(0))
            .optional()?;

        match total {
            Some(total) => u64::try_from(total)
                .map_err(|_| corrupt("user_stats", format!("negative total XP {}", total))),
            None => Ok(0),
        }
    }

    fn set_total_xp(&self, total_xp: u64) -> StoreResult<()> {
        let conn = self.lock()?;
        write_total_xp(&conn, total_xp)
    }

    fn record_completion(
        &self,
        quest: &Quest,
        completion: &QuestCompletion,
        events: &[MoodEvent],
        total_xp: u64,
    ) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        upsert_quest(&tx, quest)?;
        insert_completion(&tx, completion)?;
        for event in events {
            upsert_mood_event(&tx, event)?;
        }
        write_total_xp(&tx, total_xp)?;

        tx.commit()?;

        debug!(
            quest_id = %quest.id,
            completion_id = %completion.id,
            events = events.len(),
            total_xp,
            "Completion recorded"
        );
        Ok(())
    }

    fn append_mood_snapshot(&self, snapshot: &MoodSnapshot) -> StoreResult<i64> {
        let conn = self.lock()?;
        let contributors_json = serde_json::to_string(&snapshot.contributors)?;

        conn.execute(
            r#"
            INSERT INTO mood_snapshots (created_at, score, tier, face, contributors_json)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                snapshot.created_at.to_rfc3339(),
                snapshot.score,
                snapshot.tier.as_str(),
                snapshot.face,
                contributors_json,
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!(snapshot_id = id, score = snapshot.score, "Mood snapshot appended");
        Ok(id)
    }

    fn recent_mood_snapshots(&self, limit: usize) -> StoreResult<Vec<MoodSnapshot>> {
        const TABLE: &str = "mood_snapshots";
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, created_at, score, tier, face, contributors_json
            FROM mood_snapshots ORDER BY id DESC LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map([limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i32>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut snapshots = Vec::new();
        for row in rows {
            let (id, created_at, score, tier, face, contributors_json) = row?;

            // History only: a bad row is skipped rather than failing the listing
            let parsed = parse_time(TABLE, &created_at).and_then(|created_at| {
                let tier = parse_label(TABLE, &tier)?;
                let contributors: Vec<MoodBuff> = serde_json::from_str(&contributors_json)?;
                Ok((created_at, tier, contributors))
            });

            match parsed {
                Ok((created_at, tier, contributors)) => snapshots.push(MoodSnapshot {
                    id,
                    score,
                    tier,
                    face,
                    contributors,
                    created_at,
                }),
                Err(e) => warn!(snapshot_id = id, error = %e, "Skipping unreadable mood snapshot"),
            }
        }

        Ok(snapshots)
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use moodbbs_api::{
        Difficulty, MoodThresholds, MoodTier, NewQuest, Origin, QuestCategory, QuestStatus,
        RenewalType, SnoozeContext, SnoozeReason,
    };

    fn at(day: u32, hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap()
    }

    fn sample_quest(id: i64) -> Quest {
        let new = NewQuest::new("Sunset at the pier", QuestCategory::Experiential, Difficulty::Medium, 25)
            .with_description("Bring a thermos")
            .with_location("Pier 39")
            .with_renewal(RenewalPolicy::new(RenewalType::Seasonal, 14).with_active_months([6, 7, 8]))
            .with_due_at(at(20, 20))
            .with_constraint("day_of_week", "fri,sat");
        Quest::from_new(QuestId::new(id), new, at(1, 9))
    }

    fn sample_event(id: i64, expires_at: Option<DateTime<Local>>) -> MoodEvent {
        MoodEvent {
            id: EventId::new(id),
            event_type: "fine_meal".into(),
            modifier: 5,
            description: Some("Ramen".into()),
            created_at: at(2, 12),
            expires_at,
            is_active: true,
        }
    }

    #[test]
    fn test_in_memory_store() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.is_healthy());
        assert!(store.load_quests().unwrap().is_empty());
        assert_eq!(store.get_total_xp().unwrap(), 0);
    }

    #[test]
    fn test_quest_round_trip_preserves_fields() {
        let store = SqliteStore::in_memory().unwrap();
        let mut quest = sample_quest(1);
        quest.status = QuestStatus::PendingRenewal;
        quest.completed_at = Some(at(3, 18));
        quest.next_eligible_renewal = Some(at(17, 18));
        quest.renewal_count = 2;
        quest.template_id = Some("sunset".into());

        store.save_quest(&quest).unwrap();
        let loaded = store.load_quests().unwrap();
        assert_eq!(loaded, vec![quest.clone()]);

        // Upsert replaces the row
        quest.status = QuestStatus::Active;
        quest.next_eligible_renewal = None;
        store.save_quest(&quest).unwrap();
        let loaded = store.load_quests().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].status, QuestStatus::Active);
        assert!(loaded[0].next_eligible_renewal.is_none());
    }

    #[test]
    fn test_quest_without_policy_or_constraint() {
        let store = SqliteStore::in_memory().unwrap();
        let quest = Quest::from_new(
            QuestId::new(7),
            NewQuest::new("Write a haiku", QuestCategory::Creative, Difficulty::Easy, 5),
            at(1, 8),
        );

        store.save_quest(&quest).unwrap();
        assert_eq!(store.load_quests().unwrap(), vec![quest]);
    }

    #[test]
    fn test_record_completion_is_atomic() {
        let store = SqliteStore::in_memory().unwrap();
        let quest = sample_quest(1);
        store.save_quest(&quest).unwrap();

        let completion = QuestCompletion {
            id: CompletionId::new(1),
            quest_id: quest.id,
            completed_at: at(5, 19),
            location_visited: Some("Pier 39".into()),
            duration_minutes: Some(45),
            notes: None,
            buffs: vec![MoodBuff::new("quest_completed", 5), MoodBuff::new("experiential_activity", 7)],
            xp_awarded: 25,
        };
        let events = vec![sample_event(1, Some(at(6, 19))), sample_event(2, None)];

        store.record_completion(&quest, &completion, &events, 25).unwrap();
        assert_eq!(store.load_completions().unwrap(), vec![completion.clone()]);
        assert_eq!(store.load_mood_events().unwrap(), events);
        assert_eq!(store.get_total_xp().unwrap(), 25);

        // Duplicate completion id aborts the whole transaction
        let mut changed = quest.clone();
        changed.title = "Changed".into();
        let err = store.record_completion(&changed, &completion, &[], 50);
        assert!(matches!(err, Err(StoreError::Database(_))));
        assert_eq!(store.get_total_xp().unwrap(), 25);
        assert_eq!(store.load_quests().unwrap()[0].title, "Sunset at the pier");
    }

    #[test]
    fn test_snooze_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        let mut context = SnoozeContext {
            weather: Some("storm".into()),
            mood_score: Some(-3),
            day_of_week: Some("Tuesday".into()),
            ..Default::default()
        };
        context.extra.insert("wind_kph".into(), serde_json::json!(60));

        let snooze = QuestSnooze {
            id: SnoozeId::new(1),
            quest_id: QuestId::new(4),
            snoozed_at: at(3, 10),
            return_at: at(10, 10),
            reason: Some("Too windy".into()),
            reason_category: SnoozeReason::Weather,
            context,
        };

        store.save_snooze(&snooze).unwrap();
        assert_eq!(store.load_snoozes().unwrap(), vec![snooze]);
    }

    #[test]
    fn test_record_snooze_is_atomic() {
        let store = SqliteStore::in_memory().unwrap();
        let mut quest = sample_quest(1);
        store.save_quest(&quest).unwrap();

        quest.status = QuestStatus::Snoozed;
        let snooze = QuestSnooze {
            id: SnoozeId::new(1),
            quest_id: quest.id,
            snoozed_at: at(3, 10),
            return_at: at(5, 10),
            reason: None,
            reason_category: SnoozeReason::Time,
            context: SnoozeContext::default(),
        };
        store.record_snooze(&quest, &snooze).unwrap();
        assert_eq!(store.load_quests().unwrap()[0].status, QuestStatus::Snoozed);

        // Reusing the snooze id rolls back the quest write as well
        let mut hidden = quest.clone();
        hidden.status = QuestStatus::Hidden;
        assert!(matches!(
            store.record_snooze(&hidden, &snooze),
            Err(StoreError::Database(_))
        ));
        assert_eq!(store.load_quests().unwrap()[0].status, QuestStatus::Snoozed);
        assert_eq!(store.load_snoozes().unwrap(), vec![snooze]);
    }

    #[test]
    fn test_save_quests_in_one_transaction() {
        let store = SqliteStore::in_memory().unwrap();
        let mut first = sample_quest(1);
        let mut second = sample_quest(2);
        store.save_quests(&[first.clone(), second.clone()]).unwrap();

        first.renewal_count = 3;
        second.status = QuestStatus::Hidden;
        store.save_quests(&[first, second]).unwrap();

        let loaded = store.load_quests().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].renewal_count, 3);
        assert_eq!(loaded[1].status, QuestStatus::Hidden);
    }

    #[test]
    fn test_mood_event_deactivation_persists() {
        let store = SqliteStore::in_memory().unwrap();
        let mut event = sample_event(3, None);
        store.save_mood_event(&event).unwrap();

        event.is_active = false;
        store.save_mood_event(&event).unwrap();

        let loaded = store.load_mood_events().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(!loaded[0].is_active);
    }

    #[test]
    fn test_traits() {
        let store = SqliteStore::in_memory().unwrap();
        let mut optimist = PersonalityTrait {
            id: TraitId::new(1),
            name: "optimist".into(),
            description: "Sees the bright side".into(),
            modifier: 5,
            is_active: true,
            category: Origin::Stock,
        };
        store.save_trait(&optimist).unwrap();

        optimist.is_active = false;
        store.save_trait(&optimist).unwrap();
        assert_eq!(store.load_traits().unwrap(), vec![optimist]);
    }

    #[test]
    fn test_total_xp() {
        let store = SqliteStore::in_memory().unwrap();
        store.set_total_xp(120).unwrap();
        store.set_total_xp(135).unwrap();
        assert_eq!(store.get_total_xp().unwrap(), 135);
    }

    #[test]
    fn test_mood_snapshots_newest_first() {
        let store = SqliteStore::in_memory().unwrap();
        let thresholds = MoodThresholds::default();

        for (i, score) in [3, 18, -7].into_iter().enumerate() {
            let tier = thresholds.tier(score);
            let snapshot = MoodSnapshot {
                id: 0,
                score,
                tier,
                face: tier.face().into(),
                contributors: vec![MoodBuff::new("fine_meal", score)],
                created_at: at(i as u32 + 1, 12),
            };
            let id = store.append_mood_snapshot(&snapshot).unwrap();
            assert_eq!(id, i as i64 + 1);
        }

        let recent = store.recent_mood_snapshots(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].score, -7);
        assert_eq!(recent[0].tier, MoodTier::Unhappy);
        assert_eq!(recent[1].tier, MoodTier::VeryHappy);
    }

    #[test]
    fn test_corrupt_quest_row_is_reported() {
        let store = SqliteStore::in_memory().unwrap();
        store.save_quest(&sample_quest(1)).unwrap();
        {
            let conn = store.lock().unwrap();
            conn.execute("UPDATE quests SET status = 'lost' WHERE id = 1", [])
                .unwrap();
        }

        let err = store.load_quests().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { table: "quests", .. }));
    }

    #[test]
    fn test_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moodbbs.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.save_quest(&sample_quest(1)).unwrap();
            store.set_total_xp(10).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.load_quests().unwrap().len(), 1);
        assert_eq!(store.get_total_xp().unwrap(), 10);
    }
}
