//! [`SqliteStore`] — the SQLite implementation of [`FactStore`] and
//! [`ProfileStore`].

use std::path::Path;

use chrono::{DateTime, NaiveDate, SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;
use tracing::{debug, info};
use uuid::Uuid;

use skillbridge_core::{
  DateRange,
  attendance::{AttendancePayload, AttendanceRecord},
  engagement::{EngagementRecord, NewEngagement},
  performance::{CategoryFilter, NewPerformance, PerformanceRecord},
  profile::{
    LearningProfile,
    Location,
    ProfileBundle,
    SkillLevel,
    SkillSnapshot,
    TeachingProfile,
  },
  store::{FactStore, ProfileStore},
};

use crate::{
  Result,
  encode::{
    RawAttendance, RawEngagement, RawLocation, RawPerformance, RawSkill,
    decode_uuid, encode_category, encode_date, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

/// Stored instants keep microsecond precision.
fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

// ─── Store ───────────────────────────────────────────────────────────────────

/// A skillbridge fact and profile store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Snapshot writes ───────────────────────────────────────────────────────

  /// Insert or replace the teaching profile of `user_id` for `skill_id`.
  pub async fn put_teaching_profile(
    &self,
    user_id: Uuid,
    skill_id: Uuid,
    profile: &TeachingProfile,
  ) -> Result<()> {
    let user_str  = encode_uuid(user_id);
    let skill_str = encode_uuid(skill_id);
    let profile   = profile.clone();

    self
      .conn
      .call(move |conn| {
        upsert_teaching(conn, &user_str, &skill_str, &profile)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert or replace the learning profile of `user_id` for `skill_id`.
  pub async fn put_learning_profile(
    &self,
    user_id: Uuid,
    skill_id: Uuid,
    profile: &LearningProfile,
  ) -> Result<()> {
    let user_str  = encode_uuid(user_id);
    let skill_str = encode_uuid(skill_id);
    let profile   = profile.clone();

    self
      .conn
      .call(move |conn| {
        upsert_learning(conn, &user_str, &skill_str, &profile)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn put_location(&self, user_id: Uuid, location: &Location) -> Result<()> {
    let user_str = encode_uuid(user_id);
    let location = location.clone();

    self
      .conn
      .call(move |conn| {
        upsert_location(conn, &user_str, &location)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn put_skill(&self, skill: &SkillSnapshot) -> Result<()> {
    let skill = skill.clone();

    self
      .conn
      .call(move |conn| {
        upsert_skill(conn, &skill)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Apply a whole snapshot bundle in one transaction.
  ///
  /// Returns the number of snapshots written.
  pub async fn import_profiles(&self, bundle: ProfileBundle) -> Result<usize> {
    let written = bundle.len();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for skill in &bundle.skills {
          upsert_skill(&tx, skill)?;
        }
        for entry in &bundle.teaching {
          upsert_teaching(
            &tx,
            &encode_uuid(entry.user_id),
            &encode_uuid(entry.skill_id),
            &entry.profile,
          )?;
        }
        for entry in &bundle.learning {
          upsert_learning(
            &tx,
            &encode_uuid(entry.user_id),
            &encode_uuid(entry.skill_id),
            &entry.profile,
          )?;
        }
        for entry in &bundle.locations {
          upsert_location(&tx, &encode_uuid(entry.user_id), &entry.location)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    info!(written, "imported profile snapshots");
    Ok(written)
  }
}

// ─── Snapshot statements ─────────────────────────────────────────────────────

fn upsert_teaching(
  conn: &rusqlite::Connection,
  user_id: &str,
  skill_id: &str,
  p: &TeachingProfile,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO teaching_profiles (user_id, skill_id, level, hours_taught, rating)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT(user_id, skill_id) DO UPDATE SET
       level        = excluded.level,
       hours_taught = excluded.hours_taught,
       rating       = excluded.rating",
    rusqlite::params![user_id, skill_id, p.level, p.hours_taught, p.rating],
  )?;
  Ok(())
}

fn upsert_learning(
  conn: &rusqlite::Connection,
  user_id: &str,
  skill_id: &str,
  p: &LearningProfile,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO learning_profiles
       (user_id, skill_id, current_level, target_level, total_sessions)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT(user_id, skill_id) DO UPDATE SET
       current_level  = excluded.current_level,
       target_level   = excluded.target_level,
       total_sessions = excluded.total_sessions",
    rusqlite::params![
      user_id,
      skill_id,
      p.current_level,
      p.target_level,
      p.total_sessions,
    ],
  )?;
  Ok(())
}

fn upsert_location(
  conn: &rusqlite::Connection,
  user_id: &str,
  location: &Location,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO locations (user_id, country, city) VALUES (?1, ?2, ?3)
     ON CONFLICT(user_id) DO UPDATE SET
       country = excluded.country,
       city    = excluded.city",
    rusqlite::params![user_id, location.country, location.city],
  )?;
  Ok(())
}

fn upsert_skill(
  conn: &rusqlite::Connection,
  skill: &SkillSnapshot,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO skills
       (skill_id, name, difficulty, industry_demand, total_learners, trending_score)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
     ON CONFLICT(skill_id) DO UPDATE SET
       name            = excluded.name,
       difficulty      = excluded.difficulty,
       industry_demand = excluded.industry_demand,
       total_learners  = excluded.total_learners,
       trending_score  = excluded.trending_score",
    rusqlite::params![
      encode_uuid(skill.skill_id),
      skill.name,
      skill.difficulty,
      skill.industry_demand,
      skill.total_learners,
      skill.trending_score,
    ],
  )?;
  Ok(())
}

// ─── FactStore impl ──────────────────────────────────────────────────────────

impl FactStore for SqliteStore {
  type Error = crate::Error;

  // ── Append-only writes ────────────────────────────────────────────────────

  async fn record_engagement(&self, input: NewEngagement) -> Result<EngagementRecord> {
    let occurred_at = input
      .occurred_at
      .map(|at| at.trunc_subsecs(6))
      .unwrap_or_else(now);
    let record = EngagementRecord::new(
      Uuid::new_v4(),
      input.subject_id,
      input.counterpart_id,
      occurred_at,
      input.activity,
    );

    let id_str          = encode_uuid(record.record_id);
    let subject_str     = encode_uuid(record.subject_id);
    let counterpart_str = encode_uuid(record.counterpart_id);
    let at_str          = encode_dt(record.occurred_at);
    let activity_json   = serde_json::to_string(&record.activity)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO engagement_records (
             record_id, subject_id, counterpart_id, occurred_at, activity_json
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, subject_str, counterpart_str, at_str, activity_json],
        )?;
        Ok(())
      })
      .await?;

    info!(
      record_id = %record.record_id,
      counterpart_id = %record.counterpart_id,
      engagement_score = record.engagement_score,
      "recorded engagement"
    );
    Ok(record)
  }

  async fn record_performance(&self, input: NewPerformance) -> Result<PerformanceRecord> {
    let recorded_at = input
      .recorded_at
      .map(|at| at.trunc_subsecs(6))
      .unwrap_or_else(now);
    let record = PerformanceRecord::new(Uuid::new_v4(), recorded_at, input)?;

    let id_str          = encode_uuid(record.record_id);
    let subject_str     = encode_uuid(record.subject_id);
    let counterpart_str = encode_uuid(record.counterpart_id);
    let category_str    = encode_category(record.category);
    let at_str          = encode_dt(record.recorded_at);
    let score           = record.score;
    let previous_score  = record.previous_score;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO performance_records (
             record_id, subject_id, counterpart_id, category,
             score, previous_score, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            subject_str,
            counterpart_str,
            category_str,
            score,
            previous_score,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    info!(
      record_id = %record.record_id,
      counterpart_id = %record.counterpart_id,
      grade = %record.grade,
      "recorded performance"
    );
    Ok(record)
  }

  // ── Upsert ────────────────────────────────────────────────────────────────

  async fn upsert_attendance(
    &self,
    subject_id: Uuid,
    counterpart_id: Uuid,
    date: NaiveDate,
    payload: AttendancePayload,
  ) -> Result<AttendanceRecord> {
    let record =
      AttendanceRecord::new(subject_id, counterpart_id, date, payload, now())?;

    let subject_str     = encode_uuid(subject_id);
    let counterpart_str = encode_uuid(counterpart_id);
    let date_str        = encode_date(date);
    let payload_json    = serde_json::to_string(&record.payload())?;
    let updated_str     = encode_dt(record.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO attendance_records (
             subject_id, counterpart_id, date, payload_json, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT(subject_id, counterpart_id, date) DO UPDATE SET
             payload_json = excluded.payload_json,
             updated_at   = excluded.updated_at",
          rusqlite::params![
            subject_str,
            counterpart_str,
            date_str,
            payload_json,
            updated_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    info!(
      %subject_id,
      %counterpart_id,
      %date,
      consistency_score = record.consistency_score(),
      "upserted attendance"
    );
    Ok(record)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn list_engagement(
    &self,
    counterpart_id: Uuid,
    range: DateRange,
  ) -> Result<Vec<EngagementRecord>> {
    let counterpart_str = encode_uuid(counterpart_id);
    let start_str       = encode_dt(range.start());
    let end_str         = encode_dt(range.end());

    let raws: Vec<RawEngagement> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT record_id, subject_id, counterpart_id, occurred_at, activity_json
           FROM engagement_records
           WHERE counterpart_id = ?1
             AND occurred_at >= ?2
             AND occurred_at <= ?3
           ORDER BY occurred_at, record_id",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![counterpart_str, start_str, end_str],
            |row| {
              Ok(RawEngagement {
                record_id:      row.get(0)?,
                subject_id:     row.get(1)?,
                counterpart_id: row.get(2)?,
                occurred_at:    row.get(3)?,
                activity_json:  row.get(4)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    debug!(%counterpart_id, rows = raws.len(), "listed engagement");
    raws.into_iter().map(RawEngagement::into_record).collect()
  }

  async fn list_performance(
    &self,
    counterpart_id: Uuid,
    range: DateRange,
    category: CategoryFilter,
  ) -> Result<Vec<PerformanceRecord>> {
    let counterpart_str = encode_uuid(counterpart_id);
    let start_str       = encode_dt(range.start());
    let end_str         = encode_dt(range.end());
    let category_str    = match category {
      CategoryFilter::All => None,
      CategoryFilter::Only(c) => Some(encode_category(c)),
    };

    let raws: Vec<RawPerformance> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT record_id, subject_id, counterpart_id, category,
                  score, previous_score, recorded_at
           FROM performance_records
           WHERE counterpart_id = ?1
             AND recorded_at >= ?2
             AND recorded_at <= ?3
             AND (?4 IS NULL OR category = ?4)
           ORDER BY recorded_at, record_id",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![counterpart_str, start_str, end_str, category_str],
            |row| {
              Ok(RawPerformance {
                record_id:      row.get(0)?,
                subject_id:     row.get(1)?,
                counterpart_id: row.get(2)?,
                category:       row.get(3)?,
                score:          row.get(4)?,
                previous_score: row.get(5)?,
                recorded_at:    row.get(6)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    debug!(%counterpart_id, %category, rows = raws.len(), "listed performance");
    raws.into_iter().map(RawPerformance::into_record).collect()
  }

  async fn list_attendance(
    &self,
    counterpart_id: Uuid,
    range: DateRange,
    subject_id: Option<Uuid>,
  ) -> Result<Vec<AttendanceRecord>> {
    let counterpart_str = encode_uuid(counterpart_id);
    let start_str       = encode_date(range.start_date());
    let end_str         = encode_date(range.end_date());
    let subject_str     = subject_id.map(encode_uuid);

    let raws: Vec<RawAttendance> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT subject_id, counterpart_id, date, payload_json, updated_at
           FROM attendance_records
           WHERE counterpart_id = ?1
             AND date >= ?2
             AND date <= ?3
             AND (?4 IS NULL OR subject_id = ?4)
           ORDER BY date, subject_id",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![counterpart_str, start_str, end_str, subject_str],
            |row| {
              Ok(RawAttendance {
                subject_id:     row.get(0)?,
                counterpart_id: row.get(1)?,
                date:           row.get(2)?,
                payload_json:   row.get(3)?,
                updated_at:     row.get(4)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    debug!(%counterpart_id, rows = raws.len(), "listed attendance");
    raws.into_iter().map(RawAttendance::into_record).collect()
  }
}

// ─── ProfileStore impl ───────────────────────────────────────────────────────

impl ProfileStore for SqliteStore {
  type Error = crate::Error;

  async fn get_teaching_profile(
    &self,
    user_id: Uuid,
    skill_id: Uuid,
  ) -> Result<Option<TeachingProfile>> {
    let user_str  = encode_uuid(user_id);
    let skill_str = encode_uuid(skill_id);

    let profile = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT level, hours_taught, rating FROM teaching_profiles
             WHERE user_id = ?1 AND skill_id = ?2",
            rusqlite::params![user_str, skill_str],
            |row| {
              Ok(TeachingProfile {
                level:        row.get(0)?,
                hours_taught: row.get(1)?,
                rating:       row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;
    Ok(profile)
  }

  async fn get_learning_profile(
    &self,
    user_id: Uuid,
    skill_id: Uuid,
  ) -> Result<Option<LearningProfile>> {
    let user_str  = encode_uuid(user_id);
    let skill_str = encode_uuid(skill_id);

    let profile = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT current_level, target_level, total_sessions FROM learning_profiles
             WHERE user_id = ?1 AND skill_id = ?2",
            rusqlite::params![user_str, skill_str],
            |row| {
              Ok(LearningProfile {
                current_level:  row.get(0)?,
                target_level:   row.get(1)?,
                total_sessions: row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;
    Ok(profile)
  }

  async fn get_location(&self, user_id: Uuid) -> Result<Option<Location>> {
    let user_str = encode_uuid(user_id);

    let raw: Option<RawLocation> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT country, city FROM locations WHERE user_id = ?1",
            rusqlite::params![user_str],
            |row| Ok(RawLocation { country: row.get(0)?, city: row.get(1)? }),
          )
          .optional()?)
      })
      .await?;
    Ok(raw.map(Location::from))
  }

  async fn list_tutors(&self, skill_id: Uuid) -> Result<Vec<Uuid>> {
    let skill_str = encode_uuid(skill_id);

    let ids: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id FROM teaching_profiles WHERE skill_id = ?1 ORDER BY user_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![skill_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    ids.iter().map(|s| decode_uuid(s)).collect()
  }

  async fn list_skills(&self) -> Result<Vec<SkillSnapshot>> {
    let raws: Vec<RawSkill> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT skill_id, name, difficulty, industry_demand, total_learners, trending_score
           FROM skills ORDER BY name, skill_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSkill {
              skill_id:        row.get(0)?,
              name:            row.get(1)?,
              difficulty:      row.get(2)?,
              industry_demand: row.get(3)?,
              total_learners:  row.get(4)?,
              trending_score:  row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSkill::into_snapshot).collect()
  }

  async fn current_skill_levels(&self, user_id: Uuid) -> Result<Vec<SkillLevel>> {
    let user_str = encode_uuid(user_id);

    let rows: Vec<(String, u8)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT skill_id, current_level FROM learning_profiles
           WHERE user_id = ?1 ORDER BY skill_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(skill_id, level)| {
        Ok(SkillLevel { skill_id: decode_uuid(&skill_id)?, level })
      })
      .collect()
  }
}
