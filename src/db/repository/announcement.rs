use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::Audience;
use crate::models::Announcement;

pub fn insert_announcement(conn: &Connection, a: &Announcement) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO announcements (id, title, body, audience, published_by, published_at,
         expires_at, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            a.id.to_string(),
            a.title,
            a.body,
            a.audience.as_str(),
            a.published_by.map(|id| id.to_string()),
            format_timestamp(a.published_at),
            a.expires_at.map(format_timestamp),
            a.is_active as i32,
        ],
    )?;
    Ok(())
}

/// Announcements visible at `now` to any of `audiences`, newest first.
pub fn get_visible_announcements(
    conn: &Connection,
    audiences: &[Audience],
    now: NaiveDateTime,
    limit: u32,
) -> Result<Vec<Announcement>, DatabaseError> {
    let now = format_timestamp(now);
    let mut stmt = conn.prepare(
        "SELECT id, title, body, audience, published_by, published_at, expires_at, is_active
         FROM announcements
         WHERE is_active = 1
           AND published_at <= ?1
           AND (expires_at IS NULL OR expires_at > ?1)
         ORDER BY published_at DESC",
    )?;
    let rows = stmt.query_map(params![now], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, i32>(7)?,
        ))
    })?;

    let mut announcements = Vec::new();
    for row in rows {
        let (id, title, body, audience, published_by, published_at, expires_at, is_active) = row?;
        let audience = Audience::from_str(&audience)?;
        if !audiences.contains(&audience) {
            continue;
        }
        announcements.push(Announcement {
            id: parse_uuid(&id)?,
            title,
            body,
            audience,
            published_by: published_by.as_deref().map(parse_uuid).transpose()?,
            published_at: parse_timestamp(&published_at)?,
            expires_at: expires_at.as_deref().map(parse_timestamp).transpose()?,
            is_active: is_active != 0,
        });
        if announcements.len() as u32 >= limit {
            break;
        }
    }
    Ok(announcements)
}
