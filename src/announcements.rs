//! Portal announcements.

use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::MAX_WINDOW_DAYS;
use crate::db::{self, DatabaseError};
use crate::error::WorkflowError;
use crate::models::enums::Audience;
use crate::models::{Announcement, User};

#[derive(Debug, Clone, Deserialize)]
pub struct NewAnnouncement {
    pub title: String,
    pub body: String,
    #[serde(default = "default_audience")]
    pub audience: Audience,
    /// Days until the announcement stops showing; `None` keeps it up.
    #[serde(default)]
    pub expires_in_days: Option<i64>,
}

fn default_audience() -> Audience {
    Audience::All
}

/// Active, published, unexpired announcements for `audience`, newest first.
/// BHWs also see announcements addressed to everyone.
pub fn active_announcements(
    conn: &Connection,
    audience: Audience,
    now: NaiveDateTime,
    limit: u32,
) -> Result<Vec<Announcement>, DatabaseError> {
    let audiences: &[Audience] = match audience {
        Audience::All => &[Audience::All],
        Audience::Bhw => &[Audience::All, Audience::Bhw],
    };
    db::get_visible_announcements(conn, audiences, now, limit)
}

pub fn publish_announcement(
    conn: &Connection,
    actor: &User,
    form: &NewAnnouncement,
    now: NaiveDateTime,
) -> Result<Announcement, WorkflowError> {
    if !actor.is_admin() {
        return Err(WorkflowError::Forbidden("Only administrators can publish announcements"));
    }
    let title = form.title.trim();
    let body = form.body.trim();
    if title.is_empty() || body.is_empty() {
        return Err(WorkflowError::Validation("Title and body are required".into()));
    }
    let expires_at = match form.expires_in_days {
        Some(days) if days <= 0 => {
            return Err(WorkflowError::Validation("Expiry must be at least one day away".into()))
        }
        Some(days) if days > MAX_WINDOW_DAYS => {
            return Err(WorkflowError::Validation(format!(
                "Expiry cannot be more than {MAX_WINDOW_DAYS} days away"
            )))
        }
        Some(days) => Some(now + Duration::days(days)),
        None => None,
    };

    let announcement = Announcement {
        id: Uuid::new_v4(),
        title: title.to_string(),
        body: body.to_string(),
        audience: form.audience,
        published_by: Some(actor.id),
        published_at: now,
        expires_at,
        is_active: true,
    };
    db::insert_announcement(conn, &announcement)?;
    tracing::info!(
        announcement_id = %announcement.id,
        audience = %announcement.audience,
        "Announcement published"
    );
    Ok(announcement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::UserRole;

    fn form(title: &str, audience: Audience, expires_in_days: Option<i64>) -> NewAnnouncement {
        NewAnnouncement {
            title: title.into(),
            body: "Bring your senior ID.".into(),
            audience,
            expires_in_days,
        }
    }

    #[test]
    fn bhw_sees_all_and_bhw_audiences() {
        let conn = open_memory_database().unwrap();
        let admin = make_user(&conn, UserRole::Admin, "Municipal", None);
        let public = form("Public", Audience::All, None);
        publish_announcement(&conn, &admin, &public, at(date(2026, 10, 1), 8)).unwrap();
        let staff = form("Staff", Audience::Bhw, None);
        publish_announcement(&conn, &admin, &staff, at(date(2026, 10, 2), 8)).unwrap();

        let now = at(date(2026, 10, 19), 8);
        let bhw_view = active_announcements(&conn, Audience::Bhw, now, 10).unwrap();
        let titles: Vec<&str> = bhw_view.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Staff", "Public"]);

        let public = active_announcements(&conn, Audience::All, now, 10).unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(active_announcements(&conn, Audience::Bhw, now, 1).unwrap().len(), 1);
    }

    #[test]
    fn expired_and_future_announcements_are_hidden() {
        let conn = open_memory_database().unwrap();
        let admin = make_user(&conn, UserRole::Admin, "Municipal", None);
        let short = form("Short", Audience::All, Some(3));
        publish_announcement(&conn, &admin, &short, at(date(2026, 10, 1), 8)).unwrap();
        let later = form("Later", Audience::All, None);
        publish_announcement(&conn, &admin, &later, at(date(2026, 10, 25), 8)).unwrap();

        let now = at(date(2026, 10, 19), 8);
        let visible = active_announcements(&conn, Audience::Bhw, now, 10).unwrap();
        assert!(visible.is_empty());
    }

    #[test]
    fn publish_is_admin_only_and_validated() {
        let conn = open_memory_database().unwrap();
        let bhw = make_user(&conn, UserRole::Bhw, "San Isidro", None);
        let admin = make_user(&conn, UserRole::Admin, "Municipal", None);
        let now = at(date(2026, 10, 19), 8);

        assert!(matches!(
            publish_announcement(&conn, &bhw, &form("Hi", Audience::All, None), now),
            Err(WorkflowError::Forbidden(_))
        ));
        assert!(matches!(
            publish_announcement(&conn, &admin, &form("  ", Audience::All, None), now),
            Err(WorkflowError::Validation(_))
        ));
        assert!(matches!(
            publish_announcement(&conn, &admin, &form("Hi", Audience::All, Some(0)), now),
            Err(WorkflowError::Validation(_))
        ));
        assert!(matches!(
            publish_announcement(&conn, &admin, &form("Hi", Audience::All, Some(i64::MAX)), now),
            Err(WorkflowError::Validation(_))
        ));
        let longest = form("Hi", Audience::All, Some(MAX_WINDOW_DAYS));
        assert!(publish_announcement(&conn, &admin, &longest, now).is_ok());
    }
}
