use super::models::*;
use super::sqlite::Catalog;
use crate::error::{Error, Result};
use crate::hasher::digest::{normalize_sha256, FileInfo, HashKind};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

const SAMPLE_SELECT: &str = "SELECT s.id, s.name, s.type, s.size, s.md5, s.sha1, s.sha256, \
            s.sha512, s.crc32, s.ssdeep, s.created_at, p.sha256, \
            (SELECT GROUP_CONCAT(t.tag, ',') FROM sample_tag st \
             JOIN tag t ON t.id = st.tag_id WHERE st.sample_id = s.id) \
     FROM sample s \
     LEFT JOIN sample p ON p.id = s.parent_id";

fn row_to_sample(row: &Row<'_>) -> rusqlite::Result<Sample> {
    let tags: Option<String> = row.get(12)?;
    let mut tags: Vec<String> = tags
        .map(|t| t.split(',').map(str::to_string).collect())
        .unwrap_or_default();
    tags.sort();

    Ok(Sample {
        id: row.get(0)?,
        name: row.get(1)?,
        file_type: row.get(2)?,
        size: row.get(3)?,
        md5: row.get(4)?,
        sha1: row.get(5)?,
        sha256: row.get(6)?,
        sha512: row.get(7)?,
        crc32: row.get(8)?,
        ssdeep: row.get(9)?,
        created_at: row.get(10)?,
        parent: row.get(11)?,
        tags,
    })
}

fn query_samples<P: rusqlite::Params>(
    conn: &Connection,
    filter: &str,
    params: P,
) -> rusqlite::Result<Vec<Sample>> {
    let sql = format!("{} {}", SAMPLE_SELECT, filter);
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(params, row_to_sample)?;
    rows.collect()
}

/// Escapes the `LIKE` metacharacters of user input for use with `ESCAPE '\'`.
fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn sample_id(conn: &Connection, sha256: &str) -> Result<i64> {
    conn.query_row(
        "SELECT id FROM sample WHERE sha256 = ?1",
        params![sha256],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(format!("no sample with sha256 {}", sha256)))
}

fn attach_tags(conn: &Connection, sample_id: i64, tags: &[String]) -> rusqlite::Result<()> {
    let mut insert_tag = conn.prepare_cached("INSERT OR IGNORE INTO tag (tag) VALUES (?1)")?;
    let mut link = conn.prepare_cached(
        "INSERT OR IGNORE INTO sample_tag (sample_id, tag_id) \
         SELECT ?1, id FROM tag WHERE tag = ?2",
    )?;
    for tag in tags {
        insert_tag.execute(params![tag])?;
        link.execute(params![sample_id, tag])?;
    }
    Ok(())
}

impl Catalog {
    // ── Samples ──────────────────────────────────────────────────

    /// Inserts a sample with its initial tags in one transaction.
    /// A known sha256 is reported as [`Added::DuplicateDigest`], not as an error.
    pub fn add_sample(&self, info: &FileInfo, tags: Option<&str>) -> Result<Added> {
        let mut conn = self.connection();
        let tx = conn.transaction()?;

        let now = chrono::Utc::now().to_rfc3339();
        let inserted = tx.execute(
            "INSERT INTO sample \
             (name, type, size, md5, sha1, sha256, sha512, crc32, ssdeep, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                info.name,
                info.file_type,
                info.size as i64,
                info.md5,
                info.sha1,
                info.sha256,
                info.sha512,
                info.crc32,
                info.ssdeep,
                now,
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                debug!("{} already cataloged", info.sha256);
                return Ok(Added::DuplicateDigest);
            }
            Err(e) if is_constraint_violation(&e) => {
                return Err(Error::CatalogConstraint(e.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        let id = tx.last_insert_rowid();
        if let Some(tags) = tags {
            attach_tags(&tx, id, &split_tags(tags))?;
        }
        tx.commit()?;
        debug!("Cataloged {} as sample {}", info.sha256, id);
        Ok(Added::Created(id))
    }

    pub fn get_by_sha256(&self, sha256: &str) -> Result<Option<Sample>> {
        let sha256 = normalize_sha256(sha256)?;
        let conn = self.connection();
        let mut rows = query_samples(&conn, "WHERE s.sha256 = ?1", params![sha256])?;
        Ok(rows.pop())
    }

    /// Searches the catalog. An unknown key, or an empty value for any key
    /// other than `all`, matches nothing.
    pub fn find(&self, key: &str, value: &str) -> Result<Vec<Sample>> {
        let Some(key) = FindKey::parse(key) else {
            debug!("Unknown search key {:?}", key);
            return Ok(Vec::new());
        };
        let value = value.trim();
        if value.is_empty() && key != FindKey::All {
            return Ok(Vec::new());
        }

        let conn = self.connection();
        let rows = match key {
            FindKey::Md5 | FindKey::Sha1 | FindKey::Sha256 | FindKey::Sha512 => {
                let column = match key {
                    FindKey::Md5 => "md5",
                    FindKey::Sha1 => "sha1",
                    FindKey::Sha256 => "sha256",
                    _ => "sha512",
                };
                query_samples(
                    &conn,
                    &format!("WHERE s.{} = ?1 ORDER BY s.id", column),
                    params![value.to_ascii_lowercase()],
                )?
            }
            FindKey::Crc32 => query_samples(
                &conn,
                "WHERE s.crc32 = ?1 ORDER BY s.id",
                params![value.to_ascii_uppercase()],
            )?,
            FindKey::Ssdeep => query_samples(
                &conn,
                "WHERE s.ssdeep LIKE '%' || ?1 || '%' ESCAPE '\\' ORDER BY s.id",
                params![escape_like(value)],
            )?,
            FindKey::Name => {
                let escaped = escape_like(value);
                let pattern = if value.contains('*') {
                    escaped.replace('*', "%")
                } else {
                    format!("%{}%", escaped)
                };
                query_samples(
                    &conn,
                    "WHERE s.name LIKE ?1 ESCAPE '\\' ORDER BY s.id",
                    params![pattern],
                )?
            }
            FindKey::Tag => query_samples(
                &conn,
                "WHERE s.id IN (SELECT st.sample_id FROM sample_tag st \
                 JOIN tag t ON t.id = st.tag_id WHERE t.tag = ?1) ORDER BY s.id",
                params![value.to_lowercase()],
            )?,
            FindKey::All => query_samples(&conn, "ORDER BY s.id", [])?,
        };
        Ok(rows)
    }

    /// Looks a sample up by any supported hash. The hash length is validated
    /// before the catalog is touched.
    pub fn find_by_hash(&self, hash: &str) -> Result<Vec<Sample>> {
        let hash = hash.trim().to_ascii_lowercase();
        let kind = HashKind::from_hex(&hash)?;
        self.find(kind.column(), &hash)
    }

    /// The `n` most recently cataloged samples, newest first.
    pub fn list_latest(&self, n: usize) -> Result<Vec<Sample>> {
        let conn = self.connection();
        let rows = query_samples(
            &conn,
            "ORDER BY s.created_at DESC, s.id DESC LIMIT ?1",
            params![n as i64],
        )?;
        Ok(rows)
    }

    pub fn children(&self, sha256: &str) -> Result<Vec<Sample>> {
        let sha256 = normalize_sha256(sha256)?;
        let conn = self.connection();
        let rows = query_samples(
            &conn,
            "WHERE p.sha256 = ?1 ORDER BY s.id",
            params![sha256],
        )?;
        Ok(rows)
    }

    /// Deletes the row and its tag associations. Stored bytes are not touched.
    pub fn delete(&self, id: i64) -> Result<()> {
        let conn = self.connection();
        let removed = conn.execute("DELETE FROM sample WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(Error::NotFound(format!("no sample with id {}", id)));
        }
        debug!("Deleted sample {}", id);
        Ok(())
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.connection();
        Ok(conn.query_row("SELECT COUNT(*) FROM sample", [], |row| row.get(0))?)
    }

    // ── Tags ─────────────────────────────────────────────────────

    /// Tags in use with the number of samples carrying each, ordered by label.
    pub fn list_tags(&self) -> Result<Vec<TagCount>> {
        let conn = self.connection();
        let mut stmt = conn.prepare_cached(
            "SELECT t.tag, COUNT(st.sample_id) FROM tag t \
             JOIN sample_tag st ON st.tag_id = t.id \
             GROUP BY t.id ORDER BY t.tag",
        )?;
        let tags = stmt
            .query_map([], |row| {
                Ok(TagCount {
                    tag: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    /// Adds comma-separated tags to a sample. Existing associations are left as they are.
    pub fn add_tags(&self, sha256: &str, tags: &str) -> Result<()> {
        let sha256 = normalize_sha256(sha256)?;
        let mut conn = self.connection();
        let tx = conn.transaction()?;
        let id = sample_id(&tx, &sha256)?;
        attach_tags(&tx, id, &split_tags(tags))?;
        tx.commit()?;
        Ok(())
    }

    /// Removes one tag from a sample. Returns whether an association was removed.
    pub fn delete_tag(&self, sha256: &str, tag: &str) -> Result<bool> {
        let sha256 = normalize_sha256(sha256)?;
        let mut conn = self.connection();
        let tx = conn.transaction()?;
        let id = sample_id(&tx, &sha256)?;
        let removed = tx.execute(
            "DELETE FROM sample_tag WHERE sample_id = ?1 \
             AND tag_id = (SELECT id FROM tag WHERE tag = ?2)",
            params![id, tag.trim().to_lowercase()],
        )?;
        tx.execute(
            "DELETE FROM tag WHERE id NOT IN (SELECT tag_id FROM sample_tag)",
            [],
        )?;
        tx.commit()?;
        Ok(removed > 0)
    }

    // ── Parents ──────────────────────────────────────────────────

    /// Links `child` to `parent`. Both must be cataloged, and the link may
    /// not make a sample its own ancestor.
    pub fn add_parent(&self, child: &str, parent: &str) -> Result<()> {
        let child = normalize_sha256(child)?;
        let parent = normalize_sha256(parent)?;
        let mut conn = self.connection();
        let tx = conn.transaction()?;
        let child_id = sample_id(&tx, &child)?;
        let parent_id = sample_id(&tx, &parent)?;

        let cycle: bool = tx.query_row(
            "WITH RECURSIVE ancestor(id) AS ( \
                 SELECT ?1 \
                 UNION \
                 SELECT s.parent_id FROM sample s JOIN ancestor a ON s.id = a.id \
                 WHERE s.parent_id IS NOT NULL) \
             SELECT EXISTS (SELECT 1 FROM ancestor WHERE id = ?2)",
            params![parent_id, child_id],
            |row| row.get(0),
        )?;
        if cycle {
            return Err(Error::CatalogConstraint(format!(
                "{} is already an ancestor of {}",
                child, parent
            )));
        }

        tx.execute(
            "UPDATE sample SET parent_id = ?1 WHERE id = ?2",
            params![parent_id, child_id],
        )?;
        tx.commit()?;
        debug!("Parent of {} set to {}", child, parent);
        Ok(())
    }

    pub fn delete_parent(&self, child: &str) -> Result<()> {
        let child = normalize_sha256(child)?;
        let conn = self.connection();
        let id = sample_id(&conn, &child)?;
        conn.execute(
            "UPDATE sample SET parent_id = NULL WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }
}
