use serde::Serialize;

/// A cataloged sample. `parent` is the parent's sha256, resolved from the
/// internal foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sample {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub size: i64,
    pub md5: String,
    pub sha1: String,
    pub sha256: String,
    pub sha512: String,
    pub crc32: String,
    pub ssdeep: Option<String>,
    pub created_at: String,
    pub parent: Option<String>,
    pub tags: Vec<String>,
}

/// Result of inserting a sample row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Added {
    Created(i64),
    /// The sha256 is already cataloged; nothing was written.
    DuplicateDigest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

/// Search keys accepted by `Catalog::find`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindKey {
    Md5,
    Sha1,
    Sha256,
    Sha512,
    Crc32,
    Ssdeep,
    Tag,
    Name,
    All,
}

impl FindKey {
    pub const NAMES: [&'static str; 9] = [
        "md5", "sha1", "sha256", "sha512", "crc32", "ssdeep", "tag", "name", "all",
    ];

    pub fn parse(key: &str) -> Option<FindKey> {
        match key.trim().to_ascii_lowercase().as_str() {
            "md5" => Some(FindKey::Md5),
            "sha1" => Some(FindKey::Sha1),
            "sha256" => Some(FindKey::Sha256),
            "sha512" => Some(FindKey::Sha512),
            "crc32" => Some(FindKey::Crc32),
            "ssdeep" => Some(FindKey::Ssdeep),
            "tag" => Some(FindKey::Tag),
            "name" => Some(FindKey::Name),
            "all" => Some(FindKey::All),
            _ => None,
        }
    }
}

/// Splits a comma-delimited tag list into normalized, unique labels.
pub fn split_tags(csv: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in csv.split(',') {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_tags() {
        assert_eq!(split_tags("mal, Test,,mal "), vec!["mal", "test"]);
        assert!(split_tags(" , ").is_empty());
    }

    #[test]
    fn test_find_key_parse() {
        assert_eq!(FindKey::parse("SHA256"), Some(FindKey::Sha256));
        assert_eq!(FindKey::parse("bogus"), None);
        for name in FindKey::NAMES {
            assert!(FindKey::parse(name).is_some());
        }
    }
}
