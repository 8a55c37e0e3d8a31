//! Character-set catalog.
//!
//! A small static table mapping the charset/collation names accepted by
//! `ConnectionOptions` to the numeric charset id sent in the handshake
//! response packet. Not exhaustive: covers the charsets a client actually
//! negotiates in practice, not the full MySQL collation list.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharsetInfo {
    pub id: u8,
    pub name: &'static str,
    pub collation: &'static str,
    pub max_len: u8,
}

const CHARSETS: &[CharsetInfo] = &[
    CharsetInfo {
        id: 8,
        name: "latin1",
        collation: "latin1_swedish_ci",
        max_len: 1,
    },
    CharsetInfo {
        id: 11,
        name: "ascii",
        collation: "ascii_general_ci",
        max_len: 1,
    },
    CharsetInfo {
        id: 33,
        name: "utf8",
        collation: "utf8_general_ci",
        max_len: 3,
    },
    CharsetInfo {
        id: 45,
        name: "utf8mb4",
        collation: "utf8mb4_general_ci",
        max_len: 4,
    },
    CharsetInfo {
        id: 46,
        name: "utf8mb4",
        collation: "utf8mb4_bin",
        max_len: 4,
    },
    CharsetInfo {
        id: 63,
        name: "binary",
        collation: "binary",
        max_len: 1,
    },
    CharsetInfo {
        id: 224,
        name: "utf8mb4",
        collation: "utf8mb4_unicode_ci",
        max_len: 4,
    },
    CharsetInfo {
        id: 255,
        name: "utf8mb4",
        collation: "utf8mb4_0900_ai_ci",
        max_len: 4,
    },
];

/// Default charset used when `ConnectionOptions` leaves it unset, matching
/// the connector default (`utf8mb4_general_ci`).
pub const DEFAULT_CHARSET_ID: u8 = 45;

pub fn charset_by_id(id: u8) -> Option<CharsetInfo> {
    CHARSETS.iter().copied().find(|c| c.id == id)
}

/// Resolves a charset id from a name and an optional collation. If
/// `collation` is `None`, returns the first (lowest-id) match for `name`.
pub fn charset_by_name(name: &str, collation: Option<&str>) -> Option<CharsetInfo> {
    CHARSETS.iter().copied().find(|c| {
        c.name.eq_ignore_ascii_case(name)
            && collation.map_or(true, |coll| c.collation.eq_ignore_ascii_case(coll))
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn resolves_utf8mb4_default() {
        let info = charset_by_name("utf8mb4", None).unwrap();
        assert_eq!(info.id, DEFAULT_CHARSET_ID);
    }

    #[test]
    fn resolves_exact_collation() {
        let info = charset_by_name("utf8mb4", Some("utf8mb4_bin")).unwrap();
        assert_eq!(info.id, 46);
    }

    #[test]
    fn unknown_charset_is_none() {
        assert!(charset_by_name("klingon1", None).is_none());
    }
}
