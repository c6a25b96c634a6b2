//! Static canon tables: volumes, books, abbreviations and canonical order.
//!
//! The tables are compile-time data. Position in [`BOOKS`] defines the
//! canonical citation order, volume by volume.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level grouping of books, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Volume {
    #[serde(rename = "Old Testament")]
    OldTestament,
    #[serde(rename = "New Testament")]
    NewTestament,
    #[serde(rename = "Book of Mormon")]
    BookOfMormon,
    #[serde(rename = "Doctrine and Covenants")]
    DoctrineAndCovenants,
    #[serde(rename = "Pearl of Great Price")]
    PearlOfGreatPrice,
    #[serde(rename = "Study Helps")]
    StudyHelps,
}

impl Volume {
    pub const ALL: [Volume; 6] = [
        Volume::OldTestament,
        Volume::NewTestament,
        Volume::BookOfMormon,
        Volume::DoctrineAndCovenants,
        Volume::PearlOfGreatPrice,
        Volume::StudyHelps,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::OldTestament => "Old Testament",
            Self::NewTestament => "New Testament",
            Self::BookOfMormon => "Book of Mormon",
            Self::DoctrineAndCovenants => "Doctrine and Covenants",
            Self::PearlOfGreatPrice => "Pearl of Great Price",
            Self::StudyHelps => "Study Helps",
        }
    }

    pub fn short(&self) -> &'static str {
        match self {
            Self::OldTestament => "OT",
            Self::NewTestament => "NT",
            Self::BookOfMormon => "BoM",
            Self::DoctrineAndCovenants => "D&C",
            Self::PearlOfGreatPrice => "PoGP",
            Self::StudyHelps => "SH",
        }
    }

    /// Books of this volume in canonical order.
    pub fn books(&self) -> impl Iterator<Item = BookCode> + '_ {
        BookCode::all().filter(move |b| b.volume() == *self)
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the canon table.
#[derive(Debug)]
pub struct BookInfo {
    /// Full name as it appears in page headers.
    pub name: &'static str,
    /// Citation abbreviation, used in node keys.
    pub abbrev: &'static str,
    pub volume: Volume,
}

const fn book(name: &'static str, abbrev: &'static str, volume: Volume) -> BookInfo {
    BookInfo {
        name,
        abbrev,
        volume,
    }
}

use Volume::*;

/// Every citable book, in canonical order. `OD` is deliberately absent.
pub static BOOKS: &[BookInfo] = &[
    book("Genesis", "Gen.", OldTestament),
    book("Exodus", "Ex.", OldTestament),
    book("Leviticus", "Lev.", OldTestament),
    book("Numbers", "Num.", OldTestament),
    book("Deuteronomy", "Deut.", OldTestament),
    book("Joshua", "Josh.", OldTestament),
    book("Judges", "Judg.", OldTestament),
    book("Ruth", "Ruth", OldTestament),
    book("1 Samuel", "1 Sam.", OldTestament),
    book("2 Samuel", "2 Sam.", OldTestament),
    book("1 Kings", "1 Kgs.", OldTestament),
    book("2 Kings", "2 Kgs.", OldTestament),
    book("1 Chronicles", "1 Chr.", OldTestament),
    book("2 Chronicles", "2 Chr.", OldTestament),
    book("Ezra", "Ezra", OldTestament),
    book("Nehemiah", "Neh.", OldTestament),
    book("Esther", "Esth.", OldTestament),
    book("Job", "Job", OldTestament),
    book("Psalms", "Ps.", OldTestament),
    book("Proverbs", "Prov.", OldTestament),
    book("Ecclesiastes", "Eccl.", OldTestament),
    book("Song of Solomon", "Song.", OldTestament),
    book("Isaiah", "Isa.", OldTestament),
    book("Jeremiah", "Jer.", OldTestament),
    book("Lamentations", "Lam.", OldTestament),
    book("Ezekiel", "Ezek.", OldTestament),
    book("Daniel", "Dan.", OldTestament),
    book("Hosea", "Hosea", OldTestament),
    book("Joel", "Joel", OldTestament),
    book("Amos", "Amos", OldTestament),
    book("Obadiah", "Obad.", OldTestament),
    book("Jonah", "Jonah", OldTestament),
    book("Micah", "Micah", OldTestament),
    book("Nahum", "Nahum", OldTestament),
    book("Habakkuk", "Hab.", OldTestament),
    book("Zephaniah", "Zeph.", OldTestament),
    book("Haggai", "Hag.", OldTestament),
    book("Zechariah", "Zech.", OldTestament),
    book("Malachi", "Mal.", OldTestament),
    book("Matthew", "Matt.", NewTestament),
    book("Mark", "Mark", NewTestament),
    book("Luke", "Luke", NewTestament),
    book("John", "John", NewTestament),
    book("Acts", "Acts", NewTestament),
    book("Romans", "Rom.", NewTestament),
    book("1 Corinthians", "1 Cor.", NewTestament),
    book("2 Corinthians", "2 Cor.", NewTestament),
    book("Galatians", "Gal.", NewTestament),
    book("Ephesians", "Eph.", NewTestament),
    book("Philippians", "Philip.", NewTestament),
    book("Colossians", "Col.", NewTestament),
    book("1 Thessalonians", "1 Thes.", NewTestament),
    book("2 Thessalonians", "2 Thes.", NewTestament),
    book("1 Timothy", "1 Tim.", NewTestament),
    book("2 Timothy", "2 Tim.", NewTestament),
    book("Titus", "Titus", NewTestament),
    book("Philemon", "Philem.", NewTestament),
    book("Hebrews", "Heb.", NewTestament),
    book("James", "James", NewTestament),
    book("1 Peter", "1 Pet.", NewTestament),
    book("2 Peter", "2 Pet.", NewTestament),
    book("1 John", "1 Jn.", NewTestament),
    book("2 John", "2 Jn.", NewTestament),
    book("3 John", "3 Jn.", NewTestament),
    book("Jude", "Jude", NewTestament),
    book("Revelation", "Rev.", NewTestament),
    book("1 Nephi", "1 Ne.", BookOfMormon),
    book("2 Nephi", "2 Ne.", BookOfMormon),
    book("Jacob", "Jacob", BookOfMormon),
    book("Enos", "Enos", BookOfMormon),
    book("Jarom", "Jarom", BookOfMormon),
    book("Omni", "Omni", BookOfMormon),
    book("Words of Mormon", "W of M", BookOfMormon),
    book("Mosiah", "Mosiah", BookOfMormon),
    book("Alma", "Alma", BookOfMormon),
    book("Helaman", "Hel.", BookOfMormon),
    book("3 Nephi", "3 Ne.", BookOfMormon),
    book("4 Nephi", "4 Ne.", BookOfMormon),
    book("Mormon", "Morm.", BookOfMormon),
    book("Ether", "Ether", BookOfMormon),
    book("Moroni", "Moro.", BookOfMormon),
    book("Doctrine and Covenants", "D&C", DoctrineAndCovenants),
    book("Moses", "Moses", PearlOfGreatPrice),
    book("Abraham", "Abr.", PearlOfGreatPrice),
    book("Joseph Smith—Matthew", "JS—M", PearlOfGreatPrice),
    book("Joseph Smith—History", "JS—H", PearlOfGreatPrice),
    book("Articles of Faith", "A of F", PearlOfGreatPrice),
    book("Bible Dictionary", "BD", StudyHelps),
    book("History of the Church", "HC", StudyHelps),
    book("Joseph Smith Translation", "JST", StudyHelps),
    book("Topical Guide", "TG", StudyHelps),
    book("Index to the Triple Combination", "ITC", StudyHelps),
];

/// A canonical book abbreviation. Ordered by canonical position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct BookCode(u8);

impl BookCode {
    /// Look up a citation abbreviation such as `"1 Ne."` or `"D&C"`.
    pub fn from_abbrev(abbrev: &str) -> Option<Self> {
        BOOKS
            .iter()
            .position(|b| b.abbrev == abbrev)
            .map(|i| Self(i as u8))
    }

    /// Look up a full book name such as `"Song of Solomon"`.
    pub fn from_name(name: &str) -> Option<Self> {
        BOOKS
            .iter()
            .position(|b| b.name == name)
            .map(|i| Self(i as u8))
    }

    pub fn all() -> impl Iterator<Item = BookCode> {
        (0..BOOKS.len()).map(|i| Self(i as u8))
    }

    fn info(&self) -> &'static BookInfo {
        &BOOKS[self.0 as usize]
    }

    pub fn abbrev(&self) -> &'static str {
        self.info().abbrev
    }

    pub fn name(&self) -> &'static str {
        self.info().name
    }

    pub fn volume(&self) -> Volume {
        self.info().volume
    }

    /// Position in the canonical order across all volumes.
    pub fn order(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BookCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

impl fmt::Debug for BookCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BookCode({})", self.abbrev())
    }
}

impl From<BookCode> for String {
    fn from(code: BookCode) -> Self {
        code.abbrev().to_string()
    }
}

impl TryFrom<String> for BookCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        BookCode::from_abbrev(&value).ok_or_else(|| format!("unknown book abbreviation \"{value}\""))
    }
}

/// Canonical sort key for a verse: `(book order, chapter, verse)`.
pub fn verse_sort_key(book: BookCode, chapter: u32, verse: u32) -> (usize, u32, u32) {
    (book.order(), chapter, verse)
}

/// Parse a verse key such as `"1 Ne. 3:7"` into its sort key.
pub fn parse_verse_key(key: &str) -> Option<(usize, u32, u32)> {
    let (book, reference) = key.rsplit_once(' ')?;
    let (chapter, verse) = reference.split_once(':')?;
    Some(verse_sort_key(
        BookCode::from_abbrev(book)?,
        chapter.parse().ok()?,
        verse.parse().ok()?,
    ))
}

/// Sort verse keys in canonical order. Keys that are not verses sort last,
/// alphabetically.
pub fn sort_verse_keys<K: AsRef<str>>(keys: &mut [K]) {
    keys.sort_by(|a, b| {
        let (a, b) = (a.as_ref(), b.as_ref());
        match (parse_verse_key(a), parse_verse_key(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviations_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for b in BOOKS {
            assert!(seen.insert(b.abbrev), "duplicate abbreviation {}", b.abbrev);
        }
    }

    #[test]
    fn book_lookup_by_name_and_abbrev() {
        let song = BookCode::from_name("Song of Solomon").unwrap();
        assert_eq!(song.abbrev(), "Song.");
        assert_eq!(BookCode::from_abbrev("JS—H").unwrap().name(), "Joseph Smith—History");
        assert_eq!(BookCode::from_abbrev("D&C").unwrap().volume(), Volume::DoctrineAndCovenants);
        assert!(BookCode::from_abbrev("OD").is_none());
    }

    #[test]
    fn canonical_order_follows_volumes() {
        let genesis = BookCode::from_abbrev("Gen.").unwrap();
        let matt = BookCode::from_abbrev("Matt.").unwrap();
        let moro = BookCode::from_abbrev("Moro.").unwrap();
        let dc = BookCode::from_abbrev("D&C").unwrap();
        assert!(genesis < matt && matt < moro && moro < dc);

        let mut last = Volume::OldTestament;
        for code in BookCode::all() {
            assert!(code.volume() >= last);
            last = code.volume();
        }
    }

    #[test]
    fn volume_membership() {
        assert_eq!(Volume::OldTestament.books().count(), 39);
        assert_eq!(Volume::NewTestament.books().count(), 27);
        assert_eq!(Volume::BookOfMormon.books().count(), 15);
        assert_eq!(Volume::DoctrineAndCovenants.books().count(), 1);
        assert_eq!(Volume::PearlOfGreatPrice.books().count(), 5);
        assert_eq!(Volume::StudyHelps.books().count(), 5);
    }

    #[test]
    fn book_code_serializes_as_abbreviation() {
        let code = BookCode::from_abbrev("1 Ne.").unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"1 Ne.\"");
        let back: BookCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code);
        assert!(serde_json::from_str::<BookCode>("\"Hezekiah\"").is_err());
    }

    #[test]
    fn verse_keys_sort_canonically() {
        let mut keys = vec!["TG Faith", "Moro. 10:4", "Gen. 1:10", "Gen. 1:2", "1 Ne. 3:7", "Matt. 5:3"];
        sort_verse_keys(&mut keys);
        assert_eq!(
            keys,
            vec!["Gen. 1:2", "Gen. 1:10", "Matt. 5:3", "1 Ne. 3:7", "Moro. 10:4", "TG Faith"]
        );
        assert!(parse_verse_key("TG Faith").is_none());
        assert!(parse_verse_key("JS—H 1:19").is_some());
    }
}
