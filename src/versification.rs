//! Versification tables and the passage model (`Verse`, `VerseRange`, `Passage`).
//!
//! A [`Versification`] is an ordered list of books, each with the number of verses in every
//! chapter. Verses are addressed either by (book, chapter, verse) or by their *ordinal*: the
//! position of the verse in a flat walk of the whole versification, where every chapter also
//! owns a verse `0` (the chapter introduction). Ordinals are what the web renderer uses as
//! verse anchors (`v-<ordinal>`), so they must be stable for a given versification.
//!
//! References are accepted in OSIS form (`Gen.1.1-Gen.1.5`, `Rev.22`) and in the human form
//! (`Gen 1:1-5`, `1 John 3:16; Ps 23`). Multiple references may be separated by `;` or `,`, and
//! OSIS references may also be whitespace separated.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
    sync::Arc,
};

use crate::error::AndBibleError;

static SINGLE_REF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?P<book>[1-4]?\s*[A-Za-z][A-Za-z ]*?)[\s.]*)?(?P<ch>\d+)?(?:(?P<sep>[:.])(?P<v>\d+))?$",
    )
    .expect("static regex")
});

/// One book of a versification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInfo {
    /// OSIS book id, e.g. `Gen`, `1John`.
    pub osis: String,
    /// Short display name, e.g. `Gen`, `1 John`.
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Verse count of every chapter; `verses[0]` is chapter 1.
    pub verses: Vec<u16>,
}

impl BookInfo {
    pub fn new(osis: &str, name: &str, verses: &[u16]) -> Self {
        BookInfo {
            osis: osis.to_string(),
            name: name.to_string(),
            aliases: Vec::new(),
            verses: verses.to_vec(),
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn chapter_count(&self) -> u16 {
        self.verses.len() as u16
    }

    pub fn verse_count(&self, chapter: u16) -> Option<u16> {
        if chapter == 0 {
            return None;
        }
        self.verses.get(chapter as usize - 1).copied()
    }
}

fn normalize_book_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .flat_map(char::to_lowercase)
        .collect()
}

/// A named versification system (e.g. `KJV`, `Synodal`).
#[derive(Debug, Clone)]
pub struct Versification {
    name: String,
    books: Vec<BookInfo>,
    lookup: HashMap<String, usize>,
    /// Ordinal of verse 0 of every chapter, per book.
    chapter_offsets: Vec<Vec<u32>>,
    ordinal_count: u32,
}

impl PartialEq for Versification {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Versification {}

impl Versification {
    pub fn new(name: &str, books: Vec<BookInfo>) -> Self {
        let mut lookup = HashMap::new();
        let mut chapter_offsets = Vec::with_capacity(books.len());
        let mut next = 0u32;
        for (idx, book) in books.iter().enumerate() {
            for token in [&book.osis, &book.name].into_iter().chain(book.aliases.iter()) {
                lookup.entry(normalize_book_token(token)).or_insert(idx);
            }
            let mut offsets = Vec::with_capacity(book.verses.len());
            for count in book.verses.iter() {
                offsets.push(next);
                next += *count as u32 + 1;
            }
            chapter_offsets.push(offsets);
        }
        Versification {
            name: name.to_string(),
            books,
            lookup,
            chapter_offsets,
            ordinal_count: next,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn books(&self) -> &[BookInfo] {
        &self.books
    }

    pub fn book(&self, idx: usize) -> Option<&BookInfo> {
        self.books.get(idx)
    }

    /// Number of ordinals (verses plus chapter introductions) in this versification.
    pub fn ordinal_count(&self) -> u32 {
        self.ordinal_count
    }

    /// Find a book by OSIS id, name, alias, or a unique prefix of any of those.
    pub fn find_book(&self, token: &str) -> Option<usize> {
        let norm = normalize_book_token(token);
        if norm.is_empty() {
            return None;
        }
        if let Some(idx) = self.lookup.get(&norm) {
            return Some(*idx);
        }
        if norm.len() < 2 {
            return None;
        }
        let mut candidates = self
            .lookup
            .iter()
            .filter(|(k, _)| k.starts_with(&norm))
            .map(|(_, idx)| *idx)
            .collect::<Vec<usize>>();
        candidates.sort_unstable();
        candidates.dedup();
        match candidates.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn book_by_osis(&self, osis: &str) -> Option<usize> {
        self.books.iter().position(|b| b.osis == osis)
    }

    fn ordinal_of(&self, book: usize, chapter: u16, verse: u16) -> u32 {
        self.chapter_offsets[book][chapter as usize - 1] + verse as u32
    }

    fn locate(&self, ordinal: u32) -> Option<(usize, u16, u16)> {
        if ordinal >= self.ordinal_count {
            return None;
        }
        for (book_idx, offsets) in self.chapter_offsets.iter().enumerate() {
            let Some(last) = offsets.last() else {
                continue;
            };
            let last_count = *self.books[book_idx].verses.last().unwrap_or(&0) as u32;
            if ordinal > last + last_count {
                continue;
            }
            let chapter_idx = match offsets.binary_search(&ordinal) {
                Ok(idx) => idx,
                Err(idx) => idx - 1,
            };
            let verse = ordinal - offsets[chapter_idx];
            return Some((book_idx, chapter_idx as u16 + 1, verse as u16));
        }
        None
    }
}

/// A single verse within a versification.
#[derive(Debug, Clone)]
pub struct Verse {
    v11n: Arc<Versification>,
    book: usize,
    chapter: u16,
    verse: u16,
}

impl PartialEq for Verse {
    fn eq(&self, other: &Self) -> bool {
        self.v11n.name == other.v11n.name
            && self.book == other.book
            && self.chapter == other.chapter
            && self.verse == other.verse
    }
}

impl Eq for Verse {}

impl Verse {
    /// Build a verse, validating chapter and verse against the versification. Verse `0` (the
    /// chapter introduction) is accepted.
    pub fn new(
        v11n: &Arc<Versification>,
        book: usize,
        chapter: u16,
        verse: u16,
    ) -> Result<Verse, AndBibleError> {
        let info = v11n.book(book).ok_or_else(|| {
            AndBibleError::MalformedReference(format!("book index {book} not in {}", v11n.name))
        })?;
        let count = info.verse_count(chapter).ok_or_else(|| {
            AndBibleError::MalformedReference(format!(
                "{} has no chapter {chapter} in {}",
                info.osis, v11n.name
            ))
        })?;
        if verse > count {
            return Err(AndBibleError::MalformedReference(format!(
                "{} {chapter} has no verse {verse} in {}",
                info.osis, v11n.name
            )));
        }
        Ok(Verse {
            v11n: v11n.clone(),
            book,
            chapter,
            verse,
        })
    }

    pub fn from_ordinal(v11n: &Arc<Versification>, ordinal: u32) -> Option<Verse> {
        let (book, chapter, verse) = v11n.locate(ordinal)?;
        Some(Verse {
            v11n: v11n.clone(),
            book,
            chapter,
            verse,
        })
    }

    pub fn versification(&self) -> &Arc<Versification> {
        &self.v11n
    }

    pub fn book(&self) -> usize {
        self.book
    }

    pub fn book_info(&self) -> &BookInfo {
        &self.v11n.books[self.book]
    }

    pub fn chapter(&self) -> u16 {
        self.chapter
    }

    pub fn verse(&self) -> u16 {
        self.verse
    }

    pub fn ordinal(&self) -> u32 {
        self.v11n.ordinal_of(self.book, self.chapter, self.verse)
    }

    pub fn chapter_verse(&self) -> ChapterVerse {
        ChapterVerse {
            chapter: self.chapter,
            verse: self.verse,
        }
    }

    /// Map this verse into another versification by OSIS book id, clamping chapter and verse to
    /// what the target defines. A book missing from the target, or one it defines with no
    /// chapters, leaves the verse unchanged.
    pub fn to_v11n(&self, target: &Arc<Versification>) -> Verse {
        if self.v11n.name == target.name {
            return self.clone();
        }
        let Some(book) = target.book_by_osis(&self.book_info().osis) else {
            tracing::warn!(
                "[Verse::to_v11n] {} does not exist in {}, keeping {}",
                self.book_info().osis,
                target.name,
                self.v11n.name
            );
            return self.clone();
        };
        let info = &target.books[book];
        if info.chapter_count() == 0 {
            tracing::warn!(
                "[Verse::to_v11n] {} has no chapters in {}, keeping {}",
                info.osis,
                target.name,
                self.v11n.name
            );
            return self.clone();
        }
        let chapter = self.chapter.clamp(1, info.chapter_count());
        let verse = self.verse.min(info.verse_count(chapter).unwrap_or(0));
        Verse {
            v11n: target.clone(),
            book,
            chapter,
            verse,
        }
    }

    pub fn osis_ref(&self) -> String {
        format!("{}.{}.{}", self.book_info().osis, self.chapter, self.verse)
    }

    pub fn name(&self) -> String {
        format!("{} {}:{}", self.book_info().name, self.chapter, self.verse)
    }
}

impl Display for Verse {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Chapter and verse without a book, as used for verse highlighting in the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChapterVerse {
    pub chapter: u16,
    pub verse: u16,
}

impl ChapterVerse {
    pub fn to_html_id(&self) -> String {
        format!("{}.{}", self.chapter, self.verse)
    }
}

/// An inclusive range of verses within one versification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseRange {
    start: Verse,
    end: Verse,
}

impl VerseRange {
    pub fn new(start: Verse, end: Verse) -> Result<VerseRange, AndBibleError> {
        if start.v11n.name != end.v11n.name {
            return Err(AndBibleError::MalformedReference(format!(
                "range spans versifications {} and {}",
                start.v11n.name, end.v11n.name
            )));
        }
        if end.ordinal() < start.ordinal() {
            return Err(AndBibleError::MalformedReference(format!(
                "range end {end} precedes start {start}"
            )));
        }
        Ok(VerseRange { start, end })
    }

    pub fn single(verse: Verse) -> VerseRange {
        VerseRange {
            start: verse.clone(),
            end: verse,
        }
    }

    pub fn start(&self) -> &Verse {
        &self.start
    }

    pub fn end(&self) -> &Verse {
        &self.end
    }

    pub fn versification(&self) -> &Arc<Versification> {
        &self.start.v11n
    }

    pub fn contains(&self, verse: &Verse) -> bool {
        let ord = verse.to_v11n(&self.start.v11n).ordinal();
        ord >= self.start.ordinal() && ord <= self.end.ordinal()
    }

    pub fn osis_ref(&self) -> String {
        if self.start == self.end {
            self.start.osis_ref()
        } else {
            format!("{}-{}", self.start.osis_ref(), self.end.osis_ref())
        }
    }

    pub fn name(&self) -> String {
        let (s, e) = (&self.start, &self.end);
        if s == e {
            s.name()
        } else if s.book == e.book && s.chapter == e.chapter {
            format!("{}-{}", s.name(), e.verse)
        } else if s.book == e.book {
            format!("{}-{}:{}", s.name(), e.chapter, e.verse)
        } else {
            format!("{}-{}", s.name(), e.name())
        }
    }
}

impl Display for VerseRange {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An ordered list of verse ranges, the result of parsing a Bible reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    v11n: Arc<Versification>,
    ranges: Vec<VerseRange>,
}

/// How precise the previous reference was, used to interpret shorthand like `Gen 1:1, 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefLevel {
    Book,
    Chapter,
    Verse,
}

#[derive(Debug, Clone, Copy)]
struct RefContext {
    book: usize,
    chapter: u16,
    level: RefLevel,
}

impl Passage {
    pub fn from_range(range: VerseRange) -> Passage {
        Passage {
            v11n: range.versification().clone(),
            ranges: vec![range],
        }
    }

    pub fn from_verse(verse: Verse) -> Passage {
        Passage::from_range(VerseRange::single(verse))
    }

    /// Parse a reference string in the given versification.
    pub fn parse(v11n: &Arc<Versification>, text: &str) -> Result<Passage, AndBibleError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AndBibleError::MalformedReference(
                "empty reference".to_string(),
            ));
        }
        let mut ranges = Vec::new();
        let mut ctx: Option<RefContext> = None;
        for part in trimmed.split([';', ',']) {
            for piece in split_osis_list(part.trim()) {
                let (range, next_ctx) = parse_range(v11n, piece, ctx)?;
                ranges.push(range);
                ctx = Some(next_ctx);
            }
        }
        if ranges.is_empty() {
            return Err(AndBibleError::MalformedReference(format!(
                "no reference found in '{text}'"
            )));
        }
        Ok(Passage {
            v11n: v11n.clone(),
            ranges,
        })
    }

    pub fn versification(&self) -> &Arc<Versification> {
        &self.v11n
    }

    pub fn count_ranges(&self) -> usize {
        self.ranges.len()
    }

    pub fn ranges(&self) -> &[VerseRange] {
        &self.ranges
    }

    pub fn range_at(&self, idx: usize) -> Option<&VerseRange> {
        self.ranges.get(idx)
    }

    /// The first verse of the passage.
    pub fn first_verse(&self) -> &Verse {
        self.ranges[0].start()
    }

    pub fn osis_ref(&self) -> String {
        self.ranges
            .iter()
            .map(VerseRange::osis_ref)
            .collect::<Vec<String>>()
            .join(" ")
    }

    pub fn name(&self) -> String {
        self.ranges
            .iter()
            .map(VerseRange::name)
            .collect::<Vec<String>>()
            .join("; ")
    }
}

impl Display for Passage {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// `Gen.1.1 Gen.1.3` is a list of two OSIS references, `1 John 3` is one human reference.
fn split_osis_list(part: &str) -> Vec<&str> {
    let tokens = part.split_whitespace().collect::<Vec<&str>>();
    if tokens.len() > 1 && tokens.iter().all(|t| t.contains('.')) {
        tokens
    } else if part.is_empty() {
        Vec::new()
    } else {
        vec![part]
    }
}

fn parse_range(
    v11n: &Arc<Versification>,
    text: &str,
    ctx: Option<RefContext>,
) -> Result<(VerseRange, RefContext), AndBibleError> {
    let (start_txt, end_txt) = match text.split_once('-') {
        Some((s, e)) => (s.trim(), Some(e.trim())),
        None => (text, None),
    };
    let (start, start_ctx) = parse_single(v11n, start_txt, ctx)?;
    let (first, last) = start;
    let Some(end_txt) = end_txt else {
        return Ok((VerseRange::new(first, last)?, start_ctx));
    };
    let ((_, end), end_ctx) = parse_single(v11n, end_txt, Some(start_ctx))?;
    Ok((VerseRange::new(first, end)?, end_ctx))
}

/// Parse one reference into the (first, last) verse it covers.
fn parse_single(
    v11n: &Arc<Versification>,
    text: &str,
    ctx: Option<RefContext>,
) -> Result<((Verse, Verse), RefContext), AndBibleError> {
    let malformed = || AndBibleError::MalformedReference(format!("cannot parse '{text}'"));
    let caps = SINGLE_REF_RE.captures(text).ok_or_else(malformed)?;
    let num = |name: &str| -> Result<Option<u16>, AndBibleError> {
        caps.name(name)
            .map(|m| m.as_str().parse::<u16>().map_err(|_| malformed()))
            .transpose()
    };
    let chapter = num("ch")?;
    let verse = num("v")?;

    let (book, chapter, verse) = match caps.name("book") {
        Some(book_match) => {
            let book = v11n.find_book(book_match.as_str()).ok_or_else(|| {
                AndBibleError::MalformedReference(format!(
                    "unknown book '{}' in {}",
                    book_match.as_str().trim(),
                    v11n.name()
                ))
            })?;
            (book, chapter, verse)
        }
        None => {
            let ctx = ctx.ok_or_else(malformed)?;
            match (chapter, verse) {
                (Some(n), None) if ctx.level == RefLevel::Verse => {
                    (ctx.book, Some(ctx.chapter), Some(n))
                }
                (Some(c), v) => (ctx.book, Some(c), v),
                (None, _) => return Err(malformed()),
            }
        }
    };

    let info = &v11n.books()[book];
    match (chapter, verse) {
        (None, _) => {
            let last_ch = info.chapter_count();
            let first = Verse::new(v11n, book, 1, 1)?;
            let last = Verse::new(v11n, book, last_ch, info.verse_count(last_ch).unwrap_or(0))?;
            Ok((
                (first, last),
                RefContext {
                    book,
                    chapter: last_ch,
                    level: RefLevel::Book,
                },
            ))
        }
        (Some(ch), None) => {
            let count = info.verse_count(ch).ok_or_else(malformed)?;
            let first = Verse::new(v11n, book, ch, 1.min(count))?;
            let last = Verse::new(v11n, book, ch, count)?;
            Ok((
                (first, last),
                RefContext {
                    book,
                    chapter: ch,
                    level: RefLevel::Chapter,
                },
            ))
        }
        (Some(ch), Some(v)) => {
            let verse = Verse::new(v11n, book, ch, v)?;
            Ok((
                (verse.clone(), verse),
                RefContext {
                    book,
                    chapter: ch,
                    level: RefLevel::Verse,
                },
            ))
        }
    }
}
