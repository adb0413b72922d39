//! A hand-rolled, push-callback JSON scanner (C2), SAX-style rather than a
//! whole-document parse. Bytes are fed in as they arrive off the wire
//! (`feed`); the scanner holds only a small reusable token buffer between
//! calls, never the whole response.
use crate::package::PackageRecord;
use crate::util::{human, CorralResult};

/// The five push events a `JsonSink` receives. Array brackets are consumed
/// internally by the scanner and never surface as events: the only arrays
/// in the registry's wire format are the top-level `results` array, whose
/// elements are objects already reported via `on_start_map`/`on_end_map`.
pub trait JsonSink {
    fn on_integer(&mut self, value: i64);
    fn on_string(&mut self, value: &str);
    fn on_start_map(&mut self);
    fn on_end_map(&mut self);
    fn on_map_key(&mut self, key: &str);
}

#[derive(Clone, Copy)]
enum Container {
    Object { expect_key: bool },
    Array,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Waiting for the next token: a structural character, a string, a
    /// number, `true`/`false`/`null`.
    Neutral,
    InString { escaped: bool },
    InNumber,
    /// Skipping a bareword (`true`, `false`, `null`) we don't forward.
    InBareword,
}

/// Incremental scanner. `feed` may be called any number of times with
/// arbitrary chunk boundaries, including splitting a string or number
/// token in half; `token` carries the partial value across calls.
pub struct JsonScanner {
    stack: Vec<Container>,
    mode: Mode,
    token: String,
    /// true while the string just completed should be treated as an object
    /// key rather than a value (only meaningful right after closing quote).
    pending_key: bool,
}

impl Default for JsonScanner {
    fn default() -> Self {
        JsonScanner {
            stack: Vec::new(),
            mode: Mode::Neutral,
            token: String::new(),
            pending_key: false,
        }
    }
}

impl JsonScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8], sink: &mut dyn JsonSink) -> CorralResult<()> {
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            match self.mode {
                Mode::Neutral => self.step_neutral(b, sink)?,
                Mode::InString { escaped } => self.step_string(b, escaped, sink)?,
                Mode::InNumber => {
                    if b.is_ascii_digit() || b == b'-' || b == b'+' {
                        self.token.push(b as char);
                    } else {
                        self.finish_number(sink)?;
                        // reprocess this byte in Neutral mode
                        continue;
                    }
                }
                Mode::InBareword => {
                    if b.is_ascii_alphabetic() {
                        self.token.push(b as char);
                    } else {
                        self.token.clear();
                        self.mode = Mode::Neutral;
                        continue;
                    }
                }
            }
            i += 1;
        }
        Ok(())
    }

    /// Call once the full body has been fed to flush any trailing numeric
    /// token (numbers have no closing delimiter of their own).
    pub fn finish(&mut self, sink: &mut dyn JsonSink) -> CorralResult<()> {
        if self.mode == Mode::InNumber {
            self.finish_number(sink)?;
        }
        Ok(())
    }

    fn after_value(&mut self) {
        if let Some(Container::Object { expect_key }) = self.stack.last_mut() {
            *expect_key = true;
        }
    }

    fn step_neutral(&mut self, b: u8, sink: &mut dyn JsonSink) -> CorralResult<()> {
        match b {
            b' ' | b'\t' | b'\r' | b'\n' | b':' | b',' => {}
            b'{' => {
                self.stack.push(Container::Object { expect_key: true });
                sink.on_start_map();
            }
            b'}' => {
                self.stack.pop();
                sink.on_end_map();
                self.after_value();
            }
            b'[' => {
                self.stack.push(Container::Array);
            }
            b']' => {
                self.stack.pop();
                self.after_value();
            }
            b'"' => {
                self.pending_key = matches!(self.stack.last(), Some(Container::Object { expect_key }) if *expect_key);
                self.token.clear();
                self.mode = Mode::InString { escaped: false };
            }
            b'-' | b'0'..=b'9' => {
                self.token.clear();
                self.token.push(b as char);
                self.mode = Mode::InNumber;
            }
            b't' | b'f' | b'n' => {
                self.token.clear();
                self.token.push(b as char);
                self.mode = Mode::InBareword;
            }
            _ => {
                return Err(human(format!(
                    "malformed registry response: unexpected byte {:#x}",
                    b
                )))
            }
        }
        Ok(())
    }

    fn step_string(&mut self, b: u8, escaped: bool, sink: &mut dyn JsonSink) -> CorralResult<()> {
        if escaped {
            let unescaped = match b {
                b'n' => '\n',
                b't' => '\t',
                b'r' => '\r',
                b'"' => '"',
                b'\\' => '\\',
                b'/' => '/',
                other => other as char,
            };
            self.token.push(unescaped);
            self.mode = Mode::InString { escaped: false };
            return Ok(());
        }
        match b {
            b'\\' => self.mode = Mode::InString { escaped: true },
            b'"' => {
                if self.pending_key {
                    sink.on_map_key(&self.token);
                    if let Some(Container::Object { expect_key }) = self.stack.last_mut() {
                        *expect_key = false;
                    }
                } else {
                    sink.on_string(&self.token);
                    self.after_value();
                }
                self.token.clear();
                self.mode = Mode::Neutral;
            }
            _ => self.token.push(b as char),
        }
        Ok(())
    }

    fn finish_number(&mut self, sink: &mut dyn JsonSink) -> CorralResult<()> {
        let value: i64 = self
            .token
            .parse()
            .map_err(|_| human(format!("malformed numeric field `{}`", self.token)))?;
        sink.on_integer(value);
        self.token.clear();
        self.mode = Mode::Neutral;
        self.after_value();
        Ok(())
    }
}

/// Turns the scanner's push events into `PackageRecord`s (§3 "Parser
/// state"). Tracks only a depth counter, the current key, and one
/// in-progress record: depth 1 is the outer response document and owns no
/// record; every object entered at depth > 1 is a package.
pub struct PackageListBuilder {
    depth: u32,
    current_key: String,
    scratch: PackageRecord,
    out: Vec<PackageRecord>,
    ignore_out_of_date: bool,
    is_error_doc: bool,
}

impl PackageListBuilder {
    pub fn new(ignore_out_of_date: bool) -> Self {
        PackageListBuilder {
            depth: 0,
            current_key: String::new(),
            scratch: PackageRecord::default(),
            out: Vec::new(),
            ignore_out_of_date,
            is_error_doc: false,
        }
    }

    /// True if the document's top-level `type` key carried an `error*`
    /// value; callers should surface the registry's error message instead
    /// of treating `into_packages()` as a real (possibly empty) result set.
    pub fn is_error_doc(&self) -> bool {
        self.is_error_doc
    }

    pub fn into_packages(self) -> Vec<PackageRecord> {
        self.out
    }

    fn apply_string(&mut self, value: &str) {
        match self.current_key.as_str() {
            "Name" => self.scratch.name = value.to_string(),
            "Version" => self.scratch.version = value.to_string(),
            "Description" => self.scratch.description = value.to_string(),
            "URL" => self.scratch.url = value.to_string(),
            "URLPath" => self.scratch.url_path = value.to_string(),
            "License" => self.scratch.license = value.to_string(),
            "Maintainer" => {
                self.scratch.maintainer = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            "OutOfDate" => self.scratch.out_of_date = value != "0" && !value.is_empty(),
            "type" if self.depth <= 1 => self.is_error_doc = value.starts_with("error"),
            _ => {}
        }
    }

    fn apply_integer(&mut self, value: i64) {
        match self.current_key.as_str() {
            "ID" => self.scratch.id = value,
            "CategoryID" => self.scratch.category_id = value,
            "NumVotes" => self.scratch.num_votes = value,
            "OutOfDate" => self.scratch.out_of_date = value != 0,
            "FirstSubmitted" => self.scratch.first_submitted = value,
            "LastModified" => self.scratch.last_modified = value,
            // "resultcount" and anything else at the document level: not a
            // package field, ignored.
            _ => {}
        }
    }
}

impl JsonSink for PackageListBuilder {
    fn on_integer(&mut self, value: i64) {
        self.apply_integer(value);
    }

    fn on_string(&mut self, value: &str) {
        self.apply_string(value);
    }

    fn on_start_map(&mut self) {
        self.depth += 1;
        if self.depth > 1 {
            self.scratch = PackageRecord::default();
        }
    }

    fn on_end_map(&mut self) {
        if self.depth > 1 {
            let record = std::mem::take(&mut self.scratch);
            if !(self.ignore_out_of_date && record.out_of_date) {
                PackageRecord::insert_sorted(&mut self.out, record);
            }
        }
        self.depth = self.depth.saturating_sub(1);
    }

    fn on_map_key(&mut self, key: &str) {
        self.current_key.clear();
        self.current_key.push_str(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str, ignore_out_of_date: bool) -> PackageListBuilder {
        let mut scanner = JsonScanner::new();
        let mut builder = PackageListBuilder::new(ignore_out_of_date);
        scanner.feed(body.as_bytes(), &mut builder).unwrap();
        scanner.finish(&mut builder).unwrap();
        builder
    }

    #[test]
    fn parses_single_record() {
        let body = r#"{"type":"search","resultcount":1,"results":[
            {"ID":1234,"Name":"foo","Version":"1.0-1","CategoryID":4,
             "Description":"a package","URL":"https://example.com",
             "URLPath":"/packages/fo/foo/foo.tar.gz","License":"MIT",
             "Maintainer":"alice","NumVotes":7,"OutOfDate":0,
             "FirstSubmitted":1000,"LastModified":2000}
        ]}"#;
        let builder = parse(body, false);
        assert!(!builder.is_error_doc());
        let packages = builder.into_packages();
        assert_eq!(packages.len(), 1);
        let pkg = &packages[0];
        assert_eq!(pkg.id, 1234);
        assert_eq!(pkg.name, "foo");
        assert_eq!(pkg.version, "1.0-1");
        assert_eq!(pkg.category_name(), "editors");
        assert_eq!(pkg.maintainer_display(), "alice");
        assert!(!pkg.out_of_date);
    }

    #[test]
    fn orphan_maintainer_and_out_of_date_filter() {
        let body = r#"{"type":"search","results":[
            {"ID":1,"Name":"bbb","Version":"1","Maintainer":"","OutOfDate":5},
            {"ID":2,"Name":"aaa","Version":"1","Maintainer":"bob","OutOfDate":0}
        ]}"#;
        let kept = parse(body, true).into_packages();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "aaa");

        let all = parse(body, false).into_packages();
        assert_eq!(all.len(), 2);
        // sorted by name
        assert_eq!(all[0].name, "aaa");
        assert_eq!(all[1].name, "bbb");
        assert_eq!(all[0].maintainer_display(), "bob");
        assert_eq!(all[1].maintainer_display(), "(orphan)");
    }

    #[test]
    fn detects_error_document() {
        let body = r#"{"type":"error","error":"Query arg too small."}"#;
        let builder = parse(body, false);
        assert!(builder.is_error_doc());
        assert!(builder.into_packages().is_empty());
    }

    #[test]
    fn feed_across_chunk_boundaries() {
        let body = r#"{"type":"search","results":[{"ID":42,"Name":"chu"#;
        let tail = r#"nked","Version":"2"}]}"#;
        let mut scanner = JsonScanner::new();
        let mut builder = PackageListBuilder::new(false);
        scanner.feed(body.as_bytes(), &mut builder).unwrap();
        scanner.feed(tail.as_bytes(), &mut builder).unwrap();
        scanner.finish(&mut builder).unwrap();
        let packages = builder.into_packages();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "chunked");
        assert_eq!(packages[0].id, 42);
    }
}
