use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(header: impl IntoIterator<Item = S>) -> Self {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push<S: Into<String>>(&mut self, row: impl IntoIterator<Item = S>) {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    /// Plain-text grid with `+---+` borders.
    pub fn render(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.header.iter().cloned());
        for row in &self.rows {
            builder.push_record(row.iter().cloned());
        }
        builder.build().with(Style::ascii()).to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entry {
    Message { level: Level, text: String },
    Table(Table),
}

/// Everything a command produced, in order. Front ends decide how to render it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Output {
    entries: Vec<Entry>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(&mut self, level: Level, text: impl Into<String>) {
        self.entries.push(Entry::Message {
            level,
            text: text.into(),
        });
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.message(Level::Info, text);
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.message(Level::Success, text);
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.message(Level::Warning, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.message(Level::Error, text);
    }

    pub fn table(&mut self, table: Table) {
        self.entries.push(Entry::Table(table));
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn take(&mut self) -> Vec<Entry> {
        std::mem::take(&mut self.entries)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Message texts emitted at `level`.
    pub fn messages(&self, level: Level) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Message { level: l, text } if *l == level => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn tables(&self) -> Vec<&Table> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Table(table) => Some(table),
                _ => None,
            })
            .collect()
    }
}
