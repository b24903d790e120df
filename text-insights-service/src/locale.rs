//! Bilingual string catalog with per-key English fallback.
//!
//! The provider owns the active language and the document-level `lang`/`dir`
//! attributes a front end mirrors onto its root element. Fallback is per
//! key: a language table may be sparse and still render, borrowing only the
//! missing strings from English.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Ar,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }

    pub fn direction(&self) -> TextDirection {
        match self {
            Language::Ar => TextDirection::Rtl,
            _ => TextDirection::Ltr,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl TextDirection {
    pub fn attribute(&self) -> &'static str {
        match self {
            TextDirection::Ltr => "ltr",
            TextDirection::Rtl => "rtl",
        }
    }
}

/// Document-level attributes, updated as a side effect of language changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentAttributes {
    pub lang: &'static str,
    pub dir: TextDirection,
}

type StringTable = HashMap<&'static str, &'static str>;

const EN_STRINGS: &[(&str, &str)] = &[
    ("app.title", "Text Insights"),
    ("app.tagline", "AI summaries and keywords for your text and documents"),
    ("input.mode.text", "Text"),
    ("input.mode.file", "File"),
    ("input.placeholder", "Paste your text here…"),
    ("input.choose_file", "Choose a document"),
    ("input.analyze", "Analyze"),
    ("results.loading", "Analyzing…"),
    ("results.summary", "Summary"),
    ("results.keywords", "Keywords"),
    ("results.empty", "No analysis yet"),
    ("language.name", "English"),
    ("error.no_text", "Please enter some text to analyze."),
    ("error.no_file", "Please choose a file first."),
    ("error.file_read", "Could not read or process the selected file."),
    ("error.no_text_extracted", "No text could be extracted from the file."),
    ("error.analysis_failed", "Analysis failed. Please try again."),
];

const AR_STRINGS: &[(&str, &str)] = &[
    ("app.title", "رؤى النص"),
    ("app.tagline", "ملخصات وكلمات مفتاحية لنصوصك ومستنداتك بالذكاء الاصطناعي"),
    ("input.mode.text", "نص"),
    ("input.mode.file", "ملف"),
    ("input.placeholder", "الصق النص هنا…"),
    ("input.choose_file", "اختر مستندًا"),
    ("input.analyze", "حلّل"),
    ("results.loading", "جارٍ التحليل…"),
    ("results.summary", "الملخص"),
    ("results.keywords", "الكلمات المفتاحية"),
    ("results.empty", "لا يوجد تحليل بعد"),
    ("language.name", "العربية"),
    ("error.no_text", "الرجاء إدخال نص للتحليل."),
    ("error.no_file", "الرجاء اختيار ملف أولاً."),
    ("error.file_read", "تعذّرت قراءة الملف المحدد أو معالجته."),
    ("error.no_text_extracted", "لم يتم استخراج أي نص من الملف."),
    ("error.analysis_failed", "فشل التحليل. يرجى المحاولة مرة أخرى."),
];

fn builtin_tables() -> HashMap<Language, StringTable> {
    let mut tables = HashMap::new();
    tables.insert(Language::En, EN_STRINGS.iter().copied().collect());
    tables.insert(Language::Ar, AR_STRINGS.iter().copied().collect());
    tables
}

/// Process-wide localization provider. Initialized once at startup; the
/// active language changes only through [`Localizer::set_language`].
pub struct Localizer {
    tables: HashMap<Language, StringTable>,
    active: RwLock<Language>,
    document: RwLock<DocumentAttributes>,
}

impl Localizer {
    pub fn new() -> Self {
        Self::with_tables(builtin_tables(), Language::En)
    }

    /// Build a provider over custom tables. Test seam.
    pub fn with_tables(tables: HashMap<Language, StringTable>, initial: Language) -> Self {
        Self {
            tables,
            active: RwLock::new(initial),
            document: RwLock::new(DocumentAttributes {
                lang: initial.code(),
                dir: initial.direction(),
            }),
        }
    }

    pub fn language(&self) -> Language {
        *self.active.read().unwrap()
    }

    pub fn document(&self) -> DocumentAttributes {
        *self.document.read().unwrap()
    }

    /// Resolve `key` in the active language, falling back to the English
    /// table per key, then to the key itself.
    pub fn translate(&self, key: &str) -> String {
        let active = self.language();
        self.lookup(active, key)
            .or_else(|| self.lookup(Language::En, key))
            .unwrap_or(key)
            .to_string()
    }

    /// Switch the active language. Observably rewrites the document-level
    /// `lang` and `dir` attributes.
    pub fn set_language(&self, language: Language) {
        *self.active.write().unwrap() = language;
        *self.document.write().unwrap() = DocumentAttributes {
            lang: language.code(),
            dir: language.direction(),
        };
    }

    /// The fully resolved table for the active language: every English key,
    /// overlaid with the active language's entries. This is what a thin
    /// front end renders its chrome from.
    pub fn strings(&self) -> BTreeMap<&'static str, &'static str> {
        let active = self.language();
        let mut resolved: BTreeMap<&'static str, &'static str> = self
            .tables
            .get(&Language::En)
            .map(|table| table.iter().map(|(k, v)| (*k, *v)).collect())
            .unwrap_or_default();
        if let Some(table) = self.tables.get(&active) {
            for (key, value) in table {
                resolved.insert(key, value);
            }
        }
        resolved
    }

    fn lookup(&self, language: Language, key: &str) -> Option<&'static str> {
        self.tables.get(&language).and_then(|table| table.get(key)).copied()
    }
}

impl Default for Localizer {
    fn default() -> Self {
        Self::new()
    }
}
