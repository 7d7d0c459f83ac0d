//! `%(field)s` template formatter.
//!
//! Templates are parsed once at construction; unknown fields are rejected
//! then rather than at format time. `%%` produces a literal percent sign and a
//! lone `%` is kept as written. The conversion character after the closing
//! parenthesis may be `s`, `d` or `r`; all three render the plain value.

use std::borrow::Cow;

use chrono::{DateTime, Local};
use thiserror::Error;

use super::{FormatOptions, RecordFormatter, append_exception};
use crate::log_record::LogRecord;
use crate::request::RequestContext;

/// `strftime`-style pattern used for `%(asctime)s`.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors raised while parsing a template.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown template field '{0}'")]
    UnknownField(String),
    #[error("unterminated placeholder starting at byte {0}")]
    Unterminated(usize),
    #[error("placeholder '{0}' must end with a conversion character (s, d or r)")]
    MissingConversion(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Name,
    LevelName,
    Message,
    Module,
    FileName,
    LineNo,
    FuncName,
    AscTime,
    Thread,
    ThreadName,
    User,
    Method,
    Path,
    Ip,
    Traceback,
}

impl Field {
    fn parse(name: &str) -> Result<Self, TemplateError> {
        Ok(match name {
            "name" => Self::Name,
            "levelname" => Self::LevelName,
            "message" => Self::Message,
            "module" => Self::Module,
            "filename" => Self::FileName,
            "lineno" => Self::LineNo,
            "funcName" => Self::FuncName,
            "asctime" => Self::AscTime,
            "thread" => Self::Thread,
            "threadName" => Self::ThreadName,
            "user" => Self::User,
            "method" => Self::Method,
            "path" => Self::Path,
            "ip" => Self::Ip,
            "traceback" => Self::Traceback,
            other => return Err(TemplateError::UnknownField(other.to_owned())),
        })
    }

    fn needs_context(self) -> bool {
        matches!(
            self,
            Self::User | Self::Method | Self::Path | Self::Ip | Self::Traceback
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// Formatter rendering records through a `%(field)s` template.
#[derive(Clone, Debug)]
pub struct TemplateFormatter {
    segments: Vec<Segment>,
    date_format: String,
    needs_context: bool,
}

impl TemplateFormatter {
    /// Parse `template`.
    pub fn new(template: &str) -> Result<Self, TemplateError> {
        let segments = parse(template)?;
        let needs_context = segments
            .iter()
            .any(|s| matches!(s, Segment::Field(f) if f.needs_context()));
        Ok(Self {
            segments,
            date_format: DEFAULT_DATE_FORMAT.to_owned(),
            needs_context,
        })
    }

    /// Override the pattern used for `%(asctime)s`.
    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = date_format.into();
        self
    }

    fn render(&self, record: &LogRecord) -> String {
        // Records that skipped the context filter still render sensible values.
        let context = if self.needs_context {
            Some(match record.context() {
                Some(ctx) => Cow::Borrowed(ctx),
                None => Cow::Owned(RequestContext::derive(record.request(), record.exception())),
            })
        } else {
            None
        };

        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field) => {
                    self.push_field(&mut out, *field, record, context.as_deref())
                }
            }
        }
        out
    }

    fn push_field(
        &self,
        out: &mut String,
        field: Field,
        record: &LogRecord,
        context: Option<&RequestContext>,
    ) {
        let metadata = record.metadata();
        match field {
            Field::Name => out.push_str(record.logger()),
            Field::LevelName => out.push_str(record.level_str()),
            Field::Message => out.push_str(record.message()),
            Field::Module => out.push_str(&metadata.module_path),
            Field::FileName => out.push_str(&metadata.filename),
            Field::LineNo => out.push_str(&metadata.line_number.to_string()),
            Field::FuncName => out.push_str(&metadata.function),
            Field::AscTime => {
                let local: DateTime<Local> = metadata.timestamp.into();
                out.push_str(&local.format(&self.date_format).to_string());
            }
            Field::Thread => out.push_str(&format!("{:?}", metadata.thread_id)),
            Field::ThreadName => out.push_str(metadata.thread_name.as_deref().unwrap_or("-")),
            Field::User | Field::Method | Field::Path | Field::Ip | Field::Traceback => {
                if let Some(ctx) = context {
                    out.push_str(match field {
                        Field::User => ctx.user.as_str(),
                        Field::Method => ctx.method.as_str(),
                        Field::Path => ctx.path.as_str(),
                        Field::Ip => ctx.ip.as_str(),
                        _ => ctx.traceback.trim_end(),
                    });
                }
            }
        }
    }
}

impl RecordFormatter for TemplateFormatter {
    fn format(&self, record: &LogRecord, options: FormatOptions) -> String {
        append_exception(self.render(record), record, options)
    }
}

fn parse(template: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = template;
    let mut offset = 0;

    while let Some(pos) = rest.find('%') {
        literal.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if let Some(tail) = after.strip_prefix('%') {
            literal.push('%');
            offset += pos + 2;
            rest = tail;
        } else if let Some(inner) = after.strip_prefix('(') {
            let close = inner
                .find(')')
                .ok_or(TemplateError::Unterminated(offset + pos))?;
            let name = &inner[..close];
            let tail = &inner[close + 1..];
            if !matches!(tail.chars().next(), Some('s' | 'd' | 'r')) {
                return Err(TemplateError::MissingConversion(name.to_owned()));
            }
            let field = Field::parse(name)?;
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Field(field));
            // `(` + name + `)` + conversion
            let consumed = pos + 1 + 1 + close + 1 + 1;
            offset += consumed;
            rest = &rest[consumed..];
        } else {
            literal.push('%');
            offset += pos + 1;
            rest = after;
        }
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::ExceptionInfo;
    use crate::filters::{RecordFilter, RequestContextFilter};
    use crate::level::Level;
    use crate::log_record::RecordMetadata;
    use crate::request::RequestInfo;
    use rstest::rstest;
    use std::sync::Arc;

    fn located_record() -> LogRecord {
        let metadata = RecordMetadata {
            module_path: "shop::orders".into(),
            filename: "orders.rs".into(),
            line_number: 88,
            function: "create_order".into(),
            ..Default::default()
        };
        LogRecord::with_metadata("shop", Level::Error, "payment declined", metadata)
    }

    #[test]
    fn renders_record_fields() {
        let formatter = TemplateFormatter::new(
            "[%(levelname)s] %(name)s %(module)s:%(filename)s:%(lineno)d %(funcName)s | %(message)s",
        )
        .expect("valid template");

        assert_eq!(
            formatter.format(&located_record(), FormatOptions::default()),
            "[ERROR] shop shop::orders:orders.rs:88 create_order | payment declined"
        );
    }

    #[test]
    fn renders_context_attached_by_filter() {
        let formatter =
            TemplateFormatter::new("%(user)s %(method)s %(path)s %(ip)s").expect("valid template");
        let request = RequestInfo::new("POST", "/checkout")
            .with_user("ada")
            .with_remote_addr("192.0.2.7");
        let mut record = located_record().with_request(Arc::new(request));
        RequestContextFilter.filter(&mut record);

        assert_eq!(
            formatter.format(&record, FormatOptions::default()),
            "ada POST /checkout 192.0.2.7"
        );
    }

    #[test]
    fn context_fields_fall_back_without_filter() {
        let formatter = TemplateFormatter::new("%(user)s|%(ip)s|%(traceback)s").expect("valid");
        assert_eq!(
            formatter.format(&located_record(), FormatOptions::default()),
            "Unknown|-|No traceback"
        );
    }

    #[test]
    fn traceback_placeholder_and_exception_flag_are_independent() {
        let formatter = TemplateFormatter::new("%(message)s\n%(traceback)s").expect("valid");
        let mut record =
            located_record().with_exception(ExceptionInfo::new("IOError", "disk full"));
        RequestContextFilter.filter(&mut record);

        let without = formatter.format(&record, FormatOptions::WITHOUT_EXCEPTION);
        assert_eq!(without.matches("IOError: disk full").count(), 1);

        let with = formatter.format(&record, FormatOptions::WITH_EXCEPTION);
        assert_eq!(with.matches("IOError: disk full").count(), 2);
    }

    #[test]
    fn percent_escapes_are_literal() {
        let formatter = TemplateFormatter::new("100%% %(message)s 5% off").expect("valid");
        assert_eq!(
            formatter.format(&located_record(), FormatOptions::default()),
            "100% payment declined 5% off"
        );
    }

    #[test]
    fn asctime_uses_date_format() {
        let formatter = TemplateFormatter::new("%(asctime)s")
            .expect("valid")
            .with_date_format("%Y");
        let rendered = formatter.format(&located_record(), FormatOptions::default());
        assert_eq!(rendered.len(), 4);
        assert!(rendered.chars().all(|c| c.is_ascii_digit()));
    }

    #[rstest]
    #[case("%(nope)s", TemplateError::UnknownField("nope".into()))]
    #[case("abc %(message", TemplateError::Unterminated(4))]
    #[case("%(message)x", TemplateError::MissingConversion("message".into()))]
    #[case("%(message)", TemplateError::MissingConversion("message".into()))]
    fn rejects_malformed_templates(#[case] template: &str, #[case] expected: TemplateError) {
        assert_eq!(TemplateFormatter::new(template).err(), Some(expected));
    }
}
